#![warn(missing_docs)]
//! Implementation of the ring's DHT
//! which is based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, the number of nodes that must be contacted to find a successor in an N-node network is O(log N).

mod chord;
pub mod did;
/// Finger table for the ring
pub mod finger;
mod node;
mod stabilization;

pub use chord::PeerRing;
pub use chord::PeerRingAction;
pub use chord::RingState;
pub use chord::TopoInfo;
pub use did::BiasId;
pub use did::Did;
pub use did::SortRing;
pub use finger::FingerTable;
pub use node::Node;
pub use stabilization::Stabilizer;
