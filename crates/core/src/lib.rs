//! chordkv: a key value store on a Chord ring.
//! --------------
//! - [Did](crate::dht::Did) is a position on a ring of `2^bits` identifiers.
//! - [PeerRing](crate::dht::PeerRing) holds successor, predecessor and finger table and decides where a message goes next.
//! - [Swarm](crate::swarm::Swarm) is the ring node. It serves requests from the transport and forwards what it does not own.
//! - [Stabilizer](crate::dht::Stabilizer) repairs the ring pointers on a timer.
//!
//! # Routing
//!
//! Every message carries a target [Did](crate::dht::Did). A node answers locally when the target
//! falls in `(predecessor, self]`, hands it to its successor when it falls in `(self, successor]`,
//! and otherwise forwards it to the closest preceding finger. Each forward bumps the hop counter;
//! once it passes the identifier width the message is answered with an error.
//!
//! # Joining
//!
//! 1. The new node sends `NodeJoin` to any known node. The join is routed to the owner of the new
//!    node's identifier, which answers and becomes its successor.
//! 2. The new node notifies its successor, then asks it for its successor so that a node which was
//!    alone links back.
//! 3. Finger entries are seeded with `NodeAnn` lookups through the bootstrap node.
//!
//! Everything else converges through stabilization.
#![warn(missing_docs)]

pub mod client;
pub mod consts;
pub mod dht;
pub mod error;
pub mod hasher;
pub mod message;
pub mod storage;
pub mod swarm;
#[cfg(test)]
mod tests;

pub use chordkv_transport as transport;
