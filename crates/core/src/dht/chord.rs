//! Chord algorithm implement.
#![warn(missing_docs)]
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use serde::Deserialize;
use serde::Serialize;

use super::FingerTable;
use crate::dht::Did;
use crate::dht::Node;
use crate::error::Result;

/// PeerRing is used to help a node interact with other nodes.
/// All nodes in the network form a clockwise ring in the order of Did.
/// This struct takes its name from that.
///
/// Successor, predecessor and finger table live behind one lock, so every update leaves
/// them consistent with each other. The lock is never held across an await point.
pub struct PeerRing {
    /// The local node.
    pub node: Node,
    state: RwLock<RingState>,
}

/// Mutable part of the ring, guarded as a unit.
#[derive(Clone, Debug)]
pub struct RingState {
    /// The next node on the ring.
    pub successor: Option<Node>,
    /// The previous node on the ring.
    pub predecessor: Option<Node>,
    /// [FingerTable] help node to find the owner of an identifier quickly.
    pub finger: FingerTable,
}

/// `PeerRing` use this to describe where a message should go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerRingAction {
    /// The local node owns the identifier.
    Local,
    /// Hand the message to this node, which is closer to the identifier.
    Forward(Node),
    /// Hand the message to this node, which owns the identifier as far as the local node knows.
    Deliver(Node),
}

/// Information about successor and predecessor
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone)]
pub struct TopoInfo {
    /// The local node.
    pub node: Node,
    /// Successor
    pub successor: Option<Node>,
    /// Predecessor
    pub predecessor: Option<Node>,
    /// Finger entries, in index order.
    pub finger: Vec<Node>,
}

impl PeerRingAction {
    /// Returns `true` if the action is a [PeerRingAction::Local] value.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl PeerRing {
    /// Create a ring that only knows the local node.
    pub fn new(node: Node) -> Self {
        let finger = FingerTable::new(&node);
        Self {
            node,
            state: RwLock::new(RingState {
                successor: None,
                predecessor: None,
                finger,
            }),
        }
    }

    /// The did of the local node.
    pub fn did(&self) -> &Did {
        &self.node.did
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RingState>> {
        Ok(self.state.read()?)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RingState>> {
        Ok(self.state.write()?)
    }

    fn is_local(&self, node: &Node) -> bool {
        node.did == self.node.did
    }

    /// Copy of the current ring state.
    pub fn state(&self) -> Result<RingState> {
        Ok(self.read()?.clone())
    }

    /// Current successor.
    pub fn successor(&self) -> Result<Option<Node>> {
        Ok(self.read()?.successor.clone())
    }

    /// Current predecessor.
    pub fn predecessor(&self) -> Result<Option<Node>> {
        Ok(self.read()?.predecessor.clone())
    }

    /// Replace the successor. The local node is never stored as its own successor.
    pub fn set_successor(&self, node: Option<Node>) -> Result<()> {
        let node = node.filter(|n| !self.is_local(n));
        let mut state = self.write()?;
        if let Some(n) = &node {
            state.finger.join(n);
        }
        state.successor = node;
        Ok(())
    }

    /// Replace the predecessor. The local node is never stored as its own predecessor.
    pub fn set_predecessor(&self, node: Option<Node>) -> Result<()> {
        let node = node.filter(|n| !self.is_local(n));
        let mut state = self.write()?;
        if let Some(n) = &node {
            state.finger.join(n);
        }
        state.predecessor = node;
        Ok(())
    }

    /// Overwrite finger entry `index`.
    pub fn set_finger(&self, index: usize, node: &Node) -> Result<()> {
        self.write()?.finger.set(index, node);
        Ok(())
    }

    /// Target identifiers of the finger table.
    pub fn finger_starts(&self) -> Result<Vec<Did>> {
        Ok(self.read()?.finger.starts().to_vec())
    }

    /// Decide who handles a message for `id`.
    ///
    /// While only one neighbour is known it stands for both successor and predecessor.
    /// The local node owns `(predecessor, self]`, the successor owns `(self, successor]`, and
    /// everything else goes to the closest finger preceding `id`. Each forward strictly
    /// shortens the clockwise distance to `id`; a delivery is settled by [PeerRing::locate_addressed]
    /// on the receiving side.
    pub fn locate(&self, id: &Did) -> Result<PeerRingAction> {
        if id == self.did() {
            return Ok(PeerRingAction::Local);
        }
        let state = self.read()?;
        let (pred, succ) = match (&state.predecessor, &state.successor) {
            (None, None) => return Ok(PeerRingAction::Local),
            (Some(p), None) => (p, p),
            (None, Some(s)) => (s, s),
            (Some(p), Some(s)) => (p, s),
        };

        if id.in_range(&pred.did, self.did(), true) {
            return Ok(PeerRingAction::Local);
        }
        if id.in_range(self.did(), &succ.did, true) {
            return Ok(PeerRingAction::Deliver(succ.clone()));
        }
        let next = state.finger.closest_preceding(id).unwrap_or(succ);
        Ok(PeerRingAction::Forward(next.clone()))
    }

    /// Decide who handles a message for `id` that was delivered to the local node.
    ///
    /// A node that joined recently may sit between the local node and its predecessor, and the
    /// sender could not know about it yet. Such a message walks back over predecessors, each
    /// hop strictly shortening the counterclockwise distance to `id`, so it never bounces
    /// between a node and its successor.
    pub fn locate_addressed(&self, id: &Did) -> Result<PeerRingAction> {
        if id == self.did() {
            return Ok(PeerRingAction::Local);
        }
        let state = self.read()?;
        match &state.predecessor {
            None => Ok(PeerRingAction::Local),
            Some(pred) if id.in_range(&pred.did, self.did(), true) => Ok(PeerRingAction::Local),
            Some(pred) => Ok(PeerRingAction::Deliver(pred.clone())),
        }
    }

    /// A node asks to join in front of the local node.
    /// Accepted when the sender is a legitimate predecessor candidate.
    pub fn join(&self, sender: &Node) -> Result<bool> {
        if self.is_local(sender) {
            return Ok(false);
        }
        let state = self.read()?;
        Ok(match &state.predecessor {
            None => true,
            Some(pred) => pred == sender || sender.did.in_range(&pred.did, self.did(), false),
        })
    }

    /// Adopt `sender` as predecessor when it sits between the current predecessor and self.
    /// Returns whether the predecessor changed.
    pub fn notify(&self, sender: &Node) -> Result<bool> {
        if self.is_local(sender) {
            return Ok(false);
        }
        let mut state = self.write()?;
        let adopt = match &state.predecessor {
            None => true,
            Some(pred) => {
                pred != sender && sender.did.in_range(&pred.did, self.did(), false)
            }
        };
        if adopt {
            tracing::info!("{} adopts predecessor {}", self.node, sender);
            state.predecessor = Some(sender.clone());
            state.finger.join(sender);
        }
        Ok(adopt)
    }

    /// A node asks for our successor. A node without successor adopts the asker.
    /// Returns the successor after the call and whether it was just adopted.
    pub fn find_successor(&self, sender: &Node) -> Result<(Option<Node>, bool)> {
        let mut state = self.write()?;
        if state.successor.is_none() && !self.is_local(sender) {
            tracing::info!("{} adopts successor {}", self.node, sender);
            state.successor = Some(sender.clone());
            state.finger.join(sender);
            return Ok((state.successor.clone(), true));
        }
        Ok((state.successor.clone(), false))
    }

    /// Adopt `candidate` as successor when it sits between self and the current successor.
    /// Returns whether the successor changed.
    pub fn update_successor(&self, candidate: &Node) -> Result<bool> {
        if self.is_local(candidate) {
            return Ok(false);
        }
        let mut state = self.write()?;
        let adopt = match &state.successor {
            None => true,
            Some(succ) => candidate.did.in_range(self.did(), &succ.did, false),
        };
        if adopt {
            tracing::info!("{} adopts successor {}", self.node, candidate);
            state.successor = Some(candidate.clone());
            state.finger.join(candidate);
        }
        Ok(adopt)
    }

    /// `sender` leaves the ring and names `replacement` as its neighbour on the other side.
    /// A successor that leaves is replaced and the new successor is returned so the caller can
    /// notify it. A predecessor that leaves is cleared; the next notify repairs it.
    pub fn leave(&self, sender: &Node, replacement: Option<&Node>) -> Result<Option<Node>> {
        let mut state = self.write()?;
        state.finger.remove(&sender.did);
        if state.predecessor.as_ref() == Some(sender) {
            tracing::info!("{} loses predecessor {}", self.node, sender);
            state.predecessor = None;
        }
        if state.successor.as_ref() != Some(sender) {
            return Ok(None);
        }
        let next = replacement
            .filter(|n| !self.is_local(n) && n.did != sender.did)
            .cloned();
        tracing::info!("{} replaces leaving successor {} with {:?}", self.node, sender, next);
        if let Some(n) = &next {
            state.finger.join(n);
        }
        state.successor = next.clone();
        Ok(next)
    }

    /// Forget a node that stopped answering.
    /// A lost successor is replaced by the first remote finger entry.
    pub fn remove(&self, did: &Did) -> Result<()> {
        let mut state = self.write()?;
        state.finger.remove(did);
        if state.predecessor.as_ref().map(|n| &n.did) == Some(did) {
            state.predecessor = None;
        }
        if state.successor.as_ref().map(|n| &n.did) == Some(did) {
            let next = state.finger.first_remote().cloned();
            tracing::info!("{} lost successor {}, next is {:?}", self.node, did, next);
            state.successor = next;
        }
        Ok(())
    }

    /// Snapshot for diagnostics.
    pub fn topo_info(&self) -> Result<TopoInfo> {
        let state = self.read()?;
        Ok(TopoInfo {
            node: self.node.clone(),
            successor: state.successor.clone(),
            predecessor: state.predecessor.clone(),
            finger: state.finger.list().clone(),
        })
    }
}
