#![warn(missing_docs)]
use std::ops::Index;

use serde::Deserialize;
use serde::Serialize;

use crate::dht::Did;
use crate::dht::Node;

/// Finger table of Chord DHT.
/// Entry `k` targets `self + 2^(k+1)` and caches the node believed to own that target.
/// Every entry starts out pointing at the local node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
    node: Node,
    starts: Vec<Did>,
    finger: Vec<Node>,
}

impl FingerTable {
    /// builder
    pub fn new(node: &Node) -> Self {
        let size = node.did.bits() as u32;
        let starts = (0..size).map(|k| node.did.add_pow2(k + 1)).collect();
        Self {
            node: node.clone(),
            starts,
            finger: vec![node.clone(); size as usize],
        }
    }

    /// All target identifiers, in index order.
    pub fn starts(&self) -> &[Did] {
        &self.starts
    }

    /// setter
    pub fn set(&mut self, index: usize, node: &Node) {
        if index >= self.finger.len() {
            tracing::error!("set finger index out of range, index: {}", index);
            return;
        }
        self.finger[index] = node.clone();
    }

    /// Remove a node from the finger table.
    /// Each entry that pointed at `did` takes the next entry that does not, or the local
    /// node when none is left.
    pub fn remove(&mut self, did: &Did) {
        for index in (0..self.finger.len()).rev() {
            if &self.finger[index].did != did {
                continue;
            }
            let replacement = self.finger[index + 1..]
                .iter()
                .find(|n| &n.did != did)
                .cloned()
                .unwrap_or_else(|| self.node.clone());
            self.finger[index] = replacement;
        }
    }

    /// Offer a node to every entry.
    /// An entry takes `node` when `node` is clockwise closer to the entry's target than the
    /// node it holds.
    pub fn join(&mut self, node: &Node) {
        if node.did == self.node.did {
            return;
        }
        for (start, current) in self.starts.iter().zip(self.finger.iter_mut()) {
            if node.did.bias(start) < current.did.bias(start) {
                *current = node.clone();
            }
        }
    }

    /// closest_preceding_node
    /// Scan from the farthest entry for a node in `(self, did)`.
    pub fn closest_preceding(&self, did: &Did) -> Option<&Node> {
        self.finger
            .iter()
            .rev()
            .find(|n| n.did.in_range(&self.node.did, did, false))
    }

    /// First entry that is not the local node.
    pub fn first_remote(&self) -> Option<&Node> {
        self.finger.iter().find(|n| n.did != self.node.did)
    }

    /// Check finger is contains some node
    pub fn contains(&self, did: &Did) -> bool {
        self.finger.iter().any(|n| &n.did == did)
    }

    /// get finger list
    pub fn list(&self) -> &Vec<Node> {
        &self.finger
    }
}

impl Index<usize> for FingerTable {
    type Output = Node;
    fn index(&self, index: usize) -> &Self::Output {
        &self.finger[index]
    }
}
