//! Descriptor of a ring participant.

use serde::Deserialize;
use serde::Serialize;

use crate::dht::Did;

/// A ring participant: its position and the address its transport listens on.
/// Copies travel by value inside messages.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Position on the ring.
    pub did: Did,
    /// Host of the listener.
    pub host: String,
    /// Port of the listener.
    pub port: u16,
}

impl Node {
    /// Create a node descriptor.
    pub fn new(did: Did, host: &str, port: u16) -> Self {
        Self {
            did,
            host: host.to_string(),
            port,
        }
    }

    /// `host:port` as dialed by the transport.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.did, self.host, self.port)
    }
}
