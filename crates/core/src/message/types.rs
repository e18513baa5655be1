#![warn(missing_docs)]
//! The routing envelope exchanged between ring nodes.
//! One shape carries every operation; [Purpose] tells them apart. Requests travel with a
//! request purpose and come back with one of the status purposes.

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::dht::Did;
use crate::dht::Node;
use crate::error::Error;
use crate::error::Result;
use crate::hasher::Hasher;

/// Purpose code of a [Message].
#[derive(Debug, Deserialize, Serialize, Copy, Clone, PartialEq, Eq)]
pub enum Purpose {
    /// Ask the owner of the sender's did to accept it as predecessor.
    NodeJoin,
    /// The sender leaves the ring; body is its neighbour on the other side.
    NodeLeave,
    /// Liveness probe.
    HeartBeat,
    /// The sender believes it is the receiver's predecessor.
    NodeNotify,
    /// Find the owner of an identifier.
    NodeAnn,
    /// Store the body under the key.
    KeySet,
    /// Read the value of the key.
    KeyGet,
    /// Delete the key.
    KeyDel,
    /// Ask the receiver for its successor.
    SuccReq,
    /// Ask the receiver for its predecessor.
    PredReq,
    /// Reply: failed, see `errors`.
    StatusError,
    /// Reply: done.
    StatusOk,
    /// Reply: the key has no value.
    StatusNotFound,
}

impl Purpose {
    /// Whether this purpose only appears on replies.
    pub fn is_status(&self) -> bool {
        matches!(
            self,
            Purpose::StatusError | Purpose::StatusOk | Purpose::StatusNotFound
        )
    }
}

/// Routing envelope.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier the message is routed to.
    pub id: Did,
    /// Raw key bytes, empty when the message is not about a key.
    pub key: Vec<u8>,
    /// What the message asks for, or the outcome on a reply.
    pub purpose: Purpose,
    /// Node that created the message, or answered it on a reply.
    pub sender: Node,
    /// Node the message is addressed to, when it is meant for one node rather than the owner
    /// of `id`.
    pub target: Option<Node>,
    /// Number of forwards so far.
    pub hops: u16,
    /// Payload.
    pub body: Vec<u8>,
    /// Error strings collected on the way back.
    pub errors: Vec<String>,
}

impl Message {
    /// Create a message from `sender`.
    /// When `id` is not given it is the hash of `key`.
    pub fn new(
        purpose: Purpose,
        id: Option<Did>,
        key: &[u8],
        body: Vec<u8>,
        sender: &Node,
        hasher: &dyn Hasher,
    ) -> Self {
        let id = id.unwrap_or_else(|| hasher.hash(key));
        Self {
            id,
            key: key.to_vec(),
            purpose,
            sender: sender.clone(),
            target: None,
            hops: 0,
            body,
            errors: vec![],
        }
    }

    /// Create a message for `target` itself. It is routed to `target.did`.
    pub fn direct(purpose: Purpose, target: &Node, body: Vec<u8>, sender: &Node) -> Self {
        Self {
            id: target.did.clone(),
            key: vec![],
            purpose,
            sender: sender.clone(),
            target: Some(target.clone()),
            hops: 0,
            body,
            errors: vec![],
        }
    }

    fn reply(&self, purpose: Purpose, node: &Node, body: Vec<u8>) -> Self {
        Self {
            id: self.id.clone(),
            key: self.key.clone(),
            purpose,
            sender: node.clone(),
            target: Some(self.sender.clone()),
            hops: self.hops,
            body,
            errors: self.errors.clone(),
        }
    }

    /// Successful reply answered by `node`.
    pub fn reply_ok(&self, node: &Node, body: Vec<u8>) -> Self {
        self.reply(Purpose::StatusOk, node, body)
    }

    /// Reply telling the key has no value.
    pub fn reply_not_found(&self, node: &Node) -> Self {
        self.reply(Purpose::StatusNotFound, node, vec![])
    }

    /// Failed reply; `reason` is appended to the errors already collected.
    pub fn reply_error(&self, node: &Node, reason: &str) -> Self {
        let mut reply = self.reply(Purpose::StatusError, node, vec![]);
        reply.errors.push(reason.to_string());
        reply
    }

    /// Turn a `StatusError` reply into [Error::Remote] and a message that is no reply at all
    /// into [Error::UnexpectedReply].
    pub fn into_result(self) -> Result<Message> {
        match self.purpose {
            Purpose::StatusError => Err(Error::Remote(self.errors.join("; "))),
            purpose if !purpose.is_status() => Err(Error::UnexpectedReply(purpose)),
            _ => Ok(self),
        }
    }

    /// Body as a JSON encoded optional [Node]; an empty body is `None`.
    pub fn body_node(&self) -> Result<Option<Node>> {
        if self.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&self.body).map_err(Error::Deserialize)
    }

    /// Deserializes a `Message` from the given binary data.
    pub fn from_bincode(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(Error::BincodeDeserialize)
    }

    /// Serializes the `Message` into binary data.
    pub fn to_bincode(&self) -> Result<Bytes> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(Error::BincodeSerialize)
    }
}

/// JSON body carrying an optional [Node].
pub fn encode_node(node: Option<&Node>) -> Result<Vec<u8>> {
    match node {
        None => Ok(vec![]),
        Some(n) => serde_json::to_vec(n).map_err(Error::Serialize),
    }
}
