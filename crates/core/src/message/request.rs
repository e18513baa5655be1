//! Typed view of an inbound [Message].

use crate::dht::Node;
use crate::error::Error;
use crate::error::Result;
use crate::message::Message;
use crate::message::Purpose;

/// One variant per ring operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `NodeJoin`: the sender asks to become our predecessor.
    Join(Node),
    /// `NodeLeave`: the sender leaves and names its neighbour on the other side.
    Leave {
        /// Node leaving the ring.
        leaving: Node,
        /// Node taking its place, if it had one.
        replacement: Option<Node>,
    },
    /// `HeartBeat`.
    HeartBeat,
    /// `NodeNotify`: the sender may be our predecessor.
    Notify(Node),
    /// `SuccReq`: the sender asks for our successor.
    FindSuccessor(Node),
    /// `NodeAnn`: report ownership of the identifier, with the key's value if present.
    Lookup(Vec<u8>),
    /// `PredReq`: the sender asks for our predecessor.
    Predecessor,
    /// `KeySet`.
    Set {
        /// Key.
        key: Vec<u8>,
        /// Value.
        value: Vec<u8>,
    },
    /// `KeyGet`.
    Get(Vec<u8>),
    /// `KeyDel`.
    Del(Vec<u8>),
}

impl TryFrom<&Message> for Request {
    type Error = Error;

    fn try_from(msg: &Message) -> Result<Self> {
        let sender = msg.sender.clone();
        Ok(match msg.purpose {
            Purpose::NodeJoin => Request::Join(sender),
            Purpose::NodeLeave => Request::Leave {
                leaving: sender,
                replacement: msg.body_node()?,
            },
            Purpose::HeartBeat => Request::HeartBeat,
            Purpose::NodeNotify => Request::Notify(sender),
            Purpose::SuccReq => Request::FindSuccessor(sender),
            Purpose::NodeAnn => Request::Lookup(msg.key.clone()),
            Purpose::PredReq => Request::Predecessor,
            Purpose::KeySet => Request::Set {
                key: msg.key.clone(),
                value: msg.body.clone(),
            },
            Purpose::KeyGet => Request::Get(msg.key.clone()),
            Purpose::KeyDel => Request::Del(msg.key.clone()),
            status => return Err(Error::NotARequest(status)),
        })
    }
}
