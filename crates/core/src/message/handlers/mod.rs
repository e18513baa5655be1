//! Local execution of the requests a node owns.

use async_recursion::async_recursion;

use crate::error::Error;
use crate::error::Result;
use crate::message::encode_node;
use crate::message::Message;
use crate::message::Request;
use crate::swarm::Swarm;

impl Swarm {
    /// Execute `msg` on this node and build the reply.
    #[async_recursion]
    pub(crate) async fn handle_local(&self, msg: &Message) -> Result<Message> {
        let node = self.node();
        match Request::try_from(msg)? {
            Request::Join(sender) => {
                if !self.dht.join(&sender)? {
                    return Err(Error::JoinRejected(node.to_string()));
                }
                tracing::info!("{} accepts join of {}", node, sender);
                Ok(msg.reply_ok(node, vec![]))
            }
            Request::Leave {
                leaving,
                replacement,
            } => {
                let next = self.dht.leave(&leaving, replacement.as_ref())?;
                self.peers.remove(&leaving.did).await;
                if let Some(next) = next {
                    if let Err(e) = self.notify(&next).await {
                        tracing::warn!("notify new successor {} failed: {}", next, e);
                    }
                }
                Ok(msg.reply_ok(node, vec![]))
            }
            Request::HeartBeat => Ok(msg.reply_ok(node, vec![])),
            Request::Notify(sender) => {
                self.dht.notify(&sender)?;
                Ok(msg.reply_ok(node, vec![]))
            }
            Request::FindSuccessor(sender) => {
                let (successor, adopted) = self.dht.find_successor(&sender)?;
                if adopted {
                    if let Err(e) = self.notify(&sender).await {
                        tracing::warn!("notify adopted successor {} failed: {}", sender, e);
                    }
                }
                Ok(msg.reply_ok(node, encode_node(successor.as_ref())?))
            }
            Request::Lookup(key) => {
                if key.is_empty() {
                    return Ok(msg.reply_ok(node, vec![]));
                }
                match self.storage.get(&key).await? {
                    Some(value) => Ok(msg.reply_ok(node, value)),
                    None => Ok(msg.reply_not_found(node)),
                }
            }
            Request::Predecessor => {
                let predecessor = self.dht.predecessor()?;
                Ok(msg.reply_ok(node, encode_node(predecessor.as_ref())?))
            }
            Request::Set { key, value } => {
                self.storage.put(&key, &value).await?;
                tracing::debug!("{} stored {} bytes for {}", node, value.len(), msg.id);
                Ok(msg.reply_ok(node, vec![]))
            }
            Request::Get(key) => match self.storage.get(&key).await? {
                Some(value) => Ok(msg.reply_ok(node, value)),
                None => Ok(msg.reply_not_found(node)),
            },
            Request::Del(key) => {
                self.storage.remove(&key).await?;
                Ok(msg.reply_ok(node, vec![]))
            }
        }
    }
}
