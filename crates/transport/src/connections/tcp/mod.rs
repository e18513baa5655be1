use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::SinkExt;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;
use tokio_util::codec::LengthDelimitedCodec;
use tokio_util::sync::CancellationToken;

use crate::core::callback::SharedCallback;
use crate::core::transport::ConnectionInterface;
use crate::core::transport::SharedConnection;
use crate::core::transport::TransportInterface;
use crate::error::Error;
use crate::error::Result;

/// Largest frame accepted in either direction, 16 MiB.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;
/// Bound on dialing a peer and on waiting for a reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec()
}

/// A request/response channel over one TCP stream.
/// Frames carry a 4-byte big-endian length prefix.
pub struct TcpConnection {
    addr: String,
    framed: Mutex<Framed<TcpStream, LengthDelimitedCodec>>,
    closed: AtomicBool,
    timeout: Duration,
}

/// [TcpTransport] dials [TcpConnection]s and runs the accept loops of its listeners.
pub struct TcpTransport {
    timeout: Duration,
    listeners: DashMap<String, CancellationToken>,
}

impl TcpConnection {
    fn new(addr: &str, stream: TcpStream, timeout: Duration) -> Self {
        Self {
            addr: addr.to_string(),
            framed: Mutex::new(Framed::new(stream, codec())),
            closed: AtomicBool::new(false),
            timeout,
        }
    }

    async fn exchange(
        &self,
        framed: &mut Framed<TcpStream, LengthDelimitedCodec>,
        data: Bytes,
    ) -> Result<Bytes> {
        framed.send(data).await?;
        match framed.next().await {
            Some(Ok(frame)) => Ok(frame.freeze()),
            Some(Err(e)) => Err(e.into()),
            None => Err(Error::ConnectionClosed(self.addr.clone())),
        }
    }
}

#[async_trait]
impl ConnectionInterface for TcpConnection {
    fn remote_addr(&self) -> &str {
        &self.addr
    }

    async fn request(&self, data: Bytes) -> Result<Bytes> {
        // Requests on one stream take turns; the timeout covers only our own round trip.
        let mut framed = self.framed.lock().await;
        if self.is_closed() {
            return Err(Error::ConnectionClosed(self.addr.clone()));
        }

        let result = match tokio::time::timeout(self.timeout, self.exchange(&mut framed, data)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.addr.clone())),
        };

        // A half-written or unanswered frame leaves the stream out of sync.
        if result.is_err() {
            self.closed.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let mut framed = self.framed.lock().await;
        SinkExt::<Bytes>::close(&mut *framed).await?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl TcpTransport {
    /// Create a new [TcpTransport] whose dials and requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            listeners: DashMap::new(),
        }
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl TransportInterface for TcpTransport {
    async fn connect(&self, addr: &str) -> Result<SharedConnection> {
        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(stream) => stream?,
            Err(_) => return Err(Error::Timeout(addr.to_string())),
        };
        stream.set_nodelay(true)?;
        tracing::debug!("TCP connected to {}", addr);
        Ok(Arc::new(TcpConnection::new(addr, stream, self.timeout)))
    }

    async fn listen(&self, addr: &str, callback: SharedCallback) -> Result<String> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?.to_string();

        let token = CancellationToken::new();
        self.listeners.insert(local_addr.clone(), token.clone());
        tokio::spawn(accept_loop(listener, callback, token));

        tracing::info!("TCP listening on {}", local_addr);
        Ok(local_addr)
    }

    async fn close_listener(&self, addr: &str) -> Result<()> {
        let (_, token) = self
            .listeners
            .remove(addr)
            .ok_or_else(|| Error::ListenerNotFound(addr.to_string()))?;
        token.cancel();
        tracing::info!("TCP listener {} closed", addr);
        Ok(())
    }
}

async fn accept_loop(listener: TcpListener, callback: SharedCallback, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let callback = callback.clone();
                    let token = token.child_token();
                    tokio::spawn(serve_connection(stream, peer.to_string(), callback, token));
                }
                Err(e) => tracing::error!("TCP accept failed: {:?}", e),
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote: String,
    callback: SharedCallback,
    token: CancellationToken,
) {
    let mut framed = Framed::new(stream, codec());
    loop {
        let frame = tokio::select! {
            _ = token.cancelled() => break,
            frame = framed.next() => frame,
        };

        let data = match frame {
            Some(Ok(data)) => data.freeze(),
            Some(Err(e)) => {
                tracing::warn!("Read frame from {} failed: {:?}", remote, e);
                break;
            }
            None => break,
        };

        let reply = match callback.on_request(&remote, data).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Callback on_request failed: {e:?}");
                break;
            }
        };

        if let Err(e) = framed.send(reply).await {
            tracing::warn!("Write frame to {} failed: {:?}", remote, e);
            break;
        }
    }
    tracing::debug!("TCP connection from {} finished", remote);
}
