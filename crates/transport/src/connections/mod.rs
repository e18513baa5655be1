//! Default using `TcpConnection` for native environment.
//! Also provide a `DummyConnection` for testing.

#[cfg(feature = "dummy")]
mod dummy;
mod tcp;

#[cfg(feature = "dummy")]
pub use crate::connections::dummy::DummyConnection;
#[cfg(feature = "dummy")]
pub use crate::connections::dummy::DummyTransport;
pub use crate::connections::tcp::TcpConnection;
pub use crate::connections::tcp::TcpTransport;
pub use crate::connections::tcp::DEFAULT_REQUEST_TIMEOUT;
pub use crate::connections::tcp::MAX_FRAME_LENGTH;
