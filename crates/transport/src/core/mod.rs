//! The main concepts of this mod are:
//!
//! The [ConnectionInterface](transport::ConnectionInterface) trait defines how to
//! send one request frame to a remote peer and wait for its reply frame.
//! See the [transport] module.
//!
//! The [TransportInterface](transport::TransportInterface) trait should be
//! implemented for each Transport of Connection implementation. It dials peers
//! and serves inbound requests. See the [transport] module.
//!
//! The [RequestCallback](callback::RequestCallback) trait is used to let user answer
//! the requests arriving on a listener. See the [callback] module.

pub mod callback;
pub mod transport;
