//! Message envelope, typed requests and their local handlers.

pub mod types;
pub use types::encode_node;
pub use types::Message;
pub use types::Purpose;

mod request;
pub use request::Request;

pub mod handlers;
