pub mod config;
pub mod decode;
pub mod error;
pub mod frame;
pub mod handler;
pub mod listener;
pub mod validate;

pub use error::IngestError;
pub use handler::{ConnectionHandler, ConnectionState};
pub use listener::Listener;
