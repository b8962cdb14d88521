//! Boot Session - a single task invocation against the build server
//!
//! [`invoke`] is the whole client: build the request, open one connection,
//! exchange one request/response pair, and classify the result.

pub mod config;
pub mod error;
pub mod session;

pub use config::{Config, DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT};
pub use error::{ErrorKind, Result, SessionError};
pub use session::{invoke, Session, State};
