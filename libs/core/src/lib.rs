//! Boot Core - message types for the boot build server
//!
//! Builds the `eval` request for a list of task arguments and interprets
//! the server's reply. Nothing here performs I/O.

pub mod request;
pub mod response;

pub use request::{build_code, build_request, quote, Request};
pub use response::{interpret, Exception, Outcome, Output, Response};
