//! Boot Fabric - wire codec and transport layer
//!
//! Provides the bencode codec used by the build server, a TCP transport that
//! frames one bencode value per message, and a [`Channel`] pairing the two.
//!
//! # Example
//!
//! ```no_run
//! use boot_fabric::{Channel, codec::BencodeCodec, request::request_tcp};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Eval { op: String, code: String }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Reply { #[serde(default)] out: String }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // One-off request
//! let req = Eval { op: "eval".to_string(), code: "(+ 1 2)".to_string() };
//! let resp: Reply = request_tcp("127.0.0.1:53788", &req, BencodeCodec).await?;
//!
//! // Or hold the channel yourself
//! let mut channel = Channel::tcp("127.0.0.1:53788", BencodeCodec).await?;
//! channel.send(&req).await?;
//! let resp: Reply = channel.receive().await?;
//! channel.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod request;
pub mod transport;

// Re-exports for convenience
pub use channel::Channel;
pub use error::{Error, Phase, Result};
