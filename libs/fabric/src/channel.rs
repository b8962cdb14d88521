use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::codec::Codec;
use crate::error::Result;
use crate::transport::{TcpTransport, Transport};

/// High-level channel for bidirectional communication
///
/// Combines a transport and codec for a single connection
pub struct Channel<C> {
    transport: Box<dyn Transport>,
    codec: C,
}

impl<C: Codec> Channel<C> {
    /// Create a channel from an existing transport
    pub fn from_transport(transport: impl Transport + 'static, codec: C) -> Self {
        Self {
            transport: Box::new(transport),
            codec,
        }
    }

    /// Open a TCP channel to a `host:port` address
    pub async fn tcp(address: impl Into<String>, codec: C) -> Result<Self> {
        let transport = TcpTransport::connect(address).await?;
        Ok(Self::from_transport(transport, codec))
    }

    /// Send a message over the channel
    ///
    /// The message is fully encoded before anything is written, so an encode
    /// failure never leaves a partial message on the wire.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let bytes = self.codec.encode(message)?;
        trace!(bytes = bytes.len(), "encoded message");
        self.transport.send(&bytes).await
    }

    /// Receive a message from the channel
    pub async fn receive<T: for<'de> Deserialize<'de>>(&mut self) -> Result<T> {
        let bytes = self.transport.receive().await?;
        self.codec.decode(&bytes)
    }

    /// Close the channel
    pub async fn close(mut self) -> Result<()> {
        self.transport.close().await
    }
}
