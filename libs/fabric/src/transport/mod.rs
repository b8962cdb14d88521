use crate::error::Result;

pub mod frame;
pub mod tcp;

pub use self::tcp::{TcpTransport, TcpTransportBuilder, TcpTransportListener};

/// Transport trait for sending and receiving raw bytes
///
/// Each transport instance represents a single connection. A `receive`
/// yields exactly one complete message.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send bytes over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive bytes from the transport
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;
}

/// Listener side of a transport, used to accept peer connections
#[async_trait::async_trait]
pub trait TransportListener: Send + Sync {
    type Transport: Transport;

    /// Wait for the next incoming connection
    async fn accept(&self) -> Result<Self::Transport>;
}
