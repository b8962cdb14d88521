use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, trace};

use crate::error::{Error, Phase, Result};
use crate::transport::frame::{read_frame, MAX_FRAME_LEN};
use crate::transport::Transport;

/// TCP transport carrying one bencode value per message
///
/// Bencode values delimit themselves, so no length prefix is added on send
/// and a receive reads exactly one value off the stream.
pub struct TcpTransport {
    stream: BufReader<TcpStream>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    max_frame_len: usize,
}

impl TcpTransport {
    /// Connect to a `host:port` address with no timeouts
    pub async fn connect(address: impl Into<String>) -> Result<Self> {
        Self::builder().address(address).connect().await
    }

    /// Connect with a connect timeout
    pub async fn connect_timeout(address: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::builder()
            .address(address)
            .connect_timeout(timeout)
            .connect()
            .await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream: BufReader::new(stream),
            send_timeout: None,
            receive_timeout: None,
            max_frame_len: MAX_FRAME_LEN,
        }
    }

    /// Get the remote address of this connection
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.stream.get_ref().peer_addr().map_err(Into::into)
    }

    /// Get the local address of this connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.get_ref().local_addr().map_err(Into::into)
    }
}

/// Run `op` under an optional deadline
async fn with_deadline<T>(
    timeout: Option<Duration>,
    phase: Phase,
    op: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, op)
            .await
            .map_err(|_| Error::Timeout(phase))?,
        None => op.await,
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        let send_op = async move {
            stream.write_all(bytes).await?;
            stream.flush().await?;
            Ok::<(), Error>(())
        };

        with_deadline(self.send_timeout, Phase::Send, send_op).await?;
        trace!(bytes = bytes.len(), "sent message");
        Ok(())
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        let receive_op = read_frame(&mut self.stream, self.max_frame_len);
        let frame = with_deadline(self.receive_timeout, Phase::Receive, receive_op).await?;
        trace!(bytes = frame.len(), "received message");
        Ok(frame)
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((TcpTransport::from_stream(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }
}

#[async_trait::async_trait]
impl crate::transport::TransportListener for TcpTransportListener {
    type Transport = TcpTransport;

    async fn accept(&self) -> Result<Self::Transport> {
        let (stream, _) = self.listener.accept().await?;
        Ok(TcpTransport::from_stream(stream))
    }
}

/// Builder for configuring TCP transport
#[derive(Default)]
pub struct TcpTransportBuilder {
    address: Option<String>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    max_frame_len: Option<usize>,
}

impl TcpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `host:port` address to connect to
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the receive timeout
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Cap the size of a single received message
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = Some(len);
        self
    }

    /// Connect with the configured settings
    ///
    /// Resolution and connection failures are reported as
    /// [`Error::Connect`] with the address that was dialed.
    pub async fn connect(self) -> Result<TcpTransport> {
        let address = self
            .address
            .ok_or_else(|| Error::Custom("Address not set".to_string()))?;

        debug!(%address, "connecting");
        let connect_op = async {
            TcpStream::connect(address.as_str())
                .await
                .map_err(|source| Error::Connect {
                    address: address.clone(),
                    source,
                })
        };
        let stream = with_deadline(self.connect_timeout, Phase::Connect, connect_op).await?;

        Ok(TcpTransport {
            stream: BufReader::new(stream),
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
            max_frame_len: self.max_frame_len.unwrap_or(MAX_FRAME_LEN),
        })
    }
}
