use boot_core::{build_request, interpret, Output, Request, Response};
use boot_fabric::codec::{BencodeCodec, Codec};
use boot_fabric::transport::TcpTransport;
use boot_fabric::Channel;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, SessionError};

/// Progress of a single invocation
///
/// Moves strictly forward; any failure lands in `Failed` and the session
/// cannot be used again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconnected,
    Connected,
    Sent,
    Received,
    Done,
    Failed,
}

/// One connection, one request, one response
pub struct Session<C = BencodeCodec> {
    channel: Option<Channel<C>>,
    state: State,
}

impl Session<BencodeCodec> {
    /// Dial the configured address
    ///
    /// Failures are never retried.
    pub async fn open(config: &Config) -> Result<Self> {
        debug!(address = %config.address, state = ?State::Unconnected, "opening session");

        let mut builder = TcpTransport::builder().address(config.address.as_str());
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.send_timeout {
            builder = builder.send_timeout(timeout);
        }
        if let Some(timeout) = config.receive_timeout {
            builder = builder.receive_timeout(timeout);
        }

        let transport = builder.connect().await.map_err(SessionError::from_connect)?;
        Ok(Self::from_channel(Channel::from_transport(
            transport,
            BencodeCodec,
        )))
    }
}

impl<C: Codec> Session<C> {
    /// Wrap an already connected channel
    pub fn from_channel(channel: Channel<C>) -> Self {
        let mut session = Self {
            channel: Some(channel),
            state: State::Unconnected,
        };
        session.transition(State::Connected);
        session
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Write `request`, then read exactly one response
    pub async fn exchange(&mut self, request: &Request) -> Result<Response> {
        if self.state != State::Connected {
            return Err(SessionError::InvalidState(self.state, "exchange"));
        }

        let sent = self.channel_mut()?.send(request).await;
        if let Err(e) = sent {
            return Err(self.fail(SessionError::from_send(e)));
        }
        self.transition(State::Sent);

        let received = self.channel_mut()?.receive::<Response>().await;
        let response = match received {
            Ok(response) => response,
            Err(e) => return Err(self.fail(SessionError::from_receive(e))),
        };
        self.transition(State::Received);

        Ok(response)
    }

    /// Shut the connection down after a completed exchange
    ///
    /// The response is already in hand, so a failed shutdown is only logged.
    pub async fn close(mut self) -> Result<()> {
        if self.state != State::Received {
            return Err(SessionError::InvalidState(self.state, "close"));
        }

        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                warn!(error = %e, "failed to shut down connection");
            }
        }
        self.transition(State::Done);
        Ok(())
    }

    fn channel_mut(&mut self) -> Result<&mut Channel<C>> {
        let state = self.state;
        self.channel
            .as_mut()
            .ok_or(SessionError::InvalidState(state, "use the connection"))
    }

    fn transition(&mut self, next: State) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Drop the connection and record the failure
    fn fail(&mut self, err: SessionError) -> SessionError {
        debug!(error = %err, "session failed");
        self.channel = None;
        self.transition(State::Failed);
        err
    }
}

/// Run `args` as boot tasks on the configured server
///
/// Opens a connection, sends one `eval` request, reads one reply, and turns
/// it into the task's output or a [`SessionError`]. The connection is closed
/// on every path.
pub async fn invoke<S: AsRef<str>>(config: &Config, args: &[S]) -> Result<Output> {
    let request = build_request(args);
    debug!(code = %request.code, "built request");

    let mut session = Session::open(config).await?;
    let response = session.exchange(&request).await?;
    session.close().await?;

    debug!(
        status = ?response.status_text(),
        session = %String::from_utf8_lossy(&response.session),
        "received response"
    );
    if !response.root_ex.is_empty() {
        debug!(root_ex = %String::from_utf8_lossy(&response.root_ex), "server reported root cause");
    }

    interpret(response).into_result().map_err(SessionError::from)
}
