use boot_core::Exception;
use boot_fabric::Phase;
use thiserror::Error;

use crate::session::State;

/// Broad class of a failed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server could not be reached
    Connection,
    /// Request could not be written
    Encode,
    /// Reply was malformed, truncated, or never arrived
    Decode,
    Timeout,
    /// Server ran the task and it raised
    Exception,
    Config,
    /// Session used out of order
    State,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("could not reach server at {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send request: {0}")]
    Encode(#[source] boot_fabric::Error),

    #[error("failed to read response: {0}")]
    Decode(#[source] boot_fabric::Error),

    #[error("timed out during {0}")]
    Timeout(Phase),

    #[error("server raised: {0}")]
    Exception(#[from] Exception),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("session is {0:?}, cannot {1}")]
    InvalidState(State, &'static str),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Connection { .. } => ErrorKind::Connection,
            SessionError::Encode(_) => ErrorKind::Encode,
            SessionError::Decode(_) => ErrorKind::Decode,
            SessionError::Timeout(_) => ErrorKind::Timeout,
            SessionError::Exception(_) => ErrorKind::Exception,
            SessionError::Config(_) => ErrorKind::Config,
            SessionError::InvalidState(..) => ErrorKind::State,
        }
    }

    /// Process exit code: 1 when the task itself failed, 2 when it never ran
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Exception => 1,
            _ => 2,
        }
    }

    pub(crate) fn from_connect(err: boot_fabric::Error) -> Self {
        match err {
            boot_fabric::Error::Connect { address, source } => {
                SessionError::Connection { address, source }
            }
            boot_fabric::Error::Timeout(phase) => SessionError::Timeout(phase),
            other => SessionError::Config(other.to_string()),
        }
    }

    pub(crate) fn from_send(err: boot_fabric::Error) -> Self {
        match err {
            boot_fabric::Error::Timeout(phase) => SessionError::Timeout(phase),
            other => SessionError::Encode(other),
        }
    }

    pub(crate) fn from_receive(err: boot_fabric::Error) -> Self {
        match err {
            boot_fabric::Error::Timeout(phase) => SessionError::Timeout(phase),
            other => SessionError::Decode(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
