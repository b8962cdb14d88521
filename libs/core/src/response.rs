use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use thiserror::Error;

/// Reply from the build server
///
/// Keys the client does not know about are ignored and absent keys come back
/// empty, so only a non-empty `ex` signals failure. Every field is kept as the
/// raw bytes the server sent; nothing here assumes an encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    #[serde(with = "serde_bytes")]
    pub session: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub out: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub err: Vec<u8>,
    pub status: Vec<ByteBuf>,
    #[serde(with = "serde_bytes")]
    pub ex: Vec<u8>,
    #[serde(rename = "root-ex", with = "serde_bytes")]
    pub root_ex: Vec<u8>,
}

impl Response {
    /// Status flags, lossily decoded for display
    pub fn status_text(&self) -> Vec<Cow<'_, str>> {
        self.status
            .iter()
            .map(|flag| String::from_utf8_lossy(flag))
            .collect()
    }
}

/// Evaluation on the server raised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", String::from_utf8_lossy(.message))]
pub struct Exception {
    pub message: Vec<u8>,
    pub root_cause: Option<Vec<u8>>,
}

impl Exception {
    pub fn root_cause_text(&self) -> Option<Cow<'_, str>> {
        self.root_cause
            .as_deref()
            .map(String::from_utf8_lossy)
    }
}

/// What an invocation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Output),
    Failure(Exception),
}

/// Captured output of a successful evaluation, byte for byte
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub out: Vec<u8>,
    pub err: Vec<u8>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<Output, Exception> {
        match self {
            Outcome::Success(output) => Ok(output),
            Outcome::Failure(exception) => Err(exception),
        }
    }
}

/// Decide the outcome of a response
///
/// `status` is never consulted.
pub fn interpret(response: Response) -> Outcome {
    if !response.ex.is_empty() {
        let root_cause = Some(response.root_ex).filter(|root| !root.is_empty());
        return Outcome::Failure(Exception {
            message: response.ex,
            root_cause,
        });
    }

    Outcome::Success(Output {
        out: response.out,
        err: response.err,
    })
}
