use std::fmt::Display;

use thiserror::Error;

/// Errors produced while encoding or decoding bencode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of input at offset {offset}")]
    Eof { offset: usize },

    #[error("invalid syntax at offset {offset}: {reason}")]
    Syntax { offset: usize, reason: String },

    #[error("dictionary key at offset {offset} is not in sorted order")]
    UnsortedKey { offset: usize },

    #[error("trailing data at offset {offset}")]
    TrailingData { offset: usize },

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn syntax(offset: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            reason: reason.into(),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
