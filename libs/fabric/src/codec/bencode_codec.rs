use serde::{Deserialize, Serialize};

use crate::codec::{bencode, Codec};
use crate::error::{Error, Result};

/// Bencode codec for the build server's message format
#[derive(Debug, Clone, Copy, Default)]
pub struct BencodeCodec;

impl Codec for BencodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        bencode::to_bytes(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        bencode::from_bytes(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}
