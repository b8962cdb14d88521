//! Bencode: the self-describing wire format spoken by the build server
//!
//! - byte strings: `<len>:<bytes>`
//! - integers: `i<digits>e`
//! - lists: `l<value>...e`
//! - dictionaries: `d<key><value>...e`, keys in byte order
//!
//! Decoding is strict: non-canonical integers and length prefixes, unsorted
//! or duplicate dictionary keys, and truncated input are all rejected.

mod de;
mod error;
mod ser;
mod value;
mod wire;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use self::de::from_value;
pub use self::error::{Error, Result};
pub use self::ser::to_value;
pub use self::value::Value;
pub use self::wire::{decode, decode_prefix, encode, MAX_DEPTH};

/// Serialize any value straight to bencode bytes
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(encode(&to_value(value)?))
}

/// Decode exactly one bencode value from `bytes` into `T`
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    from_value(decode(bytes)?)
}
