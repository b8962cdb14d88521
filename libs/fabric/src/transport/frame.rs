use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::bencode::MAX_DEPTH;
use crate::error::{Error, Result};

/// Largest single message accepted from the peer (100MB)
pub const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

/// Integers longer than this cannot fit in an i64
const MAX_INT_DIGITS: usize = 20;

/// Read the bytes of exactly one bencode value from `reader`
///
/// The value's own structure delimits the frame, so nothing after its final
/// byte is consumed. Only the framing is checked here; canonical form (key
/// order, integer spelling) is left to the codec.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut frame = Vec::new();
    let mut depth = 0usize;

    loop {
        let byte = next_byte(reader, &frame).await?;
        frame.push(byte);

        match byte {
            b'l' | b'd' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(Error::InvalidFrame(format!(
                        "nesting deeper than {} levels",
                        MAX_DEPTH
                    )));
                }
            }
            b'e' => {
                if depth == 0 {
                    return Err(Error::InvalidFrame(
                        "end marker outside of a list or dictionary".to_string(),
                    ));
                }
                depth -= 1;
            }
            b'i' => read_integer(reader, &mut frame).await?,
            b'0'..=b'9' => read_string(reader, &mut frame, byte, max_len).await?,
            other => {
                return Err(Error::InvalidFrame(format!(
                    "unexpected byte 0x{:02x} at offset {}",
                    other,
                    frame.len() - 1
                )));
            }
        }

        if frame.len() > max_len {
            return Err(Error::InvalidFrame(format!(
                "Message too large: more than {} bytes",
                max_len
            )));
        }

        if depth == 0 {
            return Ok(frame);
        }
    }
}

async fn next_byte<R: AsyncRead + Unpin>(reader: &mut R, frame: &[u8]) -> Result<u8> {
    reader.read_u8().await.map_err(|e| truncated(e, frame.len()))
}

fn truncated(e: std::io::Error, read: usize) -> Error {
    if e.kind() != std::io::ErrorKind::UnexpectedEof {
        return e.into();
    }
    if read == 0 {
        Error::ConnectionClosed
    } else {
        Error::InvalidFrame(format!("stream ended mid-value after {} bytes", read))
    }
}

async fn read_integer<R: AsyncRead + Unpin>(reader: &mut R, frame: &mut Vec<u8>) -> Result<()> {
    let start = frame.len();
    loop {
        let byte = next_byte(reader, frame).await?;
        frame.push(byte);
        match byte {
            b'e' => return Ok(()),
            b'-' | b'0'..=b'9' if frame.len() - start <= MAX_INT_DIGITS + 1 => {}
            _ => {
                return Err(Error::InvalidFrame(format!(
                    "malformed integer at offset {}",
                    start - 1
                )));
            }
        }
    }
}

/// Length prefix then body; `first` is the already-consumed first digit
async fn read_string<R: AsyncRead + Unpin>(
    reader: &mut R,
    frame: &mut Vec<u8>,
    first: u8,
    max_len: usize,
) -> Result<()> {
    let start = frame.len() - 1;
    let mut len = usize::from(first - b'0');

    loop {
        let byte = next_byte(reader, frame).await?;
        frame.push(byte);
        match byte {
            b':' => break,
            b'0'..=b'9' => {
                len = len
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(usize::from(byte - b'0')))
                    .ok_or_else(|| {
                        Error::InvalidFrame(format!("length prefix overflows at offset {}", start))
                    })?;
            }
            _ => {
                return Err(Error::InvalidFrame(format!(
                    "non-numeric length prefix at offset {}",
                    start
                )));
            }
        }
    }

    if frame.len().saturating_add(len) > max_len {
        return Err(Error::InvalidFrame(format!(
            "Message too large: {} byte string exceeds {} byte limit",
            len, max_len
        )));
    }

    // Grow with the bytes that actually arrive, not the declared length
    let body_start = frame.len();
    let read = (&mut *reader).take(len as u64).read_to_end(frame).await?;
    if read < len {
        return Err(Error::InvalidFrame(format!(
            "stream ended mid-value after {} bytes",
            body_start + read
        )));
    }
    Ok(())
}
