use std::collections::BTreeMap;

use super::error::{Error, Result};
use super::value::Value;

/// Deepest list/dictionary nesting accepted by the decoder
pub const MAX_DEPTH: usize = 256;

/// Decode exactly one value; any bytes after it are an error
pub fn decode(input: &[u8]) -> Result<Value> {
    let (value, consumed) = decode_prefix(input)?;
    if consumed != input.len() {
        return Err(Error::TrailingData { offset: consumed });
    }
    Ok(value)
}

/// Decode one value from the front of `input`
///
/// Returns the value and the number of bytes it occupied. Nothing past that
/// point is inspected.
pub fn decode_prefix(input: &[u8]) -> Result<(Value, usize)> {
    let mut parser = Parser { input, pos: 0 };
    let value = parser.value(0)?;
    Ok((value, parser.pos))
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Result<u8> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(Error::Eof { offset: self.pos })
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }

        match self.peek()? {
            b'i' => {
                self.pos += 1;
                self.integer().map(Value::Int)
            }
            b'l' => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.peek()? != b'e' {
                    items.push(self.value(depth + 1)?);
                }
                self.pos += 1;
                Ok(Value::List(items))
            }
            b'd' => {
                self.pos += 1;
                self.dict(depth).map(Value::Dict)
            }
            b'0'..=b'9' => self.bytes().map(Value::Bytes),
            b'-' => Err(Error::syntax(self.pos, "negative length prefix")),
            other => Err(Error::syntax(
                self.pos,
                format!("unexpected byte 0x{:02x}", other),
            )),
        }
    }

    fn dict(&mut self, depth: usize) -> Result<BTreeMap<Vec<u8>, Value>> {
        let mut map = BTreeMap::new();
        let mut previous: Option<Vec<u8>> = None;

        while self.peek()? != b'e' {
            let key_offset = self.pos;
            if !self.peek()?.is_ascii_digit() {
                return Err(Error::syntax(
                    key_offset,
                    "dictionary key must be a byte string",
                ));
            }
            let key = self.bytes()?;

            // Strictly increasing: rejects both misordering and duplicates
            if let Some(prev) = &previous {
                if key.as_slice() <= prev.as_slice() {
                    return Err(Error::UnsortedKey { offset: key_offset });
                }
            }

            let value = self.value(depth + 1)?;
            previous = Some(key.clone());
            map.insert(key, value);
        }

        self.pos += 1;
        Ok(map)
    }

    fn bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.length()?;
        let remaining = self.input.len() - self.pos;
        if len > remaining {
            return Err(Error::Eof {
                offset: self.input.len(),
            });
        }

        let bytes = self.input[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    /// `<digits>:` in canonical form (no sign, no leading zeros)
    fn length(&mut self) -> Result<usize> {
        let start = self.pos;
        let mut len: usize = 0;

        loop {
            let b = self.peek()?;
            match b {
                b':' => break,
                b'0'..=b'9' => {
                    if self.pos > start && self.input[start] == b'0' {
                        return Err(Error::syntax(start, "length prefix has leading zeros"));
                    }
                    len = len
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(usize::from(b - b'0')))
                        .ok_or_else(|| Error::syntax(start, "length prefix overflows"))?;
                }
                b'-' => return Err(Error::syntax(self.pos, "negative length prefix")),
                _ => return Err(Error::syntax(self.pos, "non-numeric length prefix")),
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(Error::syntax(start, "empty length prefix"));
        }

        self.pos += 1;
        Ok(len)
    }

    /// Body of `i...e`, positioned just after the `i`
    fn integer(&mut self) -> Result<i64> {
        let start = self.pos;
        loop {
            match self.peek()? {
                b'e' => break,
                b'-' | b'0'..=b'9' => self.pos += 1,
                _ => return Err(Error::syntax(self.pos, "expected 'e' to end integer")),
            }
        }

        let digits = &self.input[start..self.pos];
        let unsigned = digits.strip_prefix(b"-").unwrap_or(digits);
        let canonical = !unsigned.is_empty()
            && unsigned.iter().all(u8::is_ascii_digit)
            && (unsigned == b"0" || unsigned[0] != b'0')
            && digits != b"-0";
        if !canonical {
            return Err(Error::syntax(start, "malformed integer"));
        }

        // Only ASCII digits and a sign remain, so this is valid UTF-8
        let text = std::str::from_utf8(digits).map_err(|e| Error::syntax(start, e.to_string()))?;
        let n = text
            .parse::<i64>()
            .map_err(|_| Error::syntax(start, "integer out of range"))?;

        self.pos += 1;
        Ok(n)
    }
}

/// Encode a value to its canonical byte form
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Bytes(bytes) => write_bytes(out, bytes),
        Value::Int(n) => {
            out.push(b'i');
            out.extend_from_slice(n.to_string().as_bytes());
            out.push(b'e');
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                write_value(out, item);
            }
            out.push(b'e');
        }
        Value::Dict(map) => {
            out.push(b'd');
            // BTreeMap iterates in byte order
            for (key, value) in map {
                write_bytes(out, key);
                write_value(out, value);
            }
            out.push(b'e');
        }
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}
