//! RESP framing for the two storage commands the client issues.
//!
//! Commands go out as arrays of bulk strings. Replies are decoded
//! incrementally: a partial frame leaves the buffer untouched until more
//! bytes arrive.

use bytes::Buf;
use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tokio_util::codec::Encoder;

use crate::constants::MAX_BULK_LEN;
use crate::constants::MAX_NESTING;
use crate::ProtocolError;

/// Request sent to a storage node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: Bytes },
    Get { key: String },
}

impl Command {
    /// Create write command for key-value pair
    pub fn set(
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Command::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create read command for specified key
    pub fn get(key: impl Into<String>) -> Self {
        Command::Get { key: key.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Command::Set { key, .. } | Command::Get { key } => key,
        }
    }
}

/// Reply received from a storage node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Status(String),
    Error(String),
    Integer(i64),
    /// `None` is the null bulk string, i.e. a miss
    Bulk(Option<Bytes>),
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Interprets the reply to a `GET`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` for a bulk string
    /// - `Ok(None)` for a null bulk string
    /// - `Err` for an error reply or any other reply type
    pub fn into_value(self) -> Result<Option<Bytes>, ProtocolError> {
        match self {
            Reply::Bulk(value) => Ok(value),
            Reply::Error(message) => Err(ProtocolError::ServerError(message)),
            other => Err(ProtocolError::UnexpectedReply(format!("{other:?}"))),
        }
    }

    /// Interprets the reply to a `SET`
    pub fn into_ack(self) -> Result<(), ProtocolError> {
        match self {
            Reply::Status(_) => Ok(()),
            Reply::Error(message) => Err(ProtocolError::ServerError(message)),
            other => Err(ProtocolError::UnexpectedReply(format!("{other:?}"))),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RespCodec;

impl Encoder<Command> for RespCodec {
    type Error = ProtocolError;

    fn encode(
        &mut self,
        command: Command,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        match command {
            Command::Set { key, value } => {
                write_array_header(dst, 3);
                write_bulk(dst, b"SET");
                write_bulk(dst, key.as_bytes());
                write_bulk(dst, &value);
            }
            Command::Get { key } => {
                write_array_header(dst, 2);
                write_bulk(dst, b"GET");
                write_bulk(dst, key.as_bytes());
            }
        }
        Ok(())
    }
}

impl Decoder for RespCodec {
    type Item = Reply;
    type Error = ProtocolError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        let mut pos = 0;
        match parse_reply(src, &mut pos, 0)? {
            Some(reply) => {
                src.advance(pos);
                Ok(Some(reply))
            }
            None => Ok(None),
        }
    }
}

fn write_array_header(
    dst: &mut BytesMut,
    len: usize,
) {
    dst.put_u8(b'*');
    dst.put_slice(len.to_string().as_bytes());
    dst.put_slice(b"\r\n");
}

fn write_bulk(
    dst: &mut BytesMut,
    data: &[u8],
) {
    dst.reserve(data.len() + 16);
    dst.put_u8(b'$');
    dst.put_slice(data.len().to_string().as_bytes());
    dst.put_slice(b"\r\n");
    dst.put_slice(data);
    dst.put_slice(b"\r\n");
}

/// Returns the line starting at `*pos` without its CRLF and moves `*pos`
/// past it, or `None` if the line is not complete yet.
fn read_line<'a>(
    buf: &'a [u8],
    pos: &mut usize,
) -> Option<&'a [u8]> {
    let start = *pos;
    let end = buf[start..].windows(2).position(|w| w == b"\r\n")? + start;
    *pos = end + 2;
    Some(&buf[start..end])
}

fn parse_int(line: &[u8]) -> Result<i64, ProtocolError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ProtocolError::Malformed(format!("invalid integer {:?}", String::from_utf8_lossy(line))))
}

fn parse_reply(
    buf: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Option<Reply>, ProtocolError> {
    if *pos >= buf.len() {
        return Ok(None);
    }
    let prefix = buf[*pos];
    *pos += 1;
    let Some(line) = read_line(buf, pos) else {
        return Ok(None);
    };

    let reply = match prefix {
        b'+' => Reply::Status(String::from_utf8_lossy(line).into_owned()),
        b'-' => Reply::Error(String::from_utf8_lossy(line).into_owned()),
        b':' => Reply::Integer(parse_int(line)?),
        b'$' => match parse_int(line)? {
            -1 => Reply::Bulk(None),
            len if len < 0 || len as usize > MAX_BULK_LEN => {
                return Err(ProtocolError::Malformed(format!("invalid bulk length {len}")));
            }
            len => {
                let len = len as usize;
                if buf.len() < *pos + len + 2 {
                    return Ok(None);
                }
                if &buf[*pos + len..*pos + len + 2] != b"\r\n" {
                    return Err(ProtocolError::Malformed("bulk string not terminated by CRLF".into()));
                }
                let data = Bytes::copy_from_slice(&buf[*pos..*pos + len]);
                *pos += len + 2;
                Reply::Bulk(Some(data))
            }
        },
        b'*' => match parse_int(line)? {
            -1 => Reply::Array(None),
            count if count < 0 => {
                return Err(ProtocolError::Malformed(format!("invalid array length {count}")));
            }
            _ if depth >= MAX_NESTING => {
                return Err(ProtocolError::Malformed(format!("array nesting deeper than {MAX_NESTING}")));
            }
            count => {
                let mut items = Vec::with_capacity((count as usize).min(1024));
                for _ in 0..count {
                    match parse_reply(buf, pos, depth + 1)? {
                        Some(item) => items.push(item),
                        None => return Ok(None),
                    }
                }
                Reply::Array(Some(items))
            }
        },
        other => {
            return Err(ProtocolError::Malformed(format!("unknown reply prefix {:?}", other as char)));
        }
    };
    Ok(Some(reply))
}
