use std::io;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use super::RespValue;

/// Largest bulk string or array length accepted from a peer (512 MiB,
/// the server's default `proto-max-bulk-len`).
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Upper bound on capacity reserved up front for an array.
const PREALLOC_LIMIT: usize = 1024;

pub struct RespReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncReadExt + Unpin> RespReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Access the underlying stream, e.g. to write a request on it.
    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    /// Read a request frame (array of bulk strings), as a server would.
    /// Used by in-process servers standing in for a store.
    pub async fn read_command(&mut self) -> io::Result<Option<Vec<Vec<u8>>>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None); // EOF
        };

        if !line.starts_with('*') {
            return Err(invalid_data("expected array"));
        }

        let count: usize = line[1..]
            .parse()
            .map_err(|_| invalid_data("invalid array length"))?;
        if count > MAX_BULK_LEN {
            return Err(invalid_data("array too long"));
        }

        let mut args = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let line = self.read_line().await?.ok_or_else(unexpected_eof)?;
            if !line.starts_with('$') {
                return Err(invalid_data("expected bulk string"));
            }
            let arg = self.read_bulk_body(&line[1..]).await?;
            args.push(arg.unwrap_or_default());
        }

        Ok(Some(args))
    }

    /// Read one reply of any type. Returns `None` on a clean EOF.
    pub async fn read_value(&mut self) -> io::Result<Option<RespValue>> {
        // (remaining, collected) for every array still being filled
        let mut pending: Vec<(usize, Vec<RespValue>)> = Vec::new();

        loop {
            let Some(line) = self.read_line().await? else {
                if pending.is_empty() {
                    return Ok(None);
                }
                return Err(unexpected_eof());
            };

            let (prefix, rest) = match line.chars().next() {
                Some(c) => (c, &line[c.len_utf8()..]),
                None => return Err(invalid_data("empty reply line")),
            };

            let mut value = match prefix {
                '+' => RespValue::SimpleString(rest.to_string()),
                '-' => RespValue::Error(rest.to_string()),
                ':' => RespValue::Integer(
                    rest.parse()
                        .map_err(|_| invalid_data("invalid integer reply"))?,
                ),
                '$' => RespValue::BulkString(self.read_bulk_body(rest).await?),
                '*' => {
                    let len: i64 = rest
                        .parse()
                        .map_err(|_| invalid_data("invalid array length"))?;
                    match len {
                        -1 => RespValue::Array(None),
                        0 => RespValue::Array(Some(Vec::new())),
                        n if n > MAX_BULK_LEN as i64 => {
                            return Err(invalid_data("array too long"));
                        }
                        n if n > 0 => {
                            let n = n as usize;
                            pending.push((n, Vec::with_capacity(n.min(PREALLOC_LIMIT))));
                            continue;
                        }
                        _ => return Err(invalid_data("invalid array length")),
                    }
                }
                _ => return Err(invalid_data("unknown reply type")),
            };

            // Fold the finished value into its enclosing arrays
            loop {
                let Some((remaining, items)) = pending.last_mut() else {
                    return Ok(Some(value));
                };
                items.push(value);
                *remaining -= 1;
                if *remaining > 0 {
                    break;
                }
                let items = pending.pop().map(|(_, items)| items).unwrap_or_default();
                value = RespValue::Array(Some(items));
            }
        }
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Read the payload of a bulk string whose header length is `len`.
    async fn read_bulk_body(&mut self, len: &str) -> io::Result<Option<Vec<u8>>> {
        let len: i64 = len
            .trim()
            .parse()
            .map_err(|_| invalid_data("invalid bulk string length"))?;

        if len == -1 {
            return Ok(None); // Null bulk string
        }
        if len < 0 {
            return Err(invalid_data("invalid bulk string length"));
        }

        if len > MAX_BULK_LEN as i64 {
            return Err(invalid_data("bulk string too long"));
        }

        let len = len as usize;
        let mut data = vec![0u8; len + 2]; // +2 for \r\n
        self.reader.read_exact(&mut data).await?;

        data.truncate(len); // Remove \r\n
        Ok(Some(data))
    }
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn unexpected_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "reply truncated")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read(input: &[u8]) -> io::Result<Option<RespValue>> {
        RespReader::new(input).read_value().await
    }

    #[tokio::test]
    async fn test_read_scalars() {
        assert_eq!(read(b":7\r\n").await.unwrap(), Some(RespValue::Integer(7)));
        assert_eq!(read(b"+OK\r\n").await.unwrap(), Some(RespValue::ok()));
        assert_eq!(
            read(b"-WRONGTYPE bad\r\n").await.unwrap(),
            Some(RespValue::Error("WRONGTYPE bad".to_string()))
        );
        assert_eq!(read(b"$-1\r\n").await.unwrap(), Some(RespValue::null()));
        assert_eq!(
            read(b"$3\r\n1.5\r\n").await.unwrap(),
            Some(RespValue::from("1.5"))
        );
    }

    #[tokio::test]
    async fn test_read_binary_bulk() {
        let value = read(b"$4\r\na\r\nb\r\n").await.unwrap();
        assert_eq!(value, Some(RespValue::from_bytes(&b"a\r\nb"[..])));
    }

    #[tokio::test]
    async fn test_read_arrays() {
        assert_eq!(read(b"*0\r\n").await.unwrap(), Some(RespValue::array(vec![])));
        assert_eq!(read(b"*-1\r\n").await.unwrap(), Some(RespValue::Array(None)));

        let value = read(b"*2\r\n$1\r\na\r\n$1\r\n1\r\n").await.unwrap();
        assert_eq!(
            value,
            Some(RespValue::array(vec![RespValue::from("a"), RespValue::from("1")]))
        );
    }

    #[tokio::test]
    async fn test_read_nested_arrays() {
        let value = read(b"*2\r\n*2\r\n:1\r\n:2\r\n*0\r\n").await.unwrap();
        assert_eq!(
            value,
            Some(RespValue::array(vec![
                RespValue::array(vec![RespValue::Integer(1), RespValue::Integer(2)]),
                RespValue::array(vec![]),
            ]))
        );
    }

    #[tokio::test]
    async fn test_read_consecutive_values() {
        let mut reader = RespReader::new(&b":1\r\n$-1\r\n"[..]);
        assert_eq!(reader.read_value().await.unwrap(), Some(RespValue::Integer(1)));
        assert_eq!(reader.read_value().await.unwrap(), Some(RespValue::null()));
        assert_eq!(reader.read_value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_truncated_array() {
        let err = read(b"*2\r\n:1\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_unknown_prefix() {
        let err = read(b"?what\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_read_oversized_bulk_length() {
        let err = read(b"$9223372036854775807\r\nabc\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let just_over = format!("${}\r\n", MAX_BULK_LEN + 1);
        let err = read(just_over.as_bytes()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_read_oversized_array_length() {
        let err = read(b"*9223372036854775807\r\n:1\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut reader = RespReader::new(&b"*9223372036854775807\r\n$1\r\na\r\n"[..]);
        let err = reader.read_command().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_large_array_header_with_short_body() {
        // Capacity is not reserved from the header alone
        let err = read(b"*100000000\r\n:1\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_command() {
        let mut reader = RespReader::new(&b"*3\r\n$4\r\nZREM\r\n$1\r\nk\r\n$1\r\nm\r\n"[..]);
        let args = reader.read_command().await.unwrap().unwrap();
        assert_eq!(args, vec![b"ZREM".to_vec(), b"k".to_vec(), b"m".to_vec()]);
        assert!(reader.read_command().await.unwrap().is_none());
    }
}
