use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<Vec<u8>>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn null() -> Self {
        RespValue::BulkString(None)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        RespValue::Error(format!("ERR {}", msg.into()))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(bytes.into()))
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    /// Short description of the reply kind, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(None) => "null bulk string",
            RespValue::BulkString(Some(_)) => "bulk string",
            RespValue::Array(None) => "null array",
            RespValue::Array(Some(_)) => "array",
        }
    }

    /// Serialize as a reply frame, for in-process servers and test doubles.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.write_to(&mut buf);
        buf.freeze()
    }

    fn write_to(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => put_line(buf, b'+', s),
            RespValue::Error(s) => put_line(buf, b'-', s),
            RespValue::Integer(n) => put_line(buf, b':', n),
            RespValue::BulkString(None) => buf.put_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => put_bulk(buf, data),
            RespValue::Array(None) => buf.put_slice(b"*-1\r\n"),
            RespValue::Array(Some(items)) => {
                put_line(buf, b'*', items.len());
                for item in items {
                    item.write_to(buf);
                }
            }
        }
    }
}

impl From<i64> for RespValue {
    fn from(n: i64) -> Self {
        RespValue::Integer(n)
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        RespValue::from_bytes(s)
    }
}

/// Frame a command line as a RESP array of bulk strings.
pub fn multi_bulk(tokens: &[Bytes]) -> Bytes {
    let payload: usize = tokens.iter().map(|t| t.len() + 16).sum();
    let mut buf = BytesMut::with_capacity(payload + 16);

    put_line(&mut buf, b'*', tokens.len());
    for token in tokens {
        put_bulk(&mut buf, token);
    }

    buf.freeze()
}

fn put_line(buf: &mut BytesMut, prefix: u8, body: impl std::fmt::Display) {
    buf.put_u8(prefix);
    buf.put_slice(body.to_string().as_bytes());
    buf.put_slice(b"\r\n");
}

fn put_bulk(buf: &mut BytesMut, data: &[u8]) {
    put_line(buf, b'$', data.len());
    buf.put_slice(data);
    buf.put_slice(b"\r\n");
}
