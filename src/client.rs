//! Async client that sends one command descriptor at a time.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::command::Command;
use crate::config::ClientConfig;
use crate::error::{KvError, Result};
use crate::resp::{multi_bulk, RespReader, RespValue};

pub struct Client<S = TcpStream> {
    conn: RespReader<S>,
    response_timeout: Duration,
    // Set once a reply may still be in flight or half read
    desynced: bool,
}

impl Client<TcpStream> {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        tracing::debug!("Connecting to {}", config.addr);

        let limit = config.connect_timeout();
        let stream = timeout(limit, TcpStream::connect(&config.addr))
            .await
            .map_err(|_| KvError::Timeout(limit))??;
        stream.set_nodelay(config.nodelay)?;

        Ok(Self::from_stream(stream, config))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    /// Wrap an already established stream.
    pub fn from_stream(stream: S, config: &ClientConfig) -> Self {
        Self {
            conn: RespReader::new(stream),
            response_timeout: config.response_timeout(),
            desynced: false,
        }
    }

    /// False once a timeout or transport error has left an unread reply
    /// on the stream. Every later `send` fails with [`KvError::Desynced`].
    pub fn is_usable(&self) -> bool {
        !self.desynced
    }

    /// Send a command and decode its reply into the declared output type.
    ///
    /// Error replies become [`KvError::Server`]. A timeout or transport
    /// error retires the connection.
    pub async fn send<C: Command>(&mut self, command: &C) -> Result<C::Output> {
        if self.desynced {
            return Err(KvError::Desynced);
        }

        let line = command.line();
        tracing::debug!(
            command = command.name(),
            args = line.len().saturating_sub(1),
            "sending command"
        );

        let frame = multi_bulk(&line);
        let limit = self.response_timeout;
        let outcome = timeout(limit, self.round_trip(&frame)).await;
        let reply = match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                self.desynced = true;
                return Err(err);
            }
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", command.name(), limit);
                self.desynced = true;
                return Err(KvError::Timeout(limit));
            }
        };

        match reply {
            RespValue::Error(msg) => {
                tracing::warn!("{} failed: {}", command.name(), msg);
                Err(KvError::Server(msg))
            }
            reply => {
                tracing::trace!("{} replied with {}", command.name(), reply.kind());
                C::parse_reply(reply)
            }
        }
    }

    async fn round_trip(&mut self, frame: &[u8]) -> Result<RespValue> {
        let stream = self.conn.get_mut();
        stream.write_all(frame).await?;
        stream.flush().await?;

        self.conn.read_value().await?.ok_or(KvError::ConnectionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ZAdd, ZCard, ZRange, ZRangeByScore, ZScore};
    use crate::types::{ScoreBound, ZMember};
    use tokio_test::io::Builder;

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    #[tokio::test]
    async fn test_send_integer_reply() {
        let mock = Builder::new()
            .write(b"*2\r\n$5\r\nZCARD\r\n$1\r\ns\r\n")
            .read(b":3\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        assert_eq!(client.send(&ZCard::new("s")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_send_writes_exact_frame() {
        let mock = Builder::new()
            .write(b"*6\r\n$4\r\nZADD\r\n$5\r\nmyset\r\n$3\r\n1.0\r\n$2\r\nm1\r\n$3\r\n2.0\r\n$2\r\nm2\r\n")
            .read(b":2\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        let added = client
            .send(&ZAdd::new("myset", 1.0, "m1").and(2.0, "m2"))
            .await
            .unwrap();
        assert_eq!(added, 2);
    }

    #[tokio::test]
    async fn test_send_nil_score() {
        let mock = Builder::new()
            .write(&ZScore::new("s", "missing").encode())
            .read(b"$-1\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        assert_eq!(client.send(&ZScore::new("s", "missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_with_scores() {
        let command = ZRange::new("s").decode_as::<String>().with_scores();
        let mock = Builder::new()
            .write(&command.encode())
            .read(b"*4\r\n$1\r\na\r\n$1\r\n1\r\n$1\r\nb\r\n$3\r\n2.5\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        let members = client.send(&command).await.unwrap();
        assert_eq!(
            members,
            vec![ZMember::new("a".to_string(), 1.0), ZMember::new("b".to_string(), 2.5)]
        );
    }

    #[tokio::test]
    async fn test_sequential_commands() {
        let first = ZCard::new("s");
        let second = ZRangeByScore::new("s").min(ScoreBound::exclusive(1.0));
        let mock = Builder::new()
            .write(&first.encode())
            .read(b":1\r\n")
            .write(&second.encode())
            .read(b"*1\r\n$1\r\nx\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        assert_eq!(client.send(&first).await.unwrap(), 1);
        let members = client.send(&second).await.unwrap();
        assert_eq!(members, vec![bytes::Bytes::from_static(b"x")]);
    }

    #[tokio::test]
    async fn test_error_reply() {
        let mock = Builder::new()
            .write(&ZCard::new("s").encode())
            .read(b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        let err = client.send(&ZCard::new("s")).await.unwrap_err();
        match err {
            KvError::Server(msg) => assert!(msg.starts_with("WRONGTYPE")),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_reply_shape() {
        let mock = Builder::new()
            .write(&ZCard::new("s").encode())
            .read(b"+OK\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        let err = client.send(&ZCard::new("s")).await.unwrap_err();
        assert!(matches!(err, KvError::UnexpectedReply { .. }));
    }

    #[tokio::test]
    async fn test_connection_closed() {
        let mock = Builder::new().write(&ZCard::new("s").encode()).build();
        let mut client = Client::from_stream(mock, &config());

        let err = client.send(&ZCard::new("s")).await.unwrap_err();
        assert!(matches!(err, KvError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_response_timeout() {
        let mock = Builder::new()
            .write(&ZCard::new("s").encode())
            .wait(Duration::from_millis(500))
            .build();
        let mut client = Client::from_stream(mock, &config().response_timeout_ms(20));

        let err = client.send(&ZCard::new("s")).await.unwrap_err();
        assert!(matches!(err, KvError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_no_send_after_timeout() {
        // The late reply must never be handed to the next command
        let mock = Builder::new()
            .write(&ZCard::new("s").encode())
            .wait(Duration::from_millis(500))
            .build();
        let mut client = Client::from_stream(mock, &config().response_timeout_ms(20));

        let err = client.send(&ZCard::new("s")).await.unwrap_err();
        assert!(matches!(err, KvError::Timeout(_)));
        assert!(!client.is_usable());

        let err = client.send(&ZCard::new("other")).await.unwrap_err();
        assert!(matches!(err, KvError::Desynced));
    }

    #[tokio::test]
    async fn test_no_send_after_connection_closed() {
        let mock = Builder::new().write(&ZCard::new("s").encode()).build();
        let mut client = Client::from_stream(mock, &config());

        assert!(matches!(
            client.send(&ZCard::new("s")).await.unwrap_err(),
            KvError::ConnectionClosed
        ));
        assert!(matches!(
            client.send(&ZCard::new("s")).await.unwrap_err(),
            KvError::Desynced
        ));
    }

    #[tokio::test]
    async fn test_server_error_keeps_client_usable() {
        let mock = Builder::new()
            .write(&ZCard::new("s").encode())
            .read(b"-ERR boom\r\n")
            .write(&ZCard::new("s").encode())
            .read(b":2\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config());

        assert!(client.send(&ZCard::new("s")).await.is_err());
        assert!(client.is_usable());
        assert_eq!(client.send(&ZCard::new("s")).await.unwrap(), 2);
    }
}
