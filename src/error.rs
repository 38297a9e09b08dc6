use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("connection out of sync after an earlier failure; reconnect")]
    Desynced,

    #[error("server error: {0}")]
    Server(String),

    #[error("unexpected reply: expected {expected}, found {found}")]
    UnexpectedReply {
        expected: &'static str,
        found: String,
    },

    #[error("invalid bulk payload: {0}")]
    InvalidBulk(String),

    #[error("pack error: {0}")]
    Pack(#[from] rmp_serde::encode::Error),

    #[error("unpack error: {0}")]
    Unpack(#[from] rmp_serde::decode::Error),
}

pub type Result<T> = std::result::Result<T, KvError>;
