//! Command descriptors.
//!
//! A descriptor is an immutable value that renders itself into the
//! ordered token line the server expects (command name first) and
//! declares the type its reply decodes into.

use bytes::Bytes;

use crate::convert::ToToken;
use crate::error::Result;
use crate::resp::{multi_bulk, RespValue};

pub mod range;
pub mod zset;

pub use range::{format_range, score_token};
pub use zset::{
    ZAdd, ZCard, ZCount, ZIncrBy, ZRange, ZRangeByScore, ZRangeByScoreWithScores,
    ZRangeWithScores, ZRank, ZRem, ZRemRangeByRank, ZRemRangeByScore, ZScore, ZStore,
    ZStoreWeighted,
};

pub trait Command {
    /// Decoded reply type.
    type Output;

    fn name(&self) -> &'static str;

    /// Token line, command name included.
    fn line(&self) -> Vec<Bytes>;

    fn parse_reply(reply: RespValue) -> Result<Self::Output>;

    /// RESP multi-bulk frame of [`Command::line`].
    fn encode(&self) -> Bytes {
        multi_bulk(&self.line())
    }
}

/// Token line under construction.
pub(crate) struct Line {
    tokens: Vec<Bytes>,
}

impl Line {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            tokens: vec![Bytes::from_static(name.as_bytes())],
        }
    }

    pub(crate) fn arg<T: ToToken + ?Sized>(mut self, value: &T) -> Self {
        self.tokens.push(value.to_token());
        self
    }

    pub(crate) fn keyword(mut self, word: &'static str) -> Self {
        self.tokens.push(Bytes::from_static(word.as_bytes()));
        self
    }

    pub(crate) fn token(mut self, token: Bytes) -> Self {
        self.tokens.push(token);
        self
    }

    pub(crate) fn tokens(mut self, tokens: impl IntoIterator<Item = Bytes>) -> Self {
        self.tokens.extend(tokens);
        self
    }

    pub(crate) fn finish(self) -> Vec<Bytes> {
        self.tokens
    }
}
