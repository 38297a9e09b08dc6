//! Sorted-set command descriptors.

use std::marker::PhantomData;

use bytes::Bytes;

use super::range::format_range;
use super::{Command, Line};
use crate::convert::{
    parse_integer, parse_members, parse_optional_integer, parse_optional_score, parse_scored,
    FromBulk, ToToken,
};
use crate::error::Result;
use crate::resp::RespValue;
use crate::types::{Aggregate, Direction, Limit, ScoreBound, SetOp, ZMember};

// --- Single key writes ---

/// `ZADD key score member [score member ...]`
#[derive(Debug, Clone)]
pub struct ZAdd<A> {
    key: String,
    members: Vec<(f64, A)>,
}

impl<A: ToToken> ZAdd<A> {
    pub fn new(key: impl Into<String>, score: f64, member: A) -> Self {
        Self {
            key: key.into(),
            members: vec![(score, member)],
        }
    }

    /// Add another score/member pair.
    pub fn and(mut self, score: f64, member: A) -> Self {
        self.members.push((score, member));
        self
    }

    pub fn pairs(mut self, pairs: impl IntoIterator<Item = (f64, A)>) -> Self {
        self.members.extend(pairs);
        self
    }
}

impl<A: ToToken> Command for ZAdd<A> {
    type Output = i64;

    fn name(&self) -> &'static str {
        "ZADD"
    }

    fn line(&self) -> Vec<Bytes> {
        let mut line = Line::new(self.name()).arg(&self.key);
        for (score, member) in &self.members {
            line = line.arg(score).arg(member);
        }
        line.finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

/// `ZREM key member [member ...]`
#[derive(Debug, Clone)]
pub struct ZRem<A> {
    key: String,
    members: Vec<A>,
}

impl<A: ToToken> ZRem<A> {
    pub fn new(key: impl Into<String>, member: A) -> Self {
        Self {
            key: key.into(),
            members: vec![member],
        }
    }

    pub fn and(mut self, member: A) -> Self {
        self.members.push(member);
        self
    }
}

impl<A: ToToken> Command for ZRem<A> {
    type Output = i64;

    fn name(&self) -> &'static str {
        "ZREM"
    }

    fn line(&self) -> Vec<Bytes> {
        let mut line = Line::new(self.name()).arg(&self.key);
        for member in &self.members {
            line = line.arg(member);
        }
        line.finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

/// `ZINCRBY key increment member`
#[derive(Debug, Clone)]
pub struct ZIncrBy<A> {
    key: String,
    increment: f64,
    member: A,
}

impl<A: ToToken> ZIncrBy<A> {
    pub fn new(key: impl Into<String>, increment: f64, member: A) -> Self {
        Self {
            key: key.into(),
            increment,
            member,
        }
    }
}

impl<A: ToToken> Command for ZIncrBy<A> {
    type Output = Option<f64>;

    fn name(&self) -> &'static str {
        "ZINCRBY"
    }

    fn line(&self) -> Vec<Bytes> {
        Line::new(self.name())
            .arg(&self.key)
            .arg(&self.increment)
            .arg(&self.member)
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<Option<f64>> {
        parse_optional_score(reply)
    }
}

// --- Single key reads ---

/// `ZCARD key`
#[derive(Debug, Clone)]
pub struct ZCard {
    key: String,
}

impl ZCard {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Command for ZCard {
    type Output = i64;

    fn name(&self) -> &'static str {
        "ZCARD"
    }

    fn line(&self) -> Vec<Bytes> {
        Line::new(self.name()).arg(&self.key).finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

/// `ZSCORE key member`
#[derive(Debug, Clone)]
pub struct ZScore<A> {
    key: String,
    member: A,
}

impl<A: ToToken> ZScore<A> {
    pub fn new(key: impl Into<String>, member: A) -> Self {
        Self {
            key: key.into(),
            member,
        }
    }
}

impl<A: ToToken> Command for ZScore<A> {
    type Output = Option<f64>;

    fn name(&self) -> &'static str {
        "ZSCORE"
    }

    fn line(&self) -> Vec<Bytes> {
        Line::new(self.name())
            .arg(&self.key)
            .arg(&self.member)
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<Option<f64>> {
        parse_optional_score(reply)
    }
}

/// `ZRANK key member` / `ZREVRANK key member`
///
/// Replies nil when the member is not in the set.
#[derive(Debug, Clone)]
pub struct ZRank<A> {
    key: String,
    member: A,
    direction: Direction,
}

impl<A: ToToken> ZRank<A> {
    pub fn new(key: impl Into<String>, member: A) -> Self {
        Self {
            key: key.into(),
            member,
            direction: Direction::Asc,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn rev(self) -> Self {
        self.direction(Direction::Desc)
    }
}

impl<A: ToToken> Command for ZRank<A> {
    type Output = Option<i64>;

    fn name(&self) -> &'static str {
        self.direction.rank_command()
    }

    fn line(&self) -> Vec<Bytes> {
        Line::new(self.name())
            .arg(&self.key)
            .arg(&self.member)
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<Option<i64>> {
        parse_optional_integer(reply)
    }
}

// --- Index ranges ---

/// `ZRANGE key start end` / `ZREVRANGE key start end`
///
/// Members are decoded as `R` (raw bytes unless [`ZRange::decode_as`]
/// says otherwise). Reversal only changes the command name; `start` and
/// `end` keep their order.
#[derive(Debug, Clone)]
pub struct ZRange<R = Bytes> {
    key: String,
    start: i64,
    end: i64,
    direction: Direction,
    _member: PhantomData<fn() -> R>,
}

impl ZRange {
    /// Whole set, ascending.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            start: 0,
            end: -1,
            direction: Direction::Asc,
            _member: PhantomData,
        }
    }
}

impl<R> ZRange<R> {
    pub fn span(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn rev(self) -> Self {
        self.direction(Direction::Desc)
    }

    pub fn decode_as<T: FromBulk>(self) -> ZRange<T> {
        ZRange {
            key: self.key,
            start: self.start,
            end: self.end,
            direction: self.direction,
            _member: PhantomData,
        }
    }

    /// Same range, replying with `(member, score)` pairs.
    pub fn with_scores(self) -> ZRangeWithScores<R> {
        ZRangeWithScores { range: self }
    }

    fn base_line(&self) -> Line {
        Line::new(self.direction.range_command())
            .arg(&self.key)
            .arg(&self.start)
            .arg(&self.end)
    }
}

impl<R: FromBulk> Command for ZRange<R> {
    type Output = Vec<R>;

    fn name(&self) -> &'static str {
        self.direction.range_command()
    }

    fn line(&self) -> Vec<Bytes> {
        self.base_line().finish()
    }

    fn parse_reply(reply: RespValue) -> Result<Vec<R>> {
        parse_members(reply)
    }
}

/// `ZRANGE key start end WITHSCORES` and its reverse form.
#[derive(Debug, Clone)]
pub struct ZRangeWithScores<R = Bytes> {
    range: ZRange<R>,
}

impl<R: FromBulk> Command for ZRangeWithScores<R> {
    type Output = Vec<ZMember<R>>;

    fn name(&self) -> &'static str {
        self.range.name()
    }

    fn line(&self) -> Vec<Bytes> {
        self.range.base_line().keyword("WITHSCORES").finish()
    }

    fn parse_reply(reply: RespValue) -> Result<Vec<ZMember<R>>> {
        parse_scored(reply)
    }
}

/// `ZREMRANGEBYRANK key start end`
#[derive(Debug, Clone)]
pub struct ZRemRangeByRank {
    key: String,
    start: i64,
    end: i64,
}

impl ZRemRangeByRank {
    pub fn new(key: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            key: key.into(),
            start,
            end,
        }
    }
}

impl Command for ZRemRangeByRank {
    type Output = i64;

    fn name(&self) -> &'static str {
        "ZREMRANGEBYRANK"
    }

    fn line(&self) -> Vec<Bytes> {
        Line::new(self.name())
            .arg(&self.key)
            .arg(&self.start)
            .arg(&self.end)
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

// --- Score ranges ---

/// `ZRANGEBYSCORE key min max [LIMIT offset count]`
///
/// In the reverse form (`ZREVRANGEBYSCORE`) the bound tokens swap:
/// `max` goes first. Bounds default to `-inf` / `+inf`.
#[derive(Debug, Clone)]
pub struct ZRangeByScore<R = Bytes> {
    key: String,
    min: ScoreBound,
    max: ScoreBound,
    limit: Option<Limit>,
    direction: Direction,
    _member: PhantomData<fn() -> R>,
}

impl ZRangeByScore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            min: ScoreBound::neg_infinity(),
            max: ScoreBound::infinity(),
            limit: None,
            direction: Direction::Asc,
            _member: PhantomData,
        }
    }
}

impl<R> ZRangeByScore<R> {
    pub fn min(mut self, bound: ScoreBound) -> Self {
        self.min = bound;
        self
    }

    pub fn max(mut self, bound: ScoreBound) -> Self {
        self.max = bound;
        self
    }

    pub fn limit(mut self, offset: i64, count: i64) -> Self {
        self.limit = Some(Limit::new(offset, count));
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn rev(self) -> Self {
        self.direction(Direction::Desc)
    }

    pub fn decode_as<T: FromBulk>(self) -> ZRangeByScore<T> {
        ZRangeByScore {
            key: self.key,
            min: self.min,
            max: self.max,
            limit: self.limit,
            direction: self.direction,
            _member: PhantomData,
        }
    }

    pub fn with_scores(self) -> ZRangeByScoreWithScores<R> {
        ZRangeByScoreWithScores { range: self }
    }

    fn render(&self, with_scores: bool) -> Vec<Bytes> {
        let (limit, min, max) = format_range(
            self.min.value,
            self.min.inclusive,
            self.max.value,
            self.max.inclusive,
            self.limit,
        );
        let (first, second) = if self.direction.is_rev() {
            (max, min)
        } else {
            (min, max)
        };

        let mut line = Line::new(self.direction.range_by_score_command())
            .arg(&self.key)
            .token(first)
            .token(second);
        if with_scores {
            line = line.keyword("WITHSCORES");
        }
        line.tokens(limit).finish()
    }
}

impl<R: FromBulk> Command for ZRangeByScore<R> {
    type Output = Vec<R>;

    fn name(&self) -> &'static str {
        self.direction.range_by_score_command()
    }

    fn line(&self) -> Vec<Bytes> {
        self.render(false)
    }

    fn parse_reply(reply: RespValue) -> Result<Vec<R>> {
        parse_members(reply)
    }
}

/// `ZRANGEBYSCORE key min max WITHSCORES [LIMIT offset count]` and its
/// reverse form.
#[derive(Debug, Clone)]
pub struct ZRangeByScoreWithScores<R = Bytes> {
    range: ZRangeByScore<R>,
}

impl<R: FromBulk> Command for ZRangeByScoreWithScores<R> {
    type Output = Vec<ZMember<R>>;

    fn name(&self) -> &'static str {
        self.range.name()
    }

    fn line(&self) -> Vec<Bytes> {
        self.range.render(true)
    }

    fn parse_reply(reply: RespValue) -> Result<Vec<ZMember<R>>> {
        parse_scored(reply)
    }
}

/// `ZCOUNT key min max`
#[derive(Debug, Clone)]
pub struct ZCount {
    key: String,
    min: ScoreBound,
    max: ScoreBound,
}

impl ZCount {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            min: ScoreBound::neg_infinity(),
            max: ScoreBound::infinity(),
        }
    }

    pub fn min(mut self, bound: ScoreBound) -> Self {
        self.min = bound;
        self
    }

    pub fn max(mut self, bound: ScoreBound) -> Self {
        self.max = bound;
        self
    }
}

impl Command for ZCount {
    type Output = i64;

    fn name(&self) -> &'static str {
        "ZCOUNT"
    }

    fn line(&self) -> Vec<Bytes> {
        let (_, min, max) = format_range(
            self.min.value,
            self.min.inclusive,
            self.max.value,
            self.max.inclusive,
            None,
        );
        Line::new(self.name())
            .arg(&self.key)
            .token(min)
            .token(max)
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

/// `ZREMRANGEBYSCORE key start end`
///
/// Both ends are sent as plain numbers: there is no exclusive form here,
/// unlike ZRANGEBYSCORE and ZCOUNT.
#[derive(Debug, Clone)]
pub struct ZRemRangeByScore {
    key: String,
    start: f64,
    end: f64,
}

impl ZRemRangeByScore {
    pub fn new(key: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            key: key.into(),
            start,
            end,
        }
    }
}

impl Command for ZRemRangeByScore {
    type Output = i64;

    fn name(&self) -> &'static str {
        "ZREMRANGEBYSCORE"
    }

    fn line(&self) -> Vec<Bytes> {
        Line::new(self.name())
            .arg(&self.key)
            .arg(&self.start)
            .arg(&self.end)
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

// --- Multi key stores ---

/// `ZUNIONSTORE|ZINTERSTORE dst numkeys key [key ...] AGGREGATE agg`
#[derive(Debug, Clone)]
pub struct ZStore {
    op: SetOp,
    dst: String,
    keys: Vec<String>,
    aggregate: Aggregate,
}

impl ZStore {
    pub fn new<K: Into<String>>(
        op: SetOp,
        dst: impl Into<String>,
        keys: impl IntoIterator<Item = K>,
    ) -> Self {
        Self {
            op,
            dst: dst.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            aggregate: Aggregate::default(),
        }
    }

    pub fn union<K: Into<String>>(dst: impl Into<String>, keys: impl IntoIterator<Item = K>) -> Self {
        Self::new(SetOp::Union, dst, keys)
    }

    pub fn inter<K: Into<String>>(dst: impl Into<String>, keys: impl IntoIterator<Item = K>) -> Self {
        Self::new(SetOp::Intersect, dst, keys)
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Attach one weight per key, in key order. Lengths are not checked.
    pub fn weights(self, weights: impl IntoIterator<Item = f64>) -> ZStoreWeighted {
        ZStoreWeighted {
            op: self.op,
            dst: self.dst,
            keys: self.keys,
            weights: weights.into_iter().collect(),
            aggregate: self.aggregate,
        }
    }
}

impl Command for ZStore {
    type Output = i64;

    fn name(&self) -> &'static str {
        self.op.command()
    }

    fn line(&self) -> Vec<Bytes> {
        let mut line = Line::new(self.name())
            .arg(&self.dst)
            .arg(&self.keys.len());
        for key in &self.keys {
            line = line.arg(key);
        }
        line.keyword("AGGREGATE")
            .keyword(self.aggregate.as_str())
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}

/// `ZUNIONSTORE|ZINTERSTORE dst numkeys key [key ...] WEIGHTS w [w ...]
/// AGGREGATE agg`
#[derive(Debug, Clone)]
pub struct ZStoreWeighted {
    op: SetOp,
    dst: String,
    keys: Vec<String>,
    weights: Vec<f64>,
    aggregate: Aggregate,
}

impl ZStoreWeighted {
    /// Build from `(key, weight)` pairs.
    pub fn new<K: Into<String>>(
        op: SetOp,
        dst: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> Self {
        let (keys, weights): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(k, w)| (k.into(), w)).unzip();
        Self {
            op,
            dst: dst.into(),
            keys,
            weights,
            aggregate: Aggregate::default(),
        }
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }
}

impl Command for ZStoreWeighted {
    type Output = i64;

    fn name(&self) -> &'static str {
        self.op.command()
    }

    fn line(&self) -> Vec<Bytes> {
        let mut line = Line::new(self.name())
            .arg(&self.dst)
            .arg(&self.keys.len());
        for key in &self.keys {
            line = line.arg(key);
        }
        line = line.keyword("WEIGHTS");
        for weight in &self.weights {
            line = line.arg(weight);
        }
        line.keyword("AGGREGATE")
            .keyword(self.aggregate.as_str())
            .finish()
    }

    fn parse_reply(reply: RespValue) -> Result<i64> {
        parse_integer(reply)
    }
}
