use serde::{Deserialize, Serialize};

/// Sort direction of a range query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn is_rev(&self) -> bool {
        matches!(self, Direction::Desc)
    }

    /// Command name for an index range query.
    pub fn range_command(&self) -> &'static str {
        match self {
            Direction::Asc => "ZRANGE",
            Direction::Desc => "ZREVRANGE",
        }
    }

    /// Command name for a score range query.
    pub fn range_by_score_command(&self) -> &'static str {
        match self {
            Direction::Asc => "ZRANGEBYSCORE",
            Direction::Desc => "ZREVRANGEBYSCORE",
        }
    }

    pub fn rank_command(&self) -> &'static str {
        match self {
            Direction::Asc => "ZRANK",
            Direction::Desc => "ZREVRANK",
        }
    }
}

/// How scores of the same member are combined by ZUNIONSTORE/ZINTERSTORE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetOp {
    Union,
    Intersect,
}

impl SetOp {
    pub fn command(&self) -> &'static str {
        match self {
            SetOp::Union => "ZUNIONSTORE",
            SetOp::Intersect => "ZINTERSTORE",
        }
    }
}

/// LIMIT clause of a score range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

impl Limit {
    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset, count }
    }
}

impl From<(i64, i64)> for Limit {
    fn from((offset, count): (i64, i64)) -> Self {
        Self { offset, count }
    }
}

/// One end of a score range. Infinite bounds ignore `inclusive`.
///
/// NaN is not rejected: it is sent as `NaN` and the server refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBound {
    pub value: f64,
    pub inclusive: bool,
}

impl ScoreBound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }

    pub fn neg_infinity() -> Self {
        Self::inclusive(f64::NEG_INFINITY)
    }

    pub fn infinity() -> Self {
        Self::inclusive(f64::INFINITY)
    }
}

/// A member of a WITHSCORES reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ZMember<T> {
    pub member: T,
    pub score: f64,
}

impl<T> ZMember<T> {
    pub fn new(member: T, score: f64) -> Self {
        Self { member, score }
    }
}
