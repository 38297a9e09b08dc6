//! zwire - typed sorted-set commands for Redis-compatible stores
//!
//! Every sorted-set command is a small immutable descriptor that renders
//! the exact token line the server expects and declares what its reply
//! decodes into.
//!
//! # Example
//!
//! ```
//! use zwire::{Command, ScoreBound, ZRangeByScore};
//!
//! let query = ZRangeByScore::new("leaderboard")
//!     .min(ScoreBound::exclusive(5.0))
//!     .limit(0, 10)
//!     .rev();
//!
//! let line: Vec<String> = query
//!     .line()
//!     .iter()
//!     .map(|t| String::from_utf8_lossy(t).into_owned())
//!     .collect();
//! assert_eq!(
//!     line,
//!     ["ZREVRANGEBYSCORE", "leaderboard", "+inf", "(5.0", "LIMIT", "0", "10"]
//! );
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod resp;
pub mod types;

pub use client::Client;
pub use command::{
    Command, ZAdd, ZCard, ZCount, ZIncrBy, ZRange, ZRangeByScore, ZRangeByScoreWithScores,
    ZRangeWithScores, ZRank, ZRem, ZRemRangeByRank, ZRemRangeByScore, ZScore, ZStore,
    ZStoreWeighted,
};
pub use config::ClientConfig;
pub use convert::{FromBulk, Packed, ToToken, Unpacked};
pub use error::{KvError, Result};
pub use resp::RespValue;
pub use types::{Aggregate, Direction, Limit, ScoreBound, SetOp, ZMember};
