//! Score range formatting shared by ZRANGEBYSCORE, its WITHSCORES
//! variant and ZCOUNT.

use bytes::Bytes;

use crate::convert::format_score;
use crate::types::Limit;

/// Render one score bound.
///
/// Exclusive finite bounds get a `(` prefix. Infinities have no open or
/// closed form, so `inclusive` is ignored for them.
pub fn score_token(value: f64, inclusive: bool) -> Bytes {
    let number = format_score(value);
    if inclusive || value.is_infinite() {
        Bytes::from(number)
    } else {
        Bytes::from(format!("({}", number))
    }
}

/// Returns `(limit_tokens, min_token, max_token)`.
pub fn format_range(
    min: f64,
    min_inclusive: bool,
    max: f64,
    max_inclusive: bool,
    limit: Option<Limit>,
) -> (Vec<Bytes>, Bytes, Bytes) {
    let limit_tokens = match limit {
        Some(Limit { offset, count }) => vec![
            Bytes::from_static(b"LIMIT"),
            Bytes::from(offset.to_string()),
            Bytes::from(count.to_string()),
        ],
        None => Vec::new(),
    };

    (
        limit_tokens,
        score_token(min, min_inclusive),
        score_token(max, max_inclusive),
    )
}
