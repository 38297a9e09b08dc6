//! Conversions between Rust values and wire tokens.
//!
//! [`ToToken`] serializes arguments into request tokens, [`FromBulk`]
//! reads a single bulk payload back into a member type, and the
//! `parse_*` functions decode whole replies into the shape a command
//! declares.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{KvError, Result};
use crate::resp::RespValue;
use crate::types::ZMember;

/// Serializes a value into one protocol token.
pub trait ToToken {
    fn to_token(&self) -> Bytes;
}

impl<T: ToToken + ?Sized> ToToken for &T {
    fn to_token(&self) -> Bytes {
        (**self).to_token()
    }
}

impl ToToken for str {
    fn to_token(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToToken for String {
    fn to_token(&self) -> Bytes {
        self.as_str().to_token()
    }
}

impl ToToken for [u8] {
    fn to_token(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToToken for Vec<u8> {
    fn to_token(&self) -> Bytes {
        self.as_slice().to_token()
    }
}

impl ToToken for Bytes {
    fn to_token(&self) -> Bytes {
        self.clone()
    }
}

impl ToToken for f64 {
    fn to_token(&self) -> Bytes {
        Bytes::from(format_score(*self))
    }
}

macro_rules! int_to_token {
    ($($t:ty),*) => {
        $(
            impl ToToken for $t {
                fn to_token(&self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

int_to_token!(i32, i64, u32, u64, usize);

/// Decimal rendering of a score.
///
/// Finite values always carry a fraction or exponent (`5.0`, `1e16`);
/// infinities render as `+inf` / `-inf`. NaN passes through as `NaN`.
pub fn format_score(value: f64) -> String {
    if value == f64::INFINITY {
        "+inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:?}", value)
    }
}

/// A serde value packed as MessagePack so it can be stored as a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed(Bytes);

impl Packed {
    pub fn new<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self(Bytes::from(rmp_serde::to_vec(value)?)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl ToToken for Packed {
    fn to_token(&self) -> Bytes {
        self.0.clone()
    }
}

/// Reads one bulk payload as a member value.
pub trait FromBulk: Sized {
    fn from_bulk(bytes: Bytes) -> Result<Self>;
}

impl FromBulk for Bytes {
    fn from_bulk(bytes: Bytes) -> Result<Self> {
        Ok(bytes)
    }
}

impl FromBulk for Vec<u8> {
    fn from_bulk(bytes: Bytes) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl FromBulk for String {
    fn from_bulk(bytes: Bytes) -> Result<Self> {
        String::from_utf8(bytes.to_vec()).map_err(|e| KvError::InvalidBulk(e.to_string()))
    }
}

impl FromBulk for i64 {
    fn from_bulk(bytes: Bytes) -> Result<Self> {
        let text = String::from_bulk(bytes)?;
        text.parse()
            .map_err(|_| KvError::InvalidBulk(format!("not an integer: {}", text)))
    }
}

impl FromBulk for f64 {
    fn from_bulk(bytes: Bytes) -> Result<Self> {
        let text = String::from_bulk(bytes)?;
        text.parse()
            .map_err(|_| KvError::InvalidBulk(format!("not a float: {}", text)))
    }
}

/// A member decoded from MessagePack.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked<T>(pub T);

impl<T: DeserializeOwned> FromBulk for Unpacked<T> {
    fn from_bulk(bytes: Bytes) -> Result<Self> {
        Ok(Unpacked(rmp_serde::from_slice(&bytes)?))
    }
}

fn unexpected(expected: &'static str, found: &RespValue) -> KvError {
    KvError::UnexpectedReply {
        expected,
        found: found.kind().to_string(),
    }
}

pub fn parse_integer(reply: RespValue) -> Result<i64> {
    match reply {
        RespValue::Integer(n) => Ok(n),
        other => Err(unexpected("integer", &other)),
    }
}

/// Integer reply that may be nil (e.g. ZRANK on a missing member).
pub fn parse_optional_integer(reply: RespValue) -> Result<Option<i64>> {
    match reply {
        RespValue::Integer(n) => Ok(Some(n)),
        RespValue::BulkString(None) | RespValue::Array(None) => Ok(None),
        other => Err(unexpected("integer or nil", &other)),
    }
}

/// Score reply that may be nil (ZSCORE, ZINCRBY).
pub fn parse_optional_score(reply: RespValue) -> Result<Option<f64>> {
    match reply {
        RespValue::BulkString(None) | RespValue::Array(None) => Ok(None),
        RespValue::BulkString(Some(data)) => f64::from_bulk(Bytes::from(data)).map(Some),
        other => Err(unexpected("score or nil", &other)),
    }
}

fn bulk_items(reply: RespValue) -> Result<Vec<Vec<u8>>> {
    let items = match reply {
        RespValue::Array(Some(items)) => items,
        RespValue::Array(None) => return Ok(Vec::new()),
        other => return Err(unexpected("array", &other)),
    };

    items
        .into_iter()
        .map(|item| match item {
            RespValue::BulkString(Some(data)) => Ok(data),
            other => Err(unexpected("bulk string", &other)),
        })
        .collect()
}

pub fn parse_members<T: FromBulk>(reply: RespValue) -> Result<Vec<T>> {
    bulk_items(reply)?
        .into_iter()
        .map(|data| T::from_bulk(Bytes::from(data)))
        .collect()
}

/// Flat `member, score, member, score, ...` reply of a WITHSCORES query.
pub fn parse_scored<T: FromBulk>(reply: RespValue) -> Result<Vec<ZMember<T>>> {
    let items = bulk_items(reply)?;
    if items.len() % 2 != 0 {
        return Err(KvError::UnexpectedReply {
            expected: "member/score pairs",
            found: format!("array of {} items", items.len()),
        });
    }

    let mut members = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
        members.push(ZMember::new(
            T::from_bulk(Bytes::from(member))?,
            f64::from_bulk(Bytes::from(score))?,
        ));
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(5.0), "5.0");
        assert_eq!(format_score(-2.5), "-2.5");
        assert_eq!(format_score(0.1), "0.1");
        assert_eq!(format_score(f64::INFINITY), "+inf");
        assert_eq!(format_score(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_to_token() {
        assert_eq!("m1".to_token(), Bytes::from_static(b"m1"));
        assert_eq!(String::from("m2").to_token(), Bytes::from_static(b"m2"));
        assert_eq!(vec![0u8, 255].to_token(), Bytes::from_static(&[0, 255]));
        assert_eq!((-1i64).to_token(), Bytes::from_static(b"-1"));
        assert_eq!(1.0f64.to_token(), Bytes::from_static(b"1.0"));
        assert_eq!((&"ref").to_token(), Bytes::from_static(b"ref"));
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Player {
        name: String,
        level: u32,
    }

    #[test]
    fn test_packed_round_trip() {
        let player = Player {
            name: "ana".to_string(),
            level: 7,
        };
        let packed = Packed::new(&player).unwrap();
        assert_eq!(packed.as_bytes(), rmp_serde::to_vec(&player).unwrap().as_slice());

        let Unpacked(decoded) = Unpacked::<Player>::from_bulk(packed.to_token()).unwrap();
        assert_eq!(decoded, player);
    }

    #[test]
    fn test_unpack_garbage() {
        let err = Unpacked::<Player>::from_bulk(Bytes::from_static(b"\xc1")).unwrap_err();
        assert!(matches!(err, KvError::Unpack(_)));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(RespValue::Integer(3)).unwrap(), 3);
        let err = parse_integer(RespValue::null()).unwrap_err();
        assert!(matches!(err, KvError::UnexpectedReply { expected: "integer", .. }));
    }

    #[test]
    fn test_parse_optional_integer() {
        assert_eq!(parse_optional_integer(RespValue::Integer(0)).unwrap(), Some(0));
        assert_eq!(parse_optional_integer(RespValue::null()).unwrap(), None);
        assert!(parse_optional_integer(RespValue::ok()).is_err());
    }

    #[test]
    fn test_parse_optional_score() {
        assert_eq!(parse_optional_score(RespValue::from("1.5")).unwrap(), Some(1.5));
        assert_eq!(parse_optional_score(RespValue::from("-inf")).unwrap(), Some(f64::NEG_INFINITY));
        assert_eq!(parse_optional_score(RespValue::null()).unwrap(), None);

        let err = parse_optional_score(RespValue::from("abc")).unwrap_err();
        assert!(matches!(err, KvError::InvalidBulk(_)));
    }

    #[test]
    fn test_parse_members() {
        let reply = RespValue::array(vec![RespValue::from("a"), RespValue::from("b")]);
        let members: Vec<String> = parse_members(reply).unwrap();
        assert_eq!(members, vec!["a", "b"]);

        let empty: Vec<Bytes> = parse_members(RespValue::array(vec![])).unwrap();
        assert!(empty.is_empty());

        let err = parse_members::<Bytes>(RespValue::Integer(1)).unwrap_err();
        assert!(matches!(err, KvError::UnexpectedReply { expected: "array", .. }));
    }

    #[test]
    fn test_parse_scored() {
        let reply = RespValue::array(vec![
            RespValue::from("a"),
            RespValue::from("1"),
            RespValue::from("b"),
            RespValue::from("2.5"),
        ]);
        let members: Vec<ZMember<String>> = parse_scored(reply).unwrap();
        assert_eq!(
            members,
            vec![ZMember::new("a".to_string(), 1.0), ZMember::new("b".to_string(), 2.5)]
        );
    }

    #[test]
    fn test_parse_scored_odd_length() {
        let reply = RespValue::array(vec![RespValue::from("a")]);
        assert!(parse_scored::<Bytes>(reply).is_err());
    }
}
