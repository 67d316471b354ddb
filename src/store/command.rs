use std::fmt;
use std::time::Duration;

/// Lower or upper bound for a sorted-set score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegInf,
    PosInf,
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBound {
    /// Everything strictly after `since`, or everything when `since` is not
    /// a positive timestamp.
    pub fn after(since: f64) -> Self {
        if since > 0.0 {
            Self::Exclusive(since)
        } else {
            Self::NegInf
        }
    }

    pub(crate) fn to_arg(self) -> String {
        match self {
            Self::NegInf => "-inf".into(),
            Self::PosInf => "+inf".into(),
            Self::Inclusive(score) => format_score(score),
            Self::Exclusive(score) => format!("({}", format_score(score)),
        }
    }

    pub(crate) fn admits_from_below(self, score: f64) -> bool {
        match self {
            Self::NegInf => true,
            Self::PosInf => false,
            Self::Inclusive(bound) => score >= bound,
            Self::Exclusive(bound) => score > bound,
        }
    }

    pub(crate) fn admits_from_above(self, score: f64) -> bool {
        match self {
            Self::NegInf => false,
            Self::PosInf => true,
            Self::Inclusive(bound) => score <= bound,
            Self::Exclusive(bound) => score < bound,
        }
    }
}

/// Shortest representation that parses back to the same `f64`.
pub(crate) fn format_score(score: f64) -> String {
    format!("{score}")
}

/// One store command. Rendered to the wire as a flat argument array.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Get {
        key: String,
    },
    Set {
        key: String,
        value: String,
        ttl: Option<Duration>,
    },
    Del {
        key: String,
    },
    Incr {
        key: String,
    },
    LPush {
        key: String,
        value: String,
    },
    RPop {
        key: String,
    },
    LRange {
        key: String,
        start: i64,
        stop: i64,
    },
    LTrim {
        key: String,
        start: i64,
        stop: i64,
    },
    ZAdd {
        key: String,
        score: f64,
        member: String,
        /// Only move an existing member's score upward.
        only_greater: bool,
    },
    ZRangeByScore {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
    },
    ZRevRange {
        key: String,
        start: i64,
        stop: i64,
    },
    ZRemRangeByRank {
        key: String,
        start: i64,
        stop: i64,
    },
    ZScore {
        key: String,
        member: String,
    },
    ZCard {
        key: String,
    },
    HSet {
        key: String,
        field: String,
        value: String,
    },
    HGetAll {
        key: String,
    },
    HKeys {
        key: String,
    },
}

impl Command {
    pub fn get(key: impl Into<String>) -> Self {
        Self::Get { key: key.into() }
    }

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl: None,
        }
    }

    pub fn set_ex(key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl: Some(ttl),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Self::Del { key: key.into() }
    }

    pub fn incr(key: impl Into<String>) -> Self {
        Self::Incr { key: key.into() }
    }

    pub fn lpush(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::LPush {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn rpop(key: impl Into<String>) -> Self {
        Self::RPop { key: key.into() }
    }

    pub fn lrange(key: impl Into<String>, start: i64, stop: i64) -> Self {
        Self::LRange {
            key: key.into(),
            start,
            stop,
        }
    }

    pub fn ltrim(key: impl Into<String>, start: i64, stop: i64) -> Self {
        Self::LTrim {
            key: key.into(),
            start,
            stop,
        }
    }

    pub fn zadd(key: impl Into<String>, score: f64, member: impl Into<String>) -> Self {
        Self::ZAdd {
            key: key.into(),
            score,
            member: member.into(),
            only_greater: false,
        }
    }

    pub fn zadd_gt(key: impl Into<String>, score: f64, member: impl Into<String>) -> Self {
        Self::ZAdd {
            key: key.into(),
            score,
            member: member.into(),
            only_greater: true,
        }
    }

    pub fn zrange_by_score(key: impl Into<String>, min: ScoreBound, max: ScoreBound) -> Self {
        Self::ZRangeByScore {
            key: key.into(),
            min,
            max,
        }
    }

    pub fn zrevrange(key: impl Into<String>, start: i64, stop: i64) -> Self {
        Self::ZRevRange {
            key: key.into(),
            start,
            stop,
        }
    }

    pub fn zremrange_by_rank(key: impl Into<String>, start: i64, stop: i64) -> Self {
        Self::ZRemRangeByRank {
            key: key.into(),
            start,
            stop,
        }
    }

    pub fn zscore(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::ZScore {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn zcard(key: impl Into<String>) -> Self {
        Self::ZCard { key: key.into() }
    }

    pub fn hset(key: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::HSet {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn hgetall(key: impl Into<String>) -> Self {
        Self::HGetAll { key: key.into() }
    }

    pub fn hkeys(key: impl Into<String>) -> Self {
        Self::HKeys { key: key.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "GET",
            Self::Set { .. } => "SET",
            Self::Del { .. } => "DEL",
            Self::Incr { .. } => "INCR",
            Self::LPush { .. } => "LPUSH",
            Self::RPop { .. } => "RPOP",
            Self::LRange { .. } => "LRANGE",
            Self::LTrim { .. } => "LTRIM",
            Self::ZAdd { .. } => "ZADD",
            Self::ZRangeByScore { .. } => "ZRANGEBYSCORE",
            Self::ZRevRange { .. } => "ZREVRANGE",
            Self::ZRemRangeByRank { .. } => "ZREMRANGEBYRANK",
            Self::ZScore { .. } => "ZSCORE",
            Self::ZCard { .. } => "ZCARD",
            Self::HSet { .. } => "HSET",
            Self::HGetAll { .. } => "HGETALL",
            Self::HKeys { .. } => "HKEYS",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Get { key }
            | Self::Set { key, .. }
            | Self::Del { key }
            | Self::Incr { key }
            | Self::LPush { key, .. }
            | Self::RPop { key }
            | Self::LRange { key, .. }
            | Self::LTrim { key, .. }
            | Self::ZAdd { key, .. }
            | Self::ZRangeByScore { key, .. }
            | Self::ZRevRange { key, .. }
            | Self::ZRemRangeByRank { key, .. }
            | Self::ZScore { key, .. }
            | Self::ZCard { key }
            | Self::HSet { key, .. }
            | Self::HGetAll { key }
            | Self::HKeys { key } => key,
        }
    }

    /// Wire form: command name followed by its arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string(), self.key().to_string()];
        match self {
            Self::Get { .. }
            | Self::Del { .. }
            | Self::Incr { .. }
            | Self::RPop { .. }
            | Self::ZCard { .. }
            | Self::HGetAll { .. }
            | Self::HKeys { .. } => {}
            Self::Set { value, ttl, .. } => {
                args.push(value.clone());
                if let Some(ttl) = ttl {
                    args.push("EX".into());
                    args.push(ttl.as_secs().max(1).to_string());
                }
            }
            Self::LPush { value, .. } => args.push(value.clone()),
            Self::LRange { start, stop, .. }
            | Self::LTrim { start, stop, .. }
            | Self::ZRevRange { start, stop, .. }
            | Self::ZRemRangeByRank { start, stop, .. } => {
                args.push(start.to_string());
                args.push(stop.to_string());
            }
            Self::ZAdd {
                score,
                member,
                only_greater,
                ..
            } => {
                if *only_greater {
                    args.push("GT".into());
                }
                args.push(format_score(*score));
                args.push(member.clone());
            }
            Self::ZRangeByScore { min, max, .. } => {
                args.push(min.to_arg());
                args.push(max.to_arg());
            }
            Self::ZScore { member, .. } => args.push(member.clone()),
            Self::HSet { field, value, .. } => {
                args.push(field.clone());
                args.push(value.clone());
            }
        }
        args
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.key())
    }
}

/// Decoded store reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Int(i64),
    Str(String),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Self::Str("OK".into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn into_opt_string(self) -> Option<String> {
        match self {
            Self::Str(value) => Some(value),
            Self::Int(value) => Some(value.to_string()),
            Self::Nil | Self::Array(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Str(value) => value.parse().ok(),
            Self::Nil | Self::Array(_) => None,
        }
    }

    /// Flatten an array reply into strings; `Nil` reads as empty.
    pub fn into_strings(self) -> Option<Vec<String>> {
        match self {
            Self::Nil => Some(Vec::new()),
            Self::Array(items) => items.into_iter().map(Reply::into_opt_string).collect(),
            Self::Int(_) | Self::Str(_) => None,
        }
    }

    pub(crate) fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(flag) => Self::Int(i64::from(flag)),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map_or_else(|| Self::Str(number.to_string()), Self::Int),
            serde_json::Value::String(text) => Self::Str(text),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(_) => Self::Str(value.to_string()),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "(nil)"),
            Self::Int(value) => write!(f, "(integer) {value}"),
            Self::Str(value) => write!(f, "{value:?}"),
            Self::Array(items) => write!(f, "(array of {})", items.len()),
        }
    }
}
