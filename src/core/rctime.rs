// georepd - core/rctime.rs
//
// The rctime value type: a (seconds, nanoseconds) pair with lexicographic
// ordering, as exposed by the filesystem's recursive change-time attribute.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recursive change time.
///
/// Ordering is lexicographic on `(sec, nsec)`, which the field order of
/// the derived `Ord` provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Rctime {
    /// Seconds since the Unix epoch.
    pub sec: i64,
    /// Nanosecond remainder, always below one second.
    pub nsec: u32,
}

impl Rctime {
    /// Sentinel meaning "treat every file as newer" (seed mode).
    pub const SEED: Rctime = Rctime { sec: 1, nsec: 0 };

    pub fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// Parse the on-wire attribute form `<seconds>.<nanoseconds>`.
    ///
    /// The nanosecond field is a zero-padded integer, not a decimal
    /// fraction; `"5.090"` is 5 seconds and 90 nanoseconds. Attribute
    /// values arrive NUL-terminated, so trailing NUL bytes and
    /// whitespace are tolerated.
    pub fn parse(raw: &str) -> std::result::Result<Self, ParseRctimeError> {
        let trimmed = raw.trim_end_matches('\0').trim();
        let (sec_part, nsec_part) = match trimmed.split_once('.') {
            Some((s, n)) => (s, n),
            None => (trimmed, ""),
        };

        let sec = sec_part
            .parse::<i64>()
            .map_err(|_| ParseRctimeError::new(raw))?;

        let nsec = if nsec_part.is_empty() {
            0
        } else {
            nsec_part
                .parse::<u32>()
                .map_err(|_| ParseRctimeError::new(raw))?
        };
        if nsec >= 1_000_000_000 {
            return Err(ParseRctimeError::new(raw));
        }

        Ok(Self { sec, nsec })
    }

    /// The rctime as a UTC timestamp, for human-readable log output.
    /// `None` for values outside the representable chrono range.
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.sec, self.nsec).single()
    }
}

impl fmt::Display for Rctime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

/// A change-time attribute value that did not parse.
#[derive(Debug)]
pub struct ParseRctimeError {
    raw: String,
}

impl ParseRctimeError {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.trim_end_matches('\0').to_string(),
        }
    }
}

impl fmt::Display for ParseRctimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rctime value '{}'", self.raw)
    }
}

impl std::error::Error for ParseRctimeError {}
