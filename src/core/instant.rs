use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Date format used in timestream file names.
pub const TIMESTREAM_DATE_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

static INSTANT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}_\d{2}_\d{2}_\d{2}_\d{2}_\d{2})(_\d+)?(_\w+)?")
        .expect("instant pattern is a valid regex")
});

// Extended formats carrying a UTC offset. The offset is dropped, never applied.
static OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

static NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Anything that can be turned into a naive local timestamp.
///
/// Typed timestamps pass through (timezone-aware ones lose their offset),
/// strings go through [`parse_date`].
pub trait IntoTimestamp {
    fn into_timestamp(self) -> Result<NaiveDateTime>;
}

impl IntoTimestamp for NaiveDateTime {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        Ok(self)
    }
}

impl<Tz: TimeZone> IntoTimestamp for DateTime<Tz> {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        Ok(self.naive_local())
    }
}

impl IntoTimestamp for &str {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        parse_str(self)
    }
}

impl IntoTimestamp for String {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        parse_str(&self)
    }
}

impl IntoTimestamp for &String {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        parse_str(self)
    }
}

/// Parse an ISO-8601-ish or timestream-style date into a naive local timestamp.
///
/// Formats are tried in order and the first match wins: extended ISO-8601
/// (any timezone is discarded, not converted), then `YYYY_MM_DD_HH_MM_SS`.
pub fn parse_date(value: impl IntoTimestamp) -> Result<NaiveDateTime> {
    value.into_timestamp()
}

fn parse_str(text: &str) -> Result<NaiveDateTime> {
    if let Some(datetime) = parse_extended(text) {
        return Ok(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, TIMESTREAM_DATE_FORMAT) {
        return Ok(datetime);
    }
    Err(EngineError::MalformedTimestamp(text.to_string()))
}

fn parse_extended(text: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(text, fmt) {
            return Some(datetime.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(datetime);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// A generalised moment in time: a timestamp plus an optional sub-second
/// counter and an optional index within that timepoint.
///
/// The canonical form is `YYYY_MM_DD_HH_MM_SS_SS[_INDEX]`, and it is the key
/// results are recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instant {
    pub datetime: NaiveDateTime,
    pub subsecond: u32,
    pub index: Option<String>,
}

impl Instant {
    pub fn new(
        datetime: impl IntoTimestamp,
        subsecond: u32,
        index: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            datetime: parse_date(datetime)?,
            subsecond,
            index,
        })
    }

    pub fn at(datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            subsecond: 0,
            index: None,
        }
    }

    pub fn with_subsecond(mut self, subsecond: u32) -> Self {
        self.subsecond = subsecond;
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Extract date, subsecond and index from the file name of a timestream image.
    ///
    /// Directories and the extension are ignored; the date pattern may appear
    /// anywhere in the remaining name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        Self::search(&stem)
            .ok_or_else(|| EngineError::NoTimestampInPath(path.display().to_string()))?
    }

    pub fn iso8601(&self) -> String {
        self.datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    fn search(text: &str) -> Option<Result<Self>> {
        let captures = INSTANT_PATTERN.captures(text)?;
        let datetime = match parse_date(&captures[1]) {
            Ok(datetime) => datetime,
            Err(err) => return Some(Err(err)),
        };
        // Subseconds that do not fit are treated as absent.
        let subsecond = captures
            .get(2)
            .and_then(|m| m.as_str().trim_start_matches('_').parse::<u32>().ok())
            .unwrap_or(0);
        let index = captures
            .get(3)
            .map(|m| m.as_str().trim_start_matches('_').to_string());
        Some(Ok(Self {
            datetime,
            subsecond,
            index,
        }))
    }
}

impl From<NaiveDateTime> for Instant {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::at(datetime)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{:02}",
            self.datetime.format(TIMESTREAM_DATE_FORMAT),
            self.subsecond
        )?;
        if let Some(index) = &self.index {
            write!(f, "_{index}")?;
        }
        Ok(())
    }
}

impl FromStr for Instant {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::search(s).ok_or_else(|| EngineError::MalformedTimestamp(s.to_string()))?
    }
}
