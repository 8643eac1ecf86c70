//! The forum backend emits timestamps either with an offset or as naive UTC,
//! depending on whether the row was written by the database default or by the
//! application. Both are accepted here.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::Time;

fn parse(s: &str) -> Result<Time, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|t| Utc.from_utc_datetime(&t))
        .map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Time, D::Error> {
    let s = String::deserialize(d)?;
    parse(&s).map_err(de::Error::custom)
}

pub fn deserialize_option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Time>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|s| parse(&s))
        .transpose()
        .map_err(de::Error::custom)
}
