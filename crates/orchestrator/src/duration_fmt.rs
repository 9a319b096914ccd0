// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing/formatting for the human-readable duration strings used in the
//! script document format (e.g. `"500ms"`, `"2s"`, `"1m30s"`).

use std::time::Duration;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// Parse a duration string made of `<number><unit>` segments, where unit is
/// one of `ms`, `s`, `m`, `h`. Segments concatenate (`"1m30s"` == 90s).
/// A bare number with no unit is rejected — scripts must be explicit.
pub fn parse(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(format!("expected a number in duration {input:?}"));
        }
        let (num_str, after_num) = rest.split_at(digits_end);
        let unit_end = after_num.find(|c: char| c.is_ascii_digit()).unwrap_or(after_num.len());
        let (unit, remainder) = after_num.split_at(unit_end);
        let value: f64 =
            num_str.parse().map_err(|_| format!("invalid number {num_str:?} in {input:?}"))?;
        let unit_secs: f64 = match unit {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            other => return Err(format!("unknown duration unit {other:?} in {input:?}")),
        };
        total += Duration::from_secs_f64(value * unit_secs);
        rest = remainder;
    }
    Ok(total)
}

/// Format a duration back into the millisecond form used for round-tripping.
pub fn format(d: Duration) -> String {
    format!("{}ms", d.as_millis())
}

pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format(*d))
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(d)?;
    parse(&s).map_err(D::Error::custom)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&format(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let s: Option<String> = Option::deserialize(d)?;
        s.map(|s| parse(&s).map_err(D::Error::custom)).transpose()
    }
}

#[cfg(test)]
#[path = "duration_fmt_tests.rs"]
mod tests;
