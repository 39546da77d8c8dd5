// src/config/duration.rs

//! Human-readable durations used throughout the plan file.
//!
//! A value is one or more `<digits><unit>` segments written back to back,
//! summed left to right: `250ms`, `3s`, `1m30s`, `1h2m3s`. Units are `ms`,
//! `s`, `m` and `h`, case-insensitive. Whitespace is only trimmed at the ends.

use std::time::Duration;

/// Parse a duration string such as `"3s"`, `"250ms"` or `"1m30s"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("duration '{s}' has a unit without a number"));
        }
        let (num_part, tail) = rest.split_at(digits);
        let units = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
        if units == 0 {
            return Err(format!("duration '{s}' is missing a unit suffix"));
        }
        let (unit_part, next) = tail.split_at(units);

        let value: u64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;
        let segment = segment(value, &unit_part.to_lowercase())?;
        total = total
            .checked_add(segment)
            .ok_or_else(|| format!("duration '{s}' is too large"))?;
        rest = next;
    }

    Ok(total)
}

fn segment(value: u64, unit: &str) -> Result<Duration, String> {
    let secs = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration segment '{value}{unit}' is too large"))
    };

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => secs(1),
        "m" => secs(60),
        "h" => secs(60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{unit}'; expected ms, s, m, or h"
        )),
    }
}
