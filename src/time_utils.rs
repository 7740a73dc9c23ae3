// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for meetup date/time parsing and display.

use chrono::{DateTime, Duration, NaiveDateTime};

/// `datetime-local` form value, e.g. `2025-11-20T14:30`.
const FORM_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a meetup start value.
///
/// Accepts the form's `YYYY-MM-DDTHH:MM`, the same with seconds, or RFC3339
/// (converted to its local wall-clock time).
pub fn parse_meetup_start(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(raw, FORM_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Human-friendly start time: `Today at 3:05 PM`, `Tomorrow at 9:00 AM`,
/// otherwise `Jan 5, 3:05 PM`.
pub fn format_meetup_start(start: NaiveDateTime, now: NaiveDateTime) -> String {
    let time = start.format("%-I:%M %p");
    let day = start.date();

    if day == now.date() {
        format!("Today at {}", time)
    } else if day == (now + Duration::days(1)).date() {
        format!("Tomorrow at {}", time)
    } else {
        format!("{}, {}", start.format("%b %-d"), time)
    }
}

/// Format a raw start value, falling back to the raw text when unparsable.
pub fn display_meetup_start(raw: &str, now: NaiveDateTime) -> String {
    match parse_meetup_start(raw) {
        Some(start) => format_meetup_start(start, now),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        parse_meetup_start(raw).unwrap()
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(at("2025-11-20T14:30"), at("2025-11-20T14:30:00"));
        assert_eq!(at("2025-11-20T14:30:00+00:00"), at("2025-11-20T14:30"));
        assert!(parse_meetup_start("").is_none());
        assert!(parse_meetup_start("next tuesday").is_none());
    }

    #[test]
    fn test_relative_days() {
        let now = at("2025-11-20T09:00");
        assert_eq!(format_meetup_start(at("2025-11-20T15:05"), now), "Today at 3:05 PM");
        assert_eq!(format_meetup_start(at("2025-11-21T09:00"), now), "Tomorrow at 9:00 AM");
        assert_eq!(format_meetup_start(at("2026-01-05T00:30"), now), "Jan 5, 12:30 AM");
    }

    #[test]
    fn test_unparsable_is_shown_raw() {
        let now = at("2025-11-20T09:00");
        assert_eq!(display_meetup_start("soon", now), "soon");
    }
}
