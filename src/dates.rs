//! Free-text publish date resolution.
//!
//! Listing pages and article bylines print dates in whatever shape the site
//! prefers: `Oct 3, 2025, 5:12 PM ET`, `3 Oct 2025`, `10/3`, `2 hours ago`.
//! [`parse_date`] normalizes the text and tries a fixed list of formats.
//! Failure is never an error, just `None`.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Formats that carry a full year.
const DATED_FORMATS: &[&str] = &[
    "%B %d %Y",
    "%d %B %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%m-%d-%Y",
];

/// Formats without a year; the reference year is appended before parsing.
const YEARLESS_FORMATS: &[&str] = &["%B %d", "%d %B", "%m/%d"];

/// Time-zone abbreviations that trail US sports bylines.
const TIME_ZONES: &[&str] = &[
    "ET", "EST", "EDT", "CT", "CST", "CDT", "MT", "MST", "MDT", "PT", "PST", "PDT", "UTC",
    "GMT",
];

static TRAILING_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i),?\s*(?:at\s+)?\d{1,2}(?::\d{2}){1,2}\s*(?:[ap]\.?m\.?)?$").unwrap()
});
static TRAILING_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),?\s*(?:at\s+)?\d{1,2}\s*[ap]\.?m\.?$").unwrap());
static LEADING_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)[a-z]*\.?,?\s+").unwrap()
});
static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());
static SEPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsept\b").unwrap());
static ABBREV_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z]{3,})\.").unwrap());
static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[T ]|$)").unwrap());
static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+|an?|one)\s+(second|sec|minute|min|hour|hr|day|week)s?\s+ago$").unwrap()
});

/// Resolve `text` to a calendar date relative to the local clock.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    parse_date_at(text, Local::now().naive_local())
}

/// Resolve `text` to a calendar date, using `now` for relative markers and
/// dates printed without a year.
pub fn parse_date_at(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    if let Some(caps) = ISO_PREFIX.captures(raw) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return Some(date);
        }
    }

    let normalized = normalize(raw);
    if let Some(date) = parse_relative(&normalized, now) {
        return Some(date);
    }

    let parsed = DATED_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(&normalized, fmt)
                .ok()
                .filter(plausible)
        })
        .or_else(|| {
            let with_year = format!("{} {}", normalized, now.year());
            YEARLESS_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(&with_year, &format!("{fmt} %Y")).ok()
            })
        });

    if parsed.is_none() {
        debug!(text = %raw, normalized = %normalized, "Unparseable date text");
    }
    parsed
}

/// Strip one trailing time-zone abbreviation (`ET`, `PST`, ...) and any
/// whitespace or parentheses left around it.
pub fn strip_timezone(text: &str) -> &str {
    let trimmed = text.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
    for tz in TIME_ZONES {
        if let Some(rest) = trimmed.strip_suffix(tz) {
            let boundary = rest
                .chars()
                .last()
                .is_none_or(|c| !c.is_ascii_alphanumeric());
            if boundary {
                return rest.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
            }
        }
    }
    trimmed
}

fn normalize(text: &str) -> String {
    let text = strip_timezone(text);
    let text = TRAILING_TIME.replace(text, "");
    let text = TRAILING_HOUR.replace(&text, "");
    let text = LEADING_WEEKDAY.replace(&text, "");
    let text = ORDINAL.replace_all(&text, "$1");
    let text = SEPT.replace_all(&text, "Sep");
    let text = ABBREV_PERIOD.replace_all(&text, "$1");
    text.replace(',', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_relative(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    match lower.as_str() {
        "today" | "just now" | "now" => return Some(now.date()),
        "yesterday" => return Some(now.date() - Duration::days(1)),
        _ => {}
    }

    let caps = RELATIVE.captures(&lower)?;
    let amount: i64 = match &caps[1] {
        "a" | "an" | "one" => 1,
        n => n.parse().ok()?,
    };
    // Out-of-range amounts are absent, not a panic.
    let delta = match &caps[2] {
        "second" | "sec" => Duration::try_seconds(amount),
        "minute" | "min" => Duration::try_minutes(amount),
        "hour" | "hr" => Duration::try_hours(amount),
        "day" => Duration::try_days(amount),
        "week" => Duration::try_weeks(amount),
        _ => None,
    }?;
    now.checked_sub_signed(delta)
        .map(|dt| dt.date())
        .filter(plausible)
}

fn plausible(date: &NaiveDate) -> bool {
    (1900..=2100).contains(&date.year())
}
