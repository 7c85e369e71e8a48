//! Display formatting for dates and resource types.
//!
//! The backend speaks zone-less local date-times, so everything here works on
//! `NaiveDateTime` and never converts between zones.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Wire format for date-times sent to the backend.
const API_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Known resource types: (backend name, emoji, label).
const RESOURCE_TYPE_LABELS: [(&str, &str, &str); 6] = [
    ("ROOM", "🏠", "Room"),
    ("CONFERENCE_ROOM", "🏢", "Conference Room"),
    ("SHARED_TECH_EQUIPMENT", "💻", "Shared Tech Equipment"),
    ("BILL_COUNTING_MACHINE", "💵", "Bill Counting Machine"),
    ("VIP_ROOM", "⭐", "VIP Room"),
    ("CORPORATE_VEHICLE", "🚗", "Corporate Vehicle"),
];

const FALLBACK_EMOJI: &str = "📦";

/// Parse a backend date-time.
///
/// Accepts the zone-less form (`2026-02-12T09:00:00`, optional fraction) and,
/// for robustness, RFC 3339 with an offset, converted to local time.
///
/// # Errors
///
/// Returns the zone-less parse error when neither form matches.
pub fn parse_api_date_time(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let value = value.trim();
    value.parse::<NaiveDateTime>().or_else(|naive_err| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Local).naive_local())
            .map_err(|_| naive_err)
    })
}

/// `2026-02-12T09:00:00` → `2026-02-12T09:00:00` (seconds precision, no zone).
#[must_use]
pub fn to_api_date_time(value: NaiveDateTime) -> String {
    value.format(API_DATE_TIME_FORMAT).to_string()
}

/// `Feb 12, 2026`
#[must_use]
pub fn format_date(value: NaiveDateTime) -> String {
    value.format("%b %-d, %Y").to_string()
}

/// `9:00 AM`
#[must_use]
pub fn format_time(value: NaiveDateTime) -> String {
    value.format("%-I:%M %p").to_string()
}

/// `Feb 12, 2026 · 9:00 AM`
#[must_use]
pub fn format_date_time(value: NaiveDateTime) -> String {
    format!("{} · {}", format_date(value), format_time(value))
}

/// Same day: `Feb 12, 2026 · 9:00 AM – 10:00 AM`.
/// Otherwise: `Feb 12, 2026 · 9:00 AM – Feb 13, 2026 · 10:00 AM`.
#[must_use]
pub fn format_date_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    if start.date() == end.date() {
        format!(
            "{} · {} – {}",
            format_date(start),
            format_time(start),
            format_time(end)
        )
    } else {
        format!("{} – {}", format_date_time(start), format_date_time(end))
    }
}

/// Midnight at the start of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// `23:59:59` on `date`.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| start_of_day(date))
}

/// Shift by whole days; `None` on calendar overflow.
#[must_use]
pub fn add_days(value: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        value.checked_add_days(magnitude)
    } else {
        value.checked_sub_days(magnitude)
    }
}

/// Emoji and label for a resource type name.
///
/// Unknown names are SNAKE_CASE-to-Title-Cased with a generic emoji.
#[must_use]
pub fn format_resource_type(name: &str) -> String {
    match RESOURCE_TYPE_LABELS
        .iter()
        .find(|(known, _, _)| *known == name)
    {
        Some((_, emoji, label)) => format!("{emoji} {label}"),
        None => format!("{FALLBACK_EMOJI} {}", title_case(name)),
    }
}

/// Emoji for a resource type name.
#[must_use]
pub fn resource_type_emoji(name: &str) -> &'static str {
    RESOURCE_TYPE_LABELS
        .iter()
        .find(|(known, _, _)| *known == name)
        .map_or(FALLBACK_EMOJI, |(_, emoji, _)| *emoji)
}

fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.to_lowercase().replace('_', " ").chars() {
        if at_word_start && ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    out
}
