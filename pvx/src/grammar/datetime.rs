//! Date-time clause parsing.
//!
//! A clause is either an absolute literal (`2024-01-01 10:00`, `20240101T1000Z`,
//! `10:00`) or `-` followed by an elapsed-time literal (`-1:00:00`, `-2 12:00`,
//! `-PT90M`), which resolves to the captured "now" minus that duration.

use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};

use super::cursor::TokenCursor;
use crate::error::GrammarError;

/// Zone applied to literals that do not carry a designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The system time zone, with its daylight-saving rules.
    Local,
    Fixed(FixedOffset),
}

/// Instant and zone shared by every clause of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    /// Captured once; all relative clauses subtract from it.
    pub now: DateTime<Utc>,
    pub zone: Zone,
}

impl ParseContext {
    pub fn new(now: DateTime<Utc>, zone: Zone) -> Self {
        Self { now, zone }
    }

    /// Context interpreting bare literals as UTC.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Zone::Fixed(utc_offset()))
    }

    /// Capture the current instant; bare literals use the system zone.
    pub fn local() -> Self {
        Self::new(Utc::now(), Zone::Local)
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse the date-time clause following `keyword`.
///
/// Absorbs one extra token when the next one does not look like a keyword,
/// so that `2024-01-01 10:00` may be written as two arguments.
pub fn parse_clause(
    cursor: &mut TokenCursor,
    keyword: &str,
    ctx: &ParseContext,
) -> Result<DateTime<Utc>, GrammarError> {
    let mut literal = cursor.next(keyword)?;
    if !cursor.is_empty() && !cursor.peek_is_word() {
        literal.push(' ');
        literal.push_str(&cursor.next(keyword)?);
    }

    let resolved = match literal.strip_prefix('-') {
        Some(elapsed) => {
            parse_elapsed(elapsed).and_then(|d| ctx.now.checked_sub_signed(d))
        }
        None => parse_date_time(&literal, ctx),
    };

    resolved.ok_or_else(|| {
        GrammarError::Syntax(format!("invalid date-time '{}' after {}", literal, keyword))
    })
}

/// Parse an absolute date-time literal.
pub fn parse_date_time(literal: &str, ctx: &ParseContext) -> Option<DateTime<Utc>> {
    let literal = literal.trim();
    if literal.is_empty() {
        return None;
    }

    let (body, designator) = split_zone(literal);
    let body = normalize_separator(body);
    let zone = designator.map_or(ctx.zone, Zone::Fixed);

    match zone {
        Zone::Fixed(offset) => {
            let today = ctx.now.with_timezone(&offset).date_naive();
            let naive = parse_naive(&body, today)?;
            offset.from_local_datetime(&naive).single().map(|dt| dt.with_timezone(&Utc))
        }
        Zone::Local => {
            let today = ctx.now.with_timezone(&Local).date_naive();
            let naive = parse_naive(&body, today)?;
            // Ambiguous wall-clock times resolve to the first occurrence.
            Local.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc))
        }
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%d %H%M%S",
    "%Y%m%d %H%M%S%.f",
    "%Y%m%d %H%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

fn parse_naive(body: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(body, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(body, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    if let Some(dt) = parse_date_hour(body) {
        return Some(dt);
    }

    // Time of day alone refers to today.
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(body, format) {
            return Some(today.and_time(time));
        }
    }

    None
}

/// A date followed by an hour only, e.g. `2015-01-01 10`.
fn parse_date_hour(body: &str) -> Option<NaiveDateTime> {
    let (date, hour) = body.split_once(' ')?;
    if hour.is_empty() || hour.len() > 2 || !is_digits(hour) {
        return None;
    }
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())?;
    date.and_hms_opt(hour.parse().ok()?, 0, 0)
}

/// Split a trailing `Z` or `±HH[[:]MM]` zone designator from a literal.
fn split_zone(literal: &str) -> (&str, Option<FixedOffset>) {
    if let Some(body) = literal
        .strip_suffix('Z')
        .or_else(|| literal.strip_suffix('z'))
    {
        return (body, Some(utc_offset()));
    }

    let Some(sign_at) = literal.rfind(['+', '-']) else {
        return (literal, None);
    };
    let (body, designator) = literal.split_at(sign_at);

    // A zone only follows a time of day; "2024-01-01" has no zone.
    let has_time = body.contains(':') || body.contains(['T', 't', '_', ' ']);
    if !has_time {
        return (literal, None);
    }

    match parse_offset(designator) {
        Some(offset) => (body.trim_end(), Some(offset)),
        None => (literal, None),
    }
}

fn parse_offset(designator: &str) -> Option<FixedOffset> {
    let mut chars = designator.chars();
    let sign = match chars.next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = chars.filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3_600 + minutes * 60))
}

/// Turn `T` or `_` between date and time into a single space.
fn normalize_separator(body: &str) -> String {
    let replaced: String = match body.find(['T', 't', '_']) {
        Some(at) => {
            let mut s = String::with_capacity(body.len());
            s.push_str(&body[..at]);
            s.push(' ');
            s.push_str(&body[at + 1..]);
            s
        }
        None => body.to_string(),
    };
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an elapsed-time literal into a duration.
///
/// Accepted forms:
/// - `[D<sep>]H:M[:S[.fraction]]` where `<sep>` is `T`, `_`, `-` or spaces
/// - `S.fraction` (seconds)
/// - `P[nD][T][nH][nM][n[.f]S]` and `Pn` (days)
/// - a bare integer, taken as milliseconds
pub fn parse_elapsed(literal: &str) -> Option<Duration> {
    let literal = literal.trim();
    if literal.is_empty() {
        return None;
    }

    if let Some(rest) = literal.strip_prefix(['P', 'p']) {
        if rest.contains(':') {
            return parse_clock_with_days(rest);
        }
        if is_digits(rest) {
            return days(rest.parse().ok()?);
        }
        return parse_designators(rest);
    }

    if is_digits(literal) {
        return Some(Duration::milliseconds(literal.parse().ok()?));
    }

    if !literal.contains(':') {
        let (seconds, fraction) = literal.split_once('.')?;
        if !is_digits(seconds) || !is_digits(fraction) {
            return None;
        }
        return seconds_and_fraction(seconds.parse().ok()?, fraction);
    }

    parse_clock_with_days(literal)
}

fn parse_clock_with_days(literal: &str) -> Option<Duration> {
    let (day_part, clock) = match literal.find(['T', 't', '_', '-', ' ']) {
        Some(at) => {
            let clock = literal[at..].trim_start_matches(['T', 't', '_', '-', ' ']);
            (Some(&literal[..at]), clock)
        }
        None => (None, literal),
    };

    let mut total = match day_part {
        Some(d) if is_digits(d) => days(d.parse().ok()?)?,
        Some(_) => return None,
        None => Duration::zero(),
    };

    if clock.is_empty() {
        return day_part.map(|_| total);
    }

    let fields: Vec<&str> = clock.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return None;
    }
    if !is_digits(fields[0]) || !is_digits(fields[1]) {
        return None;
    }
    total = total.checked_add(&Duration::try_hours(fields[0].parse().ok()?)?)?;
    total = total.checked_add(&Duration::try_minutes(fields[1].parse().ok()?)?)?;

    if let Some(&seconds) = fields.get(2) {
        let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
        if !is_digits(whole) || !(fraction.is_empty() || is_digits(fraction)) {
            return None;
        }
        total = total.checked_add(&seconds_and_fraction(whole.parse().ok()?, fraction)?)?;
    }

    Some(total)
}

/// ISO-8601 style designators after the leading `P`.
fn parse_designators(rest: &str) -> Option<Duration> {
    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut seen_any = false;

    for c in rest.chars() {
        match c.to_ascii_uppercase() {
            d if d.is_ascii_digit() || d == '.' => number.push(d),
            'T' if number.is_empty() && !in_time => in_time = true,
            'D' if !in_time => {
                total = total.checked_add(&days(number.parse().ok()?)?)?;
                number.clear();
                seen_any = true;
            }
            'H' if in_time => {
                total = total.checked_add(&Duration::try_hours(number.parse().ok()?)?)?;
                number.clear();
                seen_any = true;
            }
            'M' if in_time => {
                total = total.checked_add(&Duration::try_minutes(number.parse().ok()?)?)?;
                number.clear();
                seen_any = true;
            }
            'S' if in_time => {
                let (whole, fraction) = number.split_once('.').unwrap_or((number.as_str(), ""));
                total = total.checked_add(&seconds_and_fraction(whole.parse().ok()?, fraction)?)?;
                number.clear();
                seen_any = true;
            }
            _ => return None,
        }
    }

    (seen_any && number.is_empty()).then_some(total)
}

fn days(n: i64) -> Option<Duration> {
    Duration::try_days(n)
}

fn seconds_and_fraction(seconds: i64, fraction: &str) -> Option<Duration> {
    let mut nanos = String::from(fraction);
    nanos.truncate(9);
    while nanos.len() < 9 {
        nanos.push('0');
    }
    let nanos: i64 = nanos.parse().ok()?;
    Duration::try_seconds(seconds)?.checked_add(&Duration::nanoseconds(nanos))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
