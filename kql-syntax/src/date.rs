//! Date handling for restriction values: absolute literals and the
//! natural-language ranges (`today`, `last week`, ...) resolved against a
//! [`Clock`].

use crate::{
    clock::Clock,
    error::{Error, Result},
};
use jiff::{
    Timestamp, Zoned,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use std::{fmt, str::FromStr};

/// Calendar view of "now" shared by every date computed during one parse.
#[derive(Debug, Clone)]
pub struct DateContext {
    tz: TimeZone,
    today: Date,
}

impl DateContext {
    pub fn capture(clock: &dyn Clock) -> Self {
        Self::from_zoned(&clock.now())
    }

    pub fn from_zoned(now: &Zoned) -> Self {
        Self {
            tz: now.time_zone().clone(),
            today: now.date(),
        }
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.tz
    }

    pub fn today(&self) -> Date {
        self.today
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeRange {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    Last7Days,
    ThisMonth,
    LastMonth,
    Last30Days,
    ThisYear,
    LastYear,
}

impl RelativeRange {
    pub const ALL: [RelativeRange; 10] = [
        RelativeRange::Today,
        RelativeRange::Yesterday,
        RelativeRange::ThisWeek,
        RelativeRange::LastWeek,
        RelativeRange::Last7Days,
        RelativeRange::ThisMonth,
        RelativeRange::LastMonth,
        RelativeRange::Last30Days,
        RelativeRange::ThisYear,
        RelativeRange::LastYear,
    ];

    pub fn phrase(self) -> &'static str {
        match self {
            RelativeRange::Today => "today",
            RelativeRange::Yesterday => "yesterday",
            RelativeRange::ThisWeek => "this week",
            RelativeRange::LastWeek => "last week",
            RelativeRange::Last7Days => "last 7 days",
            RelativeRange::ThisMonth => "this month",
            RelativeRange::LastMonth => "last month",
            RelativeRange::Last30Days => "last 30 days",
            RelativeRange::ThisYear => "this year",
            RelativeRange::LastYear => "last year",
        }
    }

    /// Case-insensitive lookup; runs of whitespace inside the phrase count as
    /// one space.
    pub fn from_phrase(raw: &str) -> Option<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|range| range.phrase().eq_ignore_ascii_case(&normalized))
    }

    /// Inclusive `[from, to]` bounds of the range, whole days in the
    /// context's time zone.
    pub fn resolve(self, context: &DateContext) -> Result<(Timestamp, Timestamp)> {
        self.dates(context)
            .and_then(|(start, end)| range_from_dates(start, end, context))
            .ok_or_else(|| Error::UnsupportedTimeRange {
                value: self.phrase().to_string(),
            })
    }

    fn dates(self, context: &DateContext) -> Option<(Date, Date)> {
        let today = context.today;
        let year = today.year();
        let month = today.month();
        match self {
            RelativeRange::Today => Some((today, today)),
            RelativeRange::Yesterday => {
                let date = today.yesterday().ok()?;
                Some((date, date))
            }
            RelativeRange::ThisWeek => {
                let start = shift_days(today, -week_offset(today))?;
                Some((start, shift_days(start, 6)?))
            }
            RelativeRange::LastWeek => {
                let start = shift_days(today, -(week_offset(today) + 7))?;
                Some((start, shift_days(start, 6)?))
            }
            RelativeRange::Last7Days => Some((shift_days(today, -6)?, today)),
            RelativeRange::ThisMonth => month_dates(year, month),
            RelativeRange::LastMonth => {
                let (year, month) = if month == 1 {
                    (year.checked_sub(1)?, 12)
                } else {
                    (year, month - 1)
                };
                month_dates(year, month)
            }
            RelativeRange::Last30Days => Some((shift_days(today, -29)?, today)),
            RelativeRange::ThisYear => year_dates(year),
            RelativeRange::LastYear => year_dates(year.checked_sub(1)?),
        }
    }
}

impl fmt::Display for RelativeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

impl FromStr for RelativeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_phrase(s).ok_or_else(|| Error::UnsupportedTimeRange {
            value: s.to_string(),
        })
    }
}

/// Resolves a natural-language phrase to inclusive bounds relative to `now`.
pub fn resolve_relative_range(token: &str, now: &Zoned) -> Result<(Timestamp, Timestamp)> {
    let range: RelativeRange = token.parse()?;
    range.resolve(&DateContext::from_zoned(now))
}

// Weeks start on Monday.
fn week_offset(date: Date) -> i64 {
    i64::from(date.weekday().to_monday_zero_offset())
}

fn month_dates(year: i16, month: i8) -> Option<(Date, Date)> {
    let start = Date::new(year, month, 1).ok()?;
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let end = Date::new(next_year, next_month, 1).ok()?.yesterday().ok()?;
    Some((start, end))
}

fn year_dates(year: i16) -> Option<(Date, Date)> {
    Some((Date::new(year, 1, 1).ok()?, Date::new(year, 12, 31).ok()?))
}

fn range_from_dates(start: Date, end: Date, context: &DateContext) -> Option<(Timestamp, Timestamp)> {
    if end < start {
        return None;
    }
    let (from, _) = day_bounds(start, context)?;
    let (_, to) = day_bounds(end, context)?;
    Some((from, to))
}

fn shift_days(date: Date, delta: i64) -> Option<Date> {
    let mut current = date;
    for _ in 0..delta.unsigned_abs() {
        current = if delta > 0 {
            current.tomorrow().ok()?
        } else {
            current.yesterday().ok()?
        };
    }
    Some(current)
}

/// First and last representable instant of `date` in the context's zone.
fn day_bounds(date: Date, context: &DateContext) -> Option<(Timestamp, Timestamp)> {
    let start = context.tz.to_zoned(date.at(0, 0, 0, 0)).ok()?.timestamp();
    let end = context
        .tz
        .to_zoned(date.at(23, 59, 59, 999_999_999))
        .ok()?
        .timestamp();
    Some((start, end))
}

/// Parses an absolute date literal. `Ok(None)` means the value is not shaped
/// like a date at all; a value that looks like one but does not parse is an
/// error.
///
/// Accepted forms: RFC 3339 with offset, date-time without offset (read in the
/// context's zone), `YYYY-MM-DD`, `YYYY-MM`, and `YYYY` when `allow_year` is
/// set.
pub(crate) fn parse_date_literal(
    raw: &str,
    allow_year: bool,
    context: &DateContext,
) -> std::result::Result<Option<Timestamp>, String> {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    let year_digits = bytes.len() >= 4 && bytes[..4].iter().all(u8::is_ascii_digit);
    if !year_digits {
        return Ok(None);
    }
    if bytes.len() == 4 {
        if !allow_year {
            return Ok(None);
        }
        return Ok(year_start(trimmed, context));
    }
    let month_digits = bytes.len() >= 7 && bytes[5..7].iter().all(u8::is_ascii_digit);
    if bytes[4] != b'-' || !month_digits {
        return Ok(None);
    }
    // `2023-09-05_report.pdf` is a name, not a broken date.
    if !trimmed.chars().all(is_date_char) {
        return Ok(None);
    }

    if let Ok(ts) = trimmed.parse::<Timestamp>() {
        return Ok(Some(ts));
    }
    // jiff wants the `T` separator.
    let spaced = trimmed.replacen(' ', "T", 1);
    if spaced.contains('T') {
        if let Ok(datetime) = spaced.parse::<DateTime>() {
            return context
                .tz
                .to_zoned(datetime)
                .map(|zoned| Some(zoned.timestamp()))
                .map_err(|err| err.to_string());
        }
        return Err(format!("malformed date literal '{trimmed}'"));
    }
    if let Ok(date) = trimmed.parse::<Date>() {
        return day_bounds(date, context)
            .map(|(start, _)| Some(start))
            .ok_or_else(|| format!("date '{trimmed}' is out of range"));
    }
    if let Some(ts) = month_start(trimmed, context) {
        return Ok(Some(ts));
    }
    Err(format!("malformed date literal '{trimmed}'"))
}

fn is_date_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '-' | ':' | '.' | '+' | ' ' | 'T' | 't' | 'Z' | 'z')
}

/// Bare years outside this window are plain numbers (`size>1000`).
const YEAR_LITERALS: std::ops::RangeInclusive<i16> = 1900..=2199;

fn year_start(raw: &str, context: &DateContext) -> Option<Timestamp> {
    let year: i16 = raw.parse().ok()?;
    if !YEAR_LITERALS.contains(&year) {
        return None;
    }
    let (start, _) = year_dates(year)?;
    day_bounds(start, context).map(|(from, _)| from)
}

fn month_start(raw: &str, context: &DateContext) -> Option<Timestamp> {
    let (year, month) = raw.split_once('-')?;
    if month.len() != 2 {
        return None;
    }
    let (start, _) = month_dates(year.parse().ok()?, month.parse().ok()?)?;
    day_bounds(start, context).map(|(from, _)| from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn context(y: i16, m: i8, d: i8) -> DateContext {
        let now = date(y, m, d).at(12, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap();
        DateContext::from_zoned(&now)
    }

    fn utc(y: i16, m: i8, d: i8) -> Timestamp {
        date(y, m, d).at(0, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap().timestamp()
    }

    #[test]
    fn phrases_ignore_case_and_spacing() {
        assert_eq!(RelativeRange::from_phrase("Last  Week"), Some(RelativeRange::LastWeek));
        assert_eq!(RelativeRange::from_phrase("TODAY"), Some(RelativeRange::Today));
        assert_eq!(RelativeRange::from_phrase("lastweek"), None);
    }

    #[test]
    fn shift_days_walks_both_directions() {
        let origin = date(2024, 3, 1);
        assert_eq!(shift_days(origin, -1), Some(date(2024, 2, 29)));
        assert_eq!(shift_days(origin, 31), Some(date(2024, 4, 1)));
        assert_eq!(shift_days(origin, 0), Some(origin));
    }

    #[test]
    fn date_literals_by_precision() {
        let ctx = context(2023, 9, 10);
        assert_eq!(
            parse_date_literal("2023-09-05", false, &ctx).unwrap(),
            Some(utc(2023, 9, 5))
        );
        assert_eq!(
            parse_date_literal("2023-09", false, &ctx).unwrap(),
            Some(utc(2023, 9, 1))
        );
        assert_eq!(
            parse_date_literal("2023", true, &ctx).unwrap(),
            Some(utc(2023, 1, 1))
        );
        assert_eq!(parse_date_literal("2023", false, &ctx).unwrap(), None);
    }

    #[test]
    fn offsetless_datetime_uses_context_zone() {
        let ctx = context(2023, 9, 10);
        let ts = parse_date_literal("2023-09-05T08:42:11", false, &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(ts, "2023-09-05T08:42:11Z".parse::<Timestamp>().unwrap());
    }

    #[test]
    fn non_dates_are_not_literals() {
        let ctx = context(2023, 9, 10);
        assert_eq!(parse_date_literal("1000pages", false, &ctx).unwrap(), None);
        assert_eq!(parse_date_literal("cat", true, &ctx).unwrap(), None);
        assert_eq!(parse_date_literal("12345678-ab", true, &ctx).unwrap(), None);
        assert_eq!(parse_date_literal("2023-report", false, &ctx).unwrap(), None);
        assert_eq!(
            parse_date_literal("2023-09-05_report.pdf", false, &ctx).unwrap(),
            None
        );
        assert_eq!(parse_date_literal("2023-09-notes", false, &ctx).unwrap(), None);
        assert_eq!(parse_date_literal("1000", true, &ctx).unwrap(), None);
    }

    #[test]
    fn date_shaped_garbage_is_rejected() {
        let ctx = context(2023, 9, 10);
        assert!(parse_date_literal("2023-13-45", false, &ctx).is_err());
        assert!(parse_date_literal("2023-09-05T99:00", false, &ctx).is_err());
    }
}
