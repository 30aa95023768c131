//! Temporal parsing, comparison, and calendar arithmetic.
//!
//! Parses the bodies of `@` literals and FHIR wire strings into typed
//! date/time values with precision, compares them under the partial-date
//! rules (a prefix match across different precisions is indeterminate), and
//! implements date/time plus calendar-quantity arithmetic.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::value::{DatePrecision, DateTimePrecision, TimePrecision, Value, ValueData};

fn digits(s: &str, len: usize) -> Option<u32> {
    if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`.
pub(crate) fn parse_date(s: &str) -> Option<(NaiveDate, DatePrecision)> {
    let parts: Vec<&str> = s.split('-').collect();
    let (y, m, d, precision) = match parts.as_slice() {
        [y] => (digits(y, 4)?, 1, 1, DatePrecision::Year),
        [y, m] => (digits(y, 4)?, digits(m, 2)?, 1, DatePrecision::Month),
        [y, m, d] => (digits(y, 4)?, digits(m, 2)?, digits(d, 2)?, DatePrecision::Day),
        _ => return None,
    };
    let date = NaiveDate::from_ymd_opt(y as i32, m, d)?;
    Some((date, precision))
}

/// `HH`, `HH:MM`, `HH:MM:SS`, or `HH:MM:SS.fff`.
pub(crate) fn parse_time(s: &str) -> Option<(NaiveTime, TimePrecision)> {
    let (hms, fraction) = match s.split_once('.') {
        Some((hms, fraction)) => (hms, Some(fraction)),
        None => (s, None),
    };
    let parts: Vec<&str> = hms.split(':').collect();
    let (h, m, sec, mut precision) = match parts.as_slice() {
        [h] => (digits(h, 2)?, 0, 0, TimePrecision::Hour),
        [h, m] => (digits(h, 2)?, digits(m, 2)?, 0, TimePrecision::Minute),
        [h, m, s] => (
            digits(h, 2)?,
            digits(m, 2)?,
            digits(s, 2)?,
            TimePrecision::Second,
        ),
        _ => return None,
    };
    let milli = match fraction {
        Some(f) => {
            if precision != TimePrecision::Second
                || f.is_empty()
                || !f.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            precision = TimePrecision::Millisecond;
            let padded = format!("{f:0<3}");
            padded[..3].parse::<u32>().ok()?
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_milli_opt(h, m, sec, milli)?;
    Some((time, precision))
}

/// A date, `T`, and an optional time with optional timezone offset.
pub(crate) fn parse_datetime(s: &str) -> Option<(DateTime<Utc>, DateTimePrecision, Option<i32>)> {
    let (date_part, rest) = s.split_once('T')?;
    let (date, date_precision) = parse_date(date_part)?;
    if rest.is_empty() {
        let precision = match date_precision {
            DatePrecision::Year => DateTimePrecision::Year,
            DatePrecision::Month => DateTimePrecision::Month,
            DatePrecision::Day => DateTimePrecision::Day,
        };
        let value = DateTime::from_naive_utc_and_offset(
            date.and_time(NaiveTime::MIN),
            Utc,
        );
        return Some((value, precision, None));
    }
    // A time requires a complete date.
    if date_precision != DatePrecision::Day {
        return None;
    }
    let (time_part, offset) = split_offset(rest)?;
    let (time, time_precision) = parse_time(time_part)?;
    let precision = match time_precision {
        TimePrecision::Hour => DateTimePrecision::Hour,
        TimePrecision::Minute => DateTimePrecision::Minute,
        TimePrecision::Second => DateTimePrecision::Second,
        TimePrecision::Millisecond => DateTimePrecision::Millisecond,
    };
    let naive = date.and_time(time);
    let shifted = match offset {
        Some(seconds) => naive - Duration::seconds(seconds as i64),
        None => naive,
    };
    Some((
        DateTime::from_naive_utc_and_offset(shifted, Utc),
        precision,
        offset,
    ))
}

/// Splits a trailing `Z` or `±HH:MM` off a time body.
fn split_offset(s: &str) -> Option<(&str, Option<i32>)> {
    if let Some(body) = s.strip_suffix('Z') {
        return Some((body, Some(0)));
    }
    for (idx, c) in s.char_indices() {
        if c == '+' || (c == '-' && idx > 0) {
            let (body, tz) = s.split_at(idx);
            let sign: i32 = if c == '+' { 1 } else { -1 };
            let (h, m) = tz[1..].split_once(':')?;
            let hours = digits(h, 2)?;
            let minutes = digits(m, 2)?;
            if hours > 14 || minutes > 59 {
                return None;
            }
            return Some((body, Some(sign * (hours as i32 * 3600 + minutes as i32 * 60))));
        }
    }
    Some((s, None))
}

/// Interprets a FHIR wire string as a temporal value, for comparisons
/// against typed dates and times.
pub(crate) fn parse_string_temporal(s: &str) -> Option<Value> {
    if s.contains('T') {
        let (value, precision, offset) = parse_datetime(s)?;
        Some(Value::datetime(value, precision, offset))
    } else if s.contains(':') {
        let (time, precision) = parse_time(s)?;
        Some(Value::time(time, precision))
    } else {
        let (date, precision) = parse_date(s)?;
        Some(Value::date(date, precision))
    }
}

fn date_rank(p: DatePrecision) -> usize {
    match p {
        DatePrecision::Year => 1,
        DatePrecision::Month => 2,
        DatePrecision::Day => 3,
    }
}

fn datetime_rank(p: DateTimePrecision) -> usize {
    match p {
        DateTimePrecision::Year => 1,
        DateTimePrecision::Month => 2,
        DateTimePrecision::Day => 3,
        DateTimePrecision::Hour => 4,
        DateTimePrecision::Minute => 5,
        DateTimePrecision::Second => 6,
        DateTimePrecision::Millisecond => 7,
    }
}

fn time_rank(p: TimePrecision) -> usize {
    match p {
        TimePrecision::Hour => 1,
        TimePrecision::Minute => 2,
        TimePrecision::Second => 3,
        TimePrecision::Millisecond => 4,
    }
}

pub(crate) fn compare_dates(
    a: NaiveDate,
    pa: DatePrecision,
    b: NaiveDate,
    pb: DatePrecision,
) -> Option<Ordering> {
    let fa = [a.year() as u32, a.month(), a.day()];
    let fb = [b.year() as u32, b.month(), b.day()];
    compare_ranked(&fa, &fb, date_rank(pa), date_rank(pb), false)
}

pub(crate) fn compare_datetimes(
    a: DateTime<Utc>,
    pa: DateTimePrecision,
    b: DateTime<Utc>,
    pb: DateTimePrecision,
) -> Option<Ordering> {
    let fa = [
        a.year() as u32,
        a.month(),
        a.day(),
        a.hour(),
        a.minute(),
        a.second(),
        a.timestamp_subsec_millis(),
    ];
    let fb = [
        b.year() as u32,
        b.month(),
        b.day(),
        b.hour(),
        b.minute(),
        b.second(),
        b.timestamp_subsec_millis(),
    ];
    let compatible = pa.compatible(pb);
    compare_ranked(&fa, &fb, datetime_rank(pa), datetime_rank(pb), compatible)
}

pub(crate) fn compare_times(
    a: NaiveTime,
    pa: TimePrecision,
    b: NaiveTime,
    pb: TimePrecision,
) -> Option<Ordering> {
    let fa = [a.hour(), a.minute(), a.second(), a.nanosecond() / 1_000_000];
    let fb = [b.hour(), b.minute(), b.second(), b.nanosecond() / 1_000_000];
    let compatible = pa.compatible(pb);
    compare_ranked(&fa, &fb, time_rank(pa), time_rank(pb), compatible)
}

/// Compares up to the shared rank; `seconds_compatible` widens the shared
/// rank to the full field list (seconds and milliseconds are one precision).
fn compare_ranked(
    a: &[u32],
    b: &[u32],
    rank_a: usize,
    rank_b: usize,
    seconds_compatible: bool,
) -> Option<Ordering> {
    let shared = if seconds_compatible {
        a.len()
    } else {
        rank_a.min(rank_b)
    };
    for i in 0..shared {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            other => return Some(other),
        }
    }
    if rank_a == rank_b || seconds_compatible {
        Some(Ordering::Equal)
    } else {
        None
    }
}

/// Temporal equivalence: differing precision is a definite `false`, not
/// indeterminate.
pub(crate) fn ordering_to_equivalence(ordering: Option<Ordering>) -> bool {
    matches!(ordering, Some(Ordering::Equal))
}

// ---------------------------------------------------------------------------
// Calendar units and quantity bridging

/// Calendar duration keywords usable as quantity units.
pub(crate) fn is_calendar_unit(unit: &str) -> bool {
    calendar_base(unit).is_some()
}

fn calendar_base(unit: &str) -> Option<&'static str> {
    Some(match unit {
        "year" | "years" => "year",
        "month" | "months" => "month",
        "week" | "weeks" => "week",
        "day" | "days" => "day",
        "hour" | "hours" => "hour",
        "minute" | "minutes" => "minute",
        "second" | "seconds" => "second",
        "millisecond" | "milliseconds" => "millisecond",
        _ => return None,
    })
}

/// Seconds per unit for units of definite duration (calendar `week` and
/// below, UCUM `wk` and below). Calendar years and months have no definite
/// length and are excluded.
pub(crate) fn definite_seconds(unit: &str) -> Option<Decimal> {
    let base = calendar_base(unit).unwrap_or(unit);
    Some(match base {
        "week" | "wk" => Decimal::from(604_800),
        "day" | "d" => Decimal::from(86_400),
        "hour" | "h" => Decimal::from(3_600),
        "minute" | "min" => Decimal::from(60),
        "second" | "s" => Decimal::ONE,
        "millisecond" | "ms" => Decimal::new(1, 3),
        _ => return None,
    })
}

/// Unit identity for equivalence: calendar keywords and their UCUM
/// counterparts collapse to one name (`years` ~ `'a'`, `month` ~ `'mo'`).
pub(crate) fn equivalence_unit(unit: &str) -> String {
    match calendar_base(unit).unwrap_or(unit) {
        "year" | "a" => "year".to_string(),
        "month" | "mo" => "month".to_string(),
        "week" | "wk" => "week".to_string(),
        "day" | "d" => "day".to_string(),
        "hour" | "h" => "hour".to_string(),
        "minute" | "min" => "minute".to_string(),
        "second" | "s" => "second".to_string(),
        "millisecond" | "ms" => "millisecond".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Arithmetic

fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|&d| NaiveDate::from_ymd_opt(year, month, d).is_some())
        .unwrap_or(28)
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whole units of a quantity value, truncated toward zero.
pub(crate) fn whole_units(value: Decimal) -> Option<i64> {
    value.trunc().to_i64()
}

/// Date plus a calendar quantity. Units finer than a day are below the
/// value's resolution and leave it unchanged; non-calendar units are `None`.
pub(crate) fn add_to_date(
    date: NaiveDate,
    precision: DatePrecision,
    amount: i64,
    unit: &str,
) -> Option<(NaiveDate, DatePrecision)> {
    let shifted = match calendar_base(unit)? {
        "year" => shift_months(date, amount.checked_mul(12)?)?,
        "month" => shift_months(date, amount)?,
        "week" => date.checked_add_signed(Duration::weeks(amount))?,
        "day" => date.checked_add_signed(Duration::days(amount))?,
        _ => date,
    };
    Some((shifted, precision))
}

pub(crate) fn add_to_datetime(
    value: DateTime<Utc>,
    amount: i64,
    unit: &str,
) -> Option<DateTime<Utc>> {
    match calendar_base(unit)? {
        "year" => {
            let date = shift_months(value.date_naive(), amount.checked_mul(12)?)?;
            Some(DateTime::from_naive_utc_and_offset(
                date.and_time(value.time()),
                Utc,
            ))
        }
        "month" => {
            let date = shift_months(value.date_naive(), amount)?;
            Some(DateTime::from_naive_utc_and_offset(
                date.and_time(value.time()),
                Utc,
            ))
        }
        "week" => value.checked_add_signed(Duration::weeks(amount)),
        "day" => value.checked_add_signed(Duration::days(amount)),
        "hour" => value.checked_add_signed(Duration::hours(amount)),
        "minute" => value.checked_add_signed(Duration::minutes(amount)),
        "second" => value.checked_add_signed(Duration::seconds(amount)),
        "millisecond" => value.checked_add_signed(Duration::milliseconds(amount)),
        _ => None,
    }
}

/// Time plus a quantity, wrapping around midnight.
pub(crate) fn add_to_time(time: NaiveTime, amount: i64, unit: &str) -> Option<NaiveTime> {
    let duration = match calendar_base(unit)? {
        "hour" => Duration::hours(amount),
        "minute" => Duration::minutes(amount),
        "second" => Duration::seconds(amount),
        "millisecond" => Duration::milliseconds(amount),
        _ => return None,
    };
    Some(time.overflowing_add_signed(duration).0)
}

// ---------------------------------------------------------------------------
// Rendering

pub(crate) fn render_date(date: NaiveDate, precision: DatePrecision) -> String {
    match precision {
        DatePrecision::Year => format!("{:04}", date.year()),
        DatePrecision::Month => format!("{:04}-{:02}", date.year(), date.month()),
        DatePrecision::Day => format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()),
    }
}

pub(crate) fn render_time(time: NaiveTime, precision: TimePrecision) -> String {
    match precision {
        TimePrecision::Hour => format!("{:02}", time.hour()),
        TimePrecision::Minute => format!("{:02}:{:02}", time.hour(), time.minute()),
        TimePrecision::Second => format!(
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        ),
        TimePrecision::Millisecond => format!(
            "{:02}:{:02}:{:02}.{:03}",
            time.hour(),
            time.minute(),
            time.second(),
            time.nanosecond() / 1_000_000
        ),
    }
}

pub(crate) fn render_datetime(
    value: DateTime<Utc>,
    precision: DateTimePrecision,
    offset: Option<i32>,
) -> String {
    let shifted = match offset {
        Some(seconds) => value.naive_utc() + Duration::seconds(seconds as i64),
        None => value.naive_utc(),
    };
    let date_precision = match precision {
        DateTimePrecision::Year => DatePrecision::Year,
        DateTimePrecision::Month => DatePrecision::Month,
        _ => DatePrecision::Day,
    };
    let mut out = render_date(shifted.date(), date_precision);
    let time_precision = match precision {
        DateTimePrecision::Hour => TimePrecision::Hour,
        DateTimePrecision::Minute => TimePrecision::Minute,
        DateTimePrecision::Second => TimePrecision::Second,
        DateTimePrecision::Millisecond => TimePrecision::Millisecond,
        _ => return out,
    };
    out.push('T');
    out.push_str(&render_time(shifted.time(), time_precision));
    match offset {
        Some(0) => out.push('Z'),
        Some(seconds) => {
            let sign = if seconds < 0 { '-' } else { '+' };
            let abs = seconds.unsigned_abs();
            out.push_str(&format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60));
        }
        None => {}
    }
    out
}

/// Comparable key for a value that may be a wire string: promotes strings
/// to the temporal kind of `other` when both sides can agree.
pub(crate) fn promote_string(value: &Value, other: &Value) -> Option<Value> {
    match (value.data(), other.data()) {
        (ValueData::String(s), ValueData::Date(..))
        | (ValueData::String(s), ValueData::DateTime { .. })
        | (ValueData::String(s), ValueData::Time(..)) => parse_string_temporal(s),
        _ => None,
    }
}
