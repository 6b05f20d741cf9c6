//! Calendar arithmetic for contribution periods.
//!
//! Two carry conventions live here and must not be unified:
//! [`diff`] borrows real month lengths, [`sum`] promotes every 30 days to a
//! month and every 12 months to a year.

use chrono::{Datelike, Months, NaiveDate};
use nom::{
    bytes::complete::{tag, take_while_m_n},
    combinator::{all_consuming, map_res},
    sequence::tuple,
    IResult,
};
use serde::Serialize;

/// Years, months and days of contribution time. Never negative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duration {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl Duration {
    pub fn new(years: u32, months: u32, days: u32) -> Self {
        Duration {
            years,
            months,
            days,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

fn number(input: &str, count: usize) -> IResult<&str, u32> {
    map_res(take_while_m_n(count, count, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(input)
}

fn two_digits(input: &str) -> IResult<&str, u32> {
    number(input, 2)
}

fn four_digits(input: &str) -> IResult<&str, u32> {
    number(input, 4)
}

fn dd_mm_yyyy(input: &str) -> IResult<&str, (u32, u32, u32)> {
    let (rest, (day, _, month, _, year)) = all_consuming(tuple((
        two_digits,
        tag("/"),
        two_digits,
        tag("/"),
        four_digits,
    )))(input)?;
    Ok((rest, (day, month, year)))
}

/// Strict `DD/MM/YYYY` parsing. Returns `None` for anything else, including
/// well-shaped but impossible dates such as `31/02/2020` or `01/13/2020`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let (_, (day, month, year)) = dd_mm_yyyy(s).ok()?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// Number of days of the calendar month immediately preceding `date`'s month.
fn days_in_preceding_month(date: &NaiveDate) -> u32 {
    if date.month() == 1 {
        days_in_month(date.year() - 1, 12)
    } else {
        days_in_month(date.year(), date.month() - 1)
    }
}

/// Calendar-accurate difference between two dates.
///
/// A day underflow borrows the length of the month preceding `end`'s month,
/// a month underflow borrows a year. When the start day does not exist in the
/// borrowed month the start is pinned to that month's last day. Returns zero
/// when `end < start`.
pub fn diff(start: &NaiveDate, end: &NaiveDate) -> Duration {
    if end < start {
        return Duration::default();
    }

    let mut years = end.year() - start.year();
    let mut months = end.month() as i32 - start.month() as i32;
    let mut days = end.day() as i32 - start.day() as i32;

    if days < 0 {
        months -= 1;
        let borrowed = days_in_preceding_month(end);
        days = if start.day() > borrowed {
            end.day() as i32
        } else {
            days + borrowed as i32
        };
    }

    if months < 0 {
        years -= 1;
        months += 12;
    }

    if years < 0 {
        return Duration::default();
    }
    Duration::new(years as u32, months as u32, days as u32)
}

/// Calendar promotion: add whole months (clamping to month end) and then days.
/// Inverse of [`diff`] for `start <= end`.
pub fn add_duration(start: &NaiveDate, duration: &Duration) -> Option<NaiveDate> {
    start
        .checked_add_months(Months::new(duration.years * 12 + duration.months))?
        .checked_add_days(chrono::Days::new(duration.days as u64))
}

fn plural(value: u32, singular: &str, plural: &str) -> String {
    format!("{} {}", value, if value == 1 { singular } else { plural })
}

/// "X anos, Y meses, Z dias", skipping zero components.
pub fn format_duration(duration: &Duration) -> String {
    let mut parts = vec![];
    if duration.years > 0 {
        parts.push(plural(duration.years, "ano", "anos"));
    }
    if duration.months > 0 {
        parts.push(plural(duration.months, "mês", "meses"));
    }
    if duration.days > 0 {
        parts.push(plural(duration.days, "dia", "dias"));
    }
    if parts.is_empty() {
        return "0 dias".to_owned();
    }
    parts.join(", ")
}

/// Summary card form: "Xa Ym Zd".
pub fn format_compact(duration: &Duration) -> String {
    format!("{}a {}m {}d", duration.years, duration.months, duration.days)
}

/// Aggregate durations with the fixed 30-day month convention.
pub fn sum<'a, I>(durations: I) -> Duration
where
    I: IntoIterator<Item = &'a Duration>,
{
    let (mut years, mut months, mut days) = (0u32, 0u32, 0u32);
    for d in durations {
        years += d.years;
        months += d.months;
        days += d.days;
    }

    months += days / 30;
    days %= 30;
    years += months / 12;
    months %= 12;

    Duration::new(years, months, days)
}
