//! Conversions between the machine form used by native date/time inputs
//! (`yyyy-mm-dd`, `hh:mm`) and the display form stored on tasks
//! (`March 4, 2025`, `9:05 am`).
//!
//! Every string-returning conversion treats empty or unparseable input as
//! "no value" and returns an empty string.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

const DISPLAY_DATE_FORMAT: &str = "%B %-d, %Y";
const DISPLAY_TIME_FORMAT: &str = "%-I:%M %P";
const MACHINE_DATE_FORMAT: &str = "%Y-%m-%d";
const MACHINE_TIME_FORMAT: &str = "%H:%M";
const MACHINE_TIME_SECONDS_FORMAT: &str = "%H:%M:%S";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ============================================================================
// Clock
// ============================================================================

/// Source of the current local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// A display-form date and time pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayStamp {
    pub date: String,
    pub time: String,
}

/// The current moment in display form, e.g. `("October 14, 2026", "9:05 am")`.
pub fn current_stamp(clock: &impl Clock) -> DisplayStamp {
    let now = clock.now();
    DisplayStamp {
        date: format_display_date(now.date()),
        time: format_display_time(now.time()),
    }
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn format_display_time(time: NaiveTime) -> String {
    time.format(DISPLAY_TIME_FORMAT).to_string()
}

/// `yyyy-mm-dd`, zero-padded.
pub fn machine_date(date: NaiveDate) -> String {
    date.format(MACHINE_DATE_FORMAT).to_string()
}

/// `hh:mm`, 24-hour, zero-padded.
pub fn machine_time(time: NaiveTime) -> String {
    time.format(MACHINE_TIME_FORMAT).to_string()
}

pub fn today_machine_date(clock: &impl Clock) -> String {
    machine_date(clock.now().date())
}

pub fn now_machine_time(clock: &impl Clock) -> String {
    machine_time(clock.now().time())
}

// ============================================================================
// Conversions
// ============================================================================

/// `2025-03-04` -> `March 4, 2025`
pub fn to_display_date(machine: &str) -> String {
    parse_machine_date(machine)
        .map(format_display_date)
        .unwrap_or_default()
}

/// `09:05` -> `9:05 am`
pub fn to_display_time(machine: &str) -> String {
    parse_machine_time(machine)
        .map(format_display_time)
        .unwrap_or_default()
}

/// `March 4, 2025` -> `2025-03-04`
pub fn to_machine_date(display: &str) -> String {
    parse_display_date(display)
        .map(machine_date)
        .unwrap_or_default()
}

/// `9:05 am` -> `09:05`
pub fn to_machine_time(display: &str) -> String {
    parse_display_time(display)
        .map(machine_time)
        .unwrap_or_default()
}

pub fn parse_machine_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), MACHINE_DATE_FORMAT).ok()
}

/// Native time inputs send `hh:mm`, or `hh:mm:ss` when a step below one
/// minute is configured.
pub fn parse_machine_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, MACHINE_TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(input, MACHINE_TIME_SECONDS_FORMAT))
        .ok()
}

// ============================================================================
// Display-form parsing
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("no value")]
    Empty,
    #[error("malformed value: '{0}'")]
    Malformed(String),
    #[error("unknown month: '{0}'")]
    UnknownMonth(String),
    #[error("value out of range: '{0}'")]
    OutOfRange(String),
}

/// Parse exactly the shape produced by [`format_display_date`]:
/// `<FullMonthName> <Day>, <Year>`.
pub fn parse_display_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DateParseError::Empty);
    }
    let malformed = || DateParseError::Malformed(input.to_string());

    let (month_day, year) = input.split_once(',').ok_or_else(malformed)?;

    let mut parts = month_day.split_whitespace();
    let (Some(month_name), Some(day), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let month = month_number(month_name)
        .ok_or_else(|| DateParseError::UnknownMonth(month_name.to_string()))?;
    let day = parse_digits(day, 1, 2).ok_or_else(malformed)?;
    let year = parse_digits(year.trim(), 1, 6)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(malformed)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::OutOfRange(input.to_string()))
}

/// Parse exactly the shape produced by [`format_display_time`]:
/// `<H>:<MM> <am|pm>`.
pub fn parse_display_time(input: &str) -> Result<NaiveTime, DateParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DateParseError::Empty);
    }
    let malformed = || DateParseError::Malformed(input.to_string());
    let out_of_range = || DateParseError::OutOfRange(input.to_string());

    // Some formatters separate the meridiem with U+202F, which is whitespace too.
    let mut parts = input.split_whitespace();
    let (Some(clock), Some(meridiem), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let (hour, minute) = clock.split_once(':').ok_or_else(malformed)?;
    let hour = parse_digits(hour, 1, 2).ok_or_else(malformed)?;
    let minute = parse_digits(minute, 2, 2).ok_or_else(malformed)?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(out_of_range());
    }

    let is_pm = if meridiem.eq_ignore_ascii_case("am") {
        false
    } else if meridiem.eq_ignore_ascii_case("pm") {
        true
    } else {
        return Err(malformed());
    };

    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(out_of_range)
}

fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|month| month.eq_ignore_ascii_case(name))
        .and_then(|index| u32::try_from(index + 1).ok())
}

fn parse_digits(s: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if s.len() < min_len || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
