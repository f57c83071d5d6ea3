//! Deterministic calendar-range derivation.
//!
//! [`range_for`] is a pure function from a semantic time kind plus optional
//! parameters to a concrete inclusive `[start, end]` date pair. Two
//! conventions coexist deliberately and must not be unified:
//!
//! - `This*` periods are *partial*: they start at the period boundary and end
//!   at the reference date (a "month to date" style window).
//! - `Last*` periods are always *full* calendar periods.
//!
//! Invalid combinations (month 13, Feb 30, quarter 0) return `None`; callers
//! discard such candidates silently.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::time::{TimeKind, TimeParams};

/// Monday of the ISO week containing `date`.
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// First day of the month containing `date`.
pub(crate) fn month_start(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

/// Last day of the given month, leap years included.
pub(crate) fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_months(Months::new(1))?.checked_sub_days(Days::new(1))
}

/// 1-based quarter containing `date`.
pub(crate) fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

pub(crate) fn quarter_start(year: i32, quarter: u32) -> Option<NaiveDate> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
}

pub(crate) fn quarter_end(year: i32, quarter: u32) -> Option<NaiveDate> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    month_end(year, quarter * 3)
}

/// Map a resolved semantic kind plus parameters to an inclusive date range.
pub(crate) fn range_for(
    kind: TimeKind,
    params: &TimeParams,
    today: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    match kind {
        TimeKind::Today => Some((today, today)),
        TimeKind::Yesterday => {
            let day = today.checked_sub_days(Days::new(1))?;
            Some((day, day))
        }
        TimeKind::ThisWeek => Some((week_start(today), today)),
        TimeKind::LastWeek => {
            let monday = week_start(today).checked_sub_days(Days::new(7))?;
            Some((monday, monday + Days::new(6)))
        }
        TimeKind::ThisMonth => Some((month_start(today)?, today)),
        TimeKind::LastMonth => {
            let first = month_start(today)?.checked_sub_months(Months::new(1))?;
            Some((first, month_end(first.year(), first.month())?))
        }
        TimeKind::ThisQuarter => Some((quarter_start(today.year(), quarter_of(today))?, today)),
        TimeKind::LastQuarter => {
            // Q1 rolls back to Q4 of the prior year.
            let (year, quarter) = match quarter_of(today) {
                1 => (today.year() - 1, 4),
                q => (today.year(), q - 1),
            };
            Some((quarter_start(year, quarter)?, quarter_end(year, quarter)?))
        }
        TimeKind::ThisYear => Some((NaiveDate::from_ymd_opt(today.year(), 1, 1)?, today)),
        TimeKind::LastYear => {
            let year = today.year() - 1;
            Some((NaiveDate::from_ymd_opt(year, 1, 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
        }
        TimeKind::LastNDays => {
            let n = params.n?;
            Some((today.checked_sub_days(Days::new(u64::from(n)))?, today))
        }
        TimeKind::LastNWeeks => {
            let n = params.n?;
            let anchor = today.checked_sub_days(Days::new(u64::from(n) * 7))?;
            Some((week_start(anchor), today))
        }
        TimeKind::LastNMonths => {
            let n = params.n?;
            let anchor = today.checked_sub_months(Months::new(n))?;
            Some((month_start(anchor)?, today))
        }
        TimeKind::AbsoluteQuarter => {
            let quarter = params.quarter?;
            let year = params.year.unwrap_or(today.year());
            Some((quarter_start(year, quarter)?, quarter_end(year, quarter)?))
        }
        TimeKind::AbsoluteMonth => {
            let year = params.year?;
            let month = params.month?;
            Some((NaiveDate::from_ymd_opt(year, month, 1)?, month_end(year, month)?))
        }
        TimeKind::AbsoluteYear => {
            let year = params.year?;
            Some((NaiveDate::from_ymd_opt(year, 1, 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
        }
        TimeKind::AbsoluteDate | TimeKind::IsoDate => {
            let day = NaiveDate::from_ymd_opt(params.year?, params.month?, params.day?)?;
            Some((day, day))
        }
    }
}
