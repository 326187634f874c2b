//! Calendar arithmetic between dates and [`PeriodSpan`]s.
//!
//! Whole-unit differences are floored toward the earlier date. All quotients
//! of day or month counts use integer division, so for `end >= start` the odd
//! day remainder of a resolved span is never negative. Month and year
//! advances clamp to the last day of the target month (Jan 31 + 1 month is
//! Feb 28 or 29).

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::AprError;
use crate::period::{PeriodKind, PeriodSpan, UnitPeriod};
use crate::AprResult;

/// Signed calendar days from `start` to `end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Whole calendar months between two dates, less one when `end` falls on an
/// earlier day of the month than `start`.
pub fn diff_months(start: NaiveDate, end: NaiveDate) -> i32 {
    let adjustment = if end.day() < start.day() { 1 } else { 0 };
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32) - adjustment
}

/// Whole calendar years between two dates, less one when `end` falls on an
/// earlier day of the year than `start`.
pub fn diff_years(start: NaiveDate, end: NaiveDate) -> i32 {
    let adjustment = if end.ordinal() < start.ordinal() { 1 } else { 0 };
    end.year() - start.year() - adjustment
}

/// Whole weeks between two dates (days / 7, truncated toward zero).
pub fn diff_weeks(start: NaiveDate, end: NaiveDate) -> i64 {
    days_between(start, end) / 7
}

/// Shifts `date` by a signed number of calendar months, clamping the day.
pub fn add_months(date: NaiveDate, months: i64) -> AprResult<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map_err(|_| AprError::DateError(format!("{months} months is out of range")))?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| AprError::DateError(format!("{date} shifted by {months} months")))
}

/// Shifts `date` by a signed number of calendar days.
pub fn add_days(date: NaiveDate, days: i64) -> AprResult<NaiveDate> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or_else(|| AprError::DateError(format!("{date} shifted by {days} days")))
}

/// Advances `date` by `times` repetitions of `period`.
pub fn add_period(date: NaiveDate, period: &UnitPeriod, times: i64) -> AprResult<NaiveDate> {
    let units = times * i64::from(period.count);
    match period.kind {
        PeriodKind::Monthly => add_months(date, units),
        PeriodKind::Yearly => add_months(date, units * 12),
        PeriodKind::Weekly => add_days(date, units * 7),
        PeriodKind::Daily => add_days(date, units),
    }
}

/// Expresses the time from `start` to `end` as whole `common_period` units
/// plus odd days.
pub fn resolve_span(
    start: NaiveDate,
    end: NaiveDate,
    common_period: &UnitPeriod,
) -> AprResult<PeriodSpan> {
    if !common_period.is_valid() {
        return Err(AprError::UnresolvablePeriod(format!(
            "common period {common_period} is not a usable unit period"
        )));
    }
    let count = i64::from(common_period.count);
    let whole_units = match common_period.kind {
        PeriodKind::Monthly => i64::from(diff_months(start, end)),
        PeriodKind::Yearly => i64::from(diff_years(start, end)),
        PeriodKind::Weekly => diff_weeks(start, end),
        PeriodKind::Daily => days_between(start, end),
    };
    let mut periods = whole_units / count;
    let mut anchor = add_period(start, common_period, periods)?;
    // day-of-year flooring can overshoot by a day across Feb 29
    while periods > 0 && anchor > end {
        periods -= 1;
        anchor = add_period(start, common_period, periods)?;
    }
    let odd_days = days_between(anchor, end);

    Ok(PeriodSpan {
        periods: to_i32(periods, "periods")?,
        odd_days: to_i32(odd_days, "odd days")?,
    })
}

/// Inverse of [`resolve_span`]: the date `span` lies after `start`.
pub fn resolve_date(
    span: &PeriodSpan,
    start: NaiveDate,
    common_period: &UnitPeriod,
) -> AprResult<NaiveDate> {
    let anchor = add_period(start, common_period, i64::from(span.periods))?;
    add_days(anchor, i64::from(span.odd_days))
}

fn to_i32(value: i64, what: &str) -> AprResult<i32> {
    i32::try_from(value).map_err(|_| AprError::DateError(format!("{what} {value} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_diff_months_floors_on_day() {
        assert_eq!(diff_months(d(2020, 1, 15), d(2020, 3, 15)), 2);
        assert_eq!(diff_months(d(2020, 1, 15), d(2020, 3, 14)), 1);
        assert_eq!(diff_months(d(2020, 11, 1), d(2021, 2, 1)), 3);
        assert_eq!(diff_months(d(2020, 1, 31), d(2020, 2, 29)), 0);
    }

    #[test]
    fn test_diff_years_floors_on_day_of_year() {
        assert_eq!(diff_years(d(2019, 3, 1), d(2021, 3, 1)), 2);
        assert_eq!(diff_years(d(2019, 3, 2), d(2021, 3, 1)), 1);
    }

    #[test]
    fn test_diff_weeks_truncates() {
        assert_eq!(diff_weeks(d(2021, 1, 1), d(2021, 1, 15)), 2);
        assert_eq!(diff_weeks(d(2021, 1, 1), d(2021, 1, 20)), 2);
        assert_eq!(diff_weeks(d(2021, 1, 1), d(2021, 1, 7)), 0);
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(d(2021, 1, 31), 1).unwrap(), d(2021, 2, 28));
        assert_eq!(add_months(d(2020, 1, 31), 1).unwrap(), d(2020, 2, 29));
        assert_eq!(add_months(d(2021, 3, 31), -1).unwrap(), d(2021, 2, 28));
        assert_eq!(
            add_period(d(2020, 2, 29), &UnitPeriod::yearly(), 1).unwrap(),
            d(2021, 2, 28)
        );
    }

    #[test]
    fn test_resolve_span_monthly() {
        let span = resolve_span(d(1978, 1, 10), d(1978, 4, 25), &UnitPeriod::monthly(1)).unwrap();
        assert_eq!(span, PeriodSpan::new(3, 15));

        let span = resolve_span(d(1978, 1, 10), d(1979, 1, 10), &UnitPeriod::monthly(24)).unwrap();
        // 12 months is less than one 24-month unit
        assert_eq!(span, PeriodSpan::new(0, 365));
    }

    #[test]
    fn test_resolve_span_weekly_and_daily() {
        let span = resolve_span(d(2021, 1, 1), d(2021, 1, 20), &UnitPeriod::weekly(1)).unwrap();
        assert_eq!(span, PeriodSpan::new(2, 5));

        let span = resolve_span(d(2021, 1, 1), d(2021, 1, 20), &UnitPeriod::weekly(2)).unwrap();
        assert_eq!(span, PeriodSpan::new(1, 5));

        let span = resolve_span(d(2021, 1, 1), d(2021, 1, 20), &UnitPeriod::daily(5)).unwrap();
        assert_eq!(span, PeriodSpan::new(3, 4));
    }

    #[test]
    fn test_resolve_span_yearly() {
        let span = resolve_span(d(2019, 6, 1), d(2021, 8, 1), &UnitPeriod::yearly()).unwrap();
        assert_eq!(span, PeriodSpan::new(2, 61));

        // 2020-02-29 shares a day of year with 2019-03-01 but is a day short
        let span = resolve_span(d(2019, 3, 1), d(2020, 2, 29), &UnitPeriod::yearly()).unwrap();
        assert_eq!(span, PeriodSpan::new(0, 365));
    }

    #[test]
    fn test_resolve_span_rejects_zero_count() {
        let result = resolve_span(d(2021, 1, 1), d(2021, 2, 1), &UnitPeriod::monthly(0));
        assert!(matches!(result, Err(AprError::UnresolvablePeriod(_))));
    }

    #[test]
    fn test_resolve_date_adds_odd_days() {
        let date = resolve_date(&PeriodSpan::new(2, 3), d(2021, 1, 31), &UnitPeriod::monthly(1))
            .unwrap();
        // Jan 31 + 2 months = Mar 31, + 3 days
        assert_eq!(date, d(2021, 4, 3));

        let date = resolve_date(&PeriodSpan::new(4, 1), d(2021, 1, 1), &UnitPeriod::daily(7)).unwrap();
        assert_eq!(date, d(2021, 1, 30));
    }

    #[test]
    fn test_span_round_trip_month_end() {
        let start = d(2021, 1, 31);
        let end = d(2021, 5, 30);
        let period = UnitPeriod::monthly(1);
        let span = resolve_span(start, end, &period).unwrap();
        assert_eq!(resolve_date(&span, start, &period).unwrap(), end);
    }
}
