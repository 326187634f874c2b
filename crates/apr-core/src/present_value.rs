//! Present value interest factors under the Regulation Z odd-days convention.
//!
//! Whole unit periods are discounted with compound interest; the odd-day
//! remainder is discounted with simple interest at the periodic rate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{add_period, resolve_span};
use crate::period::{PeriodSpan, UnitPeriod};
use crate::types::{Factor, Rate};
use crate::AprResult;

/// Per-period constants derived once from the common period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountBasis {
    pub common_period: UnitPeriod,
    pub periods_per_year: f64,
    pub days_per_period: u32,
}

impl DiscountBasis {
    pub fn new(common_period: UnitPeriod) -> Self {
        Self {
            common_period,
            periods_per_year: common_period.periods_per_year(),
            days_per_period: common_period.days_per_period(),
        }
    }
}

/// Present value interest factor of a single payment `span` after the start.
///
/// `1 / ((1 + r/ppy)^periods * (1 + (odd_days/dpp) * (r/ppy)))`. A zero span
/// is exactly `1.0` for every rate.
pub fn pvif(span: &PeriodSpan, rate: Rate, periods_per_year: f64, days_per_period: f64) -> Factor {
    if *span == PeriodSpan::ZERO {
        return 1.0;
    }
    let periodic_rate = rate / periods_per_year;
    let compounded = (1.0 + periodic_rate).powi(span.periods);
    let odd_day_interest = 1.0 + (f64::from(span.odd_days) / days_per_period) * periodic_rate;
    1.0 / (compounded * odd_day_interest)
}

/// Present value interest factor of `occurrences` payments, the first on
/// `first_occurrence` and each later one a `recurrence` after the previous.
///
/// Each occurrence's span from `start` is resolved against the common period
/// separately, so uneven calendar spacing is discounted exactly.
pub fn pvifa(
    start: NaiveDate,
    first_occurrence: NaiveDate,
    recurrence: &UnitPeriod,
    rate: Rate,
    basis: &DiscountBasis,
    occurrences: u32,
) -> AprResult<Factor> {
    let days_per_period = f64::from(basis.days_per_period);
    let mut occurrence = first_occurrence;
    let mut total = 0.0;

    for i in 0..occurrences {
        if i > 0 {
            occurrence = add_period(occurrence, recurrence, 1)?;
        }
        let span = resolve_span(start, occurrence, &basis.common_period)?;
        total += pvif(&span, rate, basis.periods_per_year, days_per_period);
    }

    Ok(total)
}

/// Annuity factor for a level stream of whole-period payments: the sum of
/// `1 / (1 + r/ppy)^k` for `k` in `starting_period..starting_period + number_of_periods`.
///
/// The end of the range saturates at `i32::MAX`; a non-positive count is empty.
pub fn pvifa_stream(
    rate: Rate,
    periods_per_year: f64,
    starting_period: i32,
    number_of_periods: i32,
) -> Factor {
    let discount = 1.0 + rate / periods_per_year;
    (starting_period..starting_period.saturating_add(number_of_periods))
        .map(|k| 1.0 / discount.powi(k))
        .sum()
}
