//! Common-period inference.
//!
//! Every gap between consecutive distinct event dates is classified into a
//! [`PeriodTag`]. The most frequent tag wins, with ties going to the tag whose
//! first observed gap was shorter. When no tag occurs more than once and
//! several tags were seen, the common period is derived from the average gap
//! instead.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dates::{days_between, diff_months, diff_weeks};
use crate::period::{PeriodKind, UnitPeriod};

/// Gaps longer than this many days are always yearly.
const DAYS_PER_YEAR: i64 = 365;

/// Classification of a single gap between two event dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodTag {
    Yearly,
    Monthly(u32),
    Weekly(u32),
    Daily(u32),
}

impl PeriodTag {
    pub fn unit_period(self) -> UnitPeriod {
        match self {
            PeriodTag::Yearly => UnitPeriod::yearly(),
            PeriodTag::Monthly(n) => UnitPeriod::monthly(n),
            PeriodTag::Weekly(n) => UnitPeriod::weekly(n),
            PeriodTag::Daily(n) => UnitPeriod::daily(n),
        }
    }
}

impl fmt::Display for PeriodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.unit_period().fmt(f)
    }
}

/// Classifies the gap from `prior` to `current` (`prior < current`).
///
/// Returns the tag and whether the gap was classified by matching day of
/// month.
pub fn classify_gap(prior: NaiveDate, current: NaiveDate) -> (PeriodTag, bool) {
    let gap_days = days_between(prior, current);

    if prior.day() == current.day() {
        let months = diff_months(prior, current);
        if months >= 12 {
            (PeriodTag::Yearly, true)
        } else {
            (PeriodTag::Monthly(months.max(0) as u32), true)
        }
    } else if gap_days > DAYS_PER_YEAR {
        (PeriodTag::Yearly, false)
    } else if gap_days > 6 && gap_days % 7 == 0 {
        (PeriodTag::Weekly(diff_weeks(prior, current) as u32), false)
    } else {
        (PeriodTag::Daily(gap_days.max(0) as u32), false)
    }
}

/// Running count for one tag, with the gap length and day of month first
/// seen for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTally {
    pub tag: PeriodTag,
    pub occurrences: u32,
    pub first_gap_days: i64,
    pub first_day_of_month: u32,
}

impl TagTally {
    /// Mode ordering: more occurrences first, then the shorter first gap.
    /// Equal tallies keep the earlier-seen tag.
    fn outranks(&self, other: &TagTally) -> bool {
        self.occurrences > other.occurrences
            || (self.occurrences == other.occurrences && self.first_gap_days < other.first_gap_days)
    }
}

/// Outcome of inferring the common period of a set of dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInference {
    pub period: UnitPeriod,
    /// Occurrences of the winning tag.
    pub mode_count: u32,
    /// Number of gaps between distinct consecutive dates.
    pub gap_count: u32,
    /// True when no dominant tag existed and the average gap was used.
    pub used_average: bool,
    /// Day of month shared by a monthly or yearly mode.
    pub common_day: Option<u32>,
    /// Tag tallies in first-seen order.
    pub tallies: Vec<TagTally>,
}

/// Infers the common period of `dates`, or `None` when fewer than two
/// distinct dates leave no gap to classify.
pub fn infer(dates: &[NaiveDate]) -> Option<PeriodInference> {
    let mut sorted = dates.to_vec();
    sorted.sort();

    let mut tallies: Vec<TagTally> = Vec::new();
    let mut all_months = true;
    let mut gap_count: u32 = 0;

    for pair in sorted.windows(2) {
        let (prior, current) = (pair[0], pair[1]);
        // same-date items carry no spacing information
        if prior == current {
            continue;
        }
        let (tag, by_day_of_month) = classify_gap(prior, current);
        all_months &= by_day_of_month;

        match tallies.iter_mut().find(|t| t.tag == tag) {
            Some(tally) => tally.occurrences += 1,
            None => tallies.push(TagTally {
                tag,
                occurrences: 1,
                first_gap_days: days_between(prior, current),
                first_day_of_month: current.day(),
            }),
        }
        gap_count += 1;
    }

    let mut mode = *tallies.first()?;
    for tally in &tallies[1..] {
        if tally.outranks(&mode) {
            mode = *tally;
        }
    }

    let (first, last) = (sorted[0], sorted[sorted.len() - 1]);
    let inference = if mode.occurrences <= 1 && tallies.len() > 1 {
        PeriodInference {
            period: average_period(first, last, gap_count, all_months),
            mode_count: mode.occurrences,
            gap_count,
            used_average: true,
            common_day: None,
            tallies,
        }
    } else {
        let period = mode.tag.unit_period();
        let common_day = match period.kind {
            PeriodKind::Monthly | PeriodKind::Yearly => Some(mode.first_day_of_month),
            PeriodKind::Weekly | PeriodKind::Daily => None,
        };
        PeriodInference {
            period,
            mode_count: mode.occurrences,
            gap_count,
            used_average: false,
            common_day,
            tallies,
        }
    };

    tracing::debug!(
        period = %inference.period,
        mode_count = inference.mode_count,
        used_average = inference.used_average,
        "inferred common period"
    );
    Some(inference)
}

/// Convenience wrapper returning only the inferred unit period.
pub fn infer_common_period(dates: &[NaiveDate]) -> Option<UnitPeriod> {
    infer(dates).map(|inference| inference.period)
}

/// Fallback when no gap classification dominates.
fn average_period(first: NaiveDate, last: NaiveDate, gap_count: u32, all_months: bool) -> UnitPeriod {
    let gaps = i64::from(gap_count.max(1));
    let average_days = days_between(first, last) / gaps;

    if average_days >= DAYS_PER_YEAR {
        return UnitPeriod::yearly();
    }

    let total_months = i64::from(diff_months(first, last));
    if all_months && total_months % gaps == 0 {
        UnitPeriod::monthly((total_months / gaps) as u32)
    } else if average_days >= 7 {
        UnitPeriod::weekly((average_days / 7) as u32)
    } else {
        UnitPeriod::daily(average_days as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_classify_gap() {
        assert_eq!(classify_gap(d(2021, 1, 10), d(2021, 3, 10)), (PeriodTag::Monthly(2), true));
        assert_eq!(classify_gap(d(2021, 1, 10), d(2022, 1, 10)), (PeriodTag::Yearly, true));
        assert_eq!(classify_gap(d(2021, 1, 10), d(2022, 2, 11)), (PeriodTag::Yearly, false));
        assert_eq!(classify_gap(d(2021, 1, 1), d(2021, 1, 15)), (PeriodTag::Weekly(2), false));
        assert_eq!(classify_gap(d(2021, 1, 1), d(2021, 1, 16)), (PeriodTag::Daily(15), false));
        // seven days is the shortest weekly gap
        assert_eq!(classify_gap(d(2021, 1, 1), d(2021, 1, 8)), (PeriodTag::Weekly(1), false));
        assert_eq!(classify_gap(d(2021, 1, 1), d(2021, 1, 4)), (PeriodTag::Daily(3), false));
    }

    #[test]
    fn test_year_boundary_on_different_days() {
        // 365 days in leap 2020, day 1 vs day 31
        assert_eq!(classify_gap(d(2020, 1, 1), d(2020, 12, 31)), (PeriodTag::Daily(365), false));
        assert_eq!(classify_gap(d(2021, 1, 1), d(2022, 1, 2)), (PeriodTag::Yearly, false));
    }

    #[test]
    fn test_monthly_on_the_first() {
        let dates: Vec<NaiveDate> = (1..=12).map(|m| d(2021, m, 1)).collect();
        let inference = infer(&dates).unwrap();
        assert_eq!(inference.period, UnitPeriod::monthly(1));
        assert_eq!(inference.mode_count, 11);
        assert_eq!(inference.common_day, Some(1));
        assert!(!inference.used_average);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let dates = vec![d(2021, 3, 5), d(2021, 1, 5), d(2021, 2, 5)];
        assert_eq!(infer_common_period(&dates), Some(UnitPeriod::monthly(1)));
    }

    #[test]
    fn test_same_dates_are_skipped() {
        let dates = vec![d(2021, 1, 5), d(2021, 1, 5), d(2021, 1, 19), d(2021, 2, 2)];
        let inference = infer(&dates).unwrap();
        assert_eq!(inference.gap_count, 2);
        assert_eq!(inference.period, UnitPeriod::weekly(2));
    }

    #[test]
    fn test_tie_prefers_shorter_gap() {
        // 1M twice (first gap 31 days) then 2W twice (14 days)
        let dates = vec![
            d(2021, 1, 1),
            d(2021, 2, 1),
            d(2021, 3, 1),
            d(2021, 3, 15),
            d(2021, 3, 29),
        ];
        let inference = infer(&dates).unwrap();
        assert_eq!(inference.mode_count, 2);
        assert_eq!(inference.period, UnitPeriod::weekly(2));
    }

    #[test]
    fn test_distinct_gaps_use_average_days() {
        // gaps of 2, 5 and 10 days: no tag repeats
        let dates = vec![d(2021, 1, 1), d(2021, 1, 3), d(2021, 1, 8), d(2021, 1, 18)];
        let inference = infer(&dates).unwrap();
        assert!(inference.used_average);
        assert_eq!(inference.mode_count, 1);
        // 17 days / 3 gaps
        assert_eq!(inference.period, UnitPeriod::daily(5));
        assert_eq!(inference.common_day, None);
    }

    #[test]
    fn test_distinct_month_gaps_average_to_months() {
        // 1M, 2M, 3M on the same day of month: 6 months over 3 gaps
        let dates = vec![d(2021, 1, 15), d(2021, 2, 15), d(2021, 4, 15), d(2021, 7, 15)];
        let inference = infer(&dates).unwrap();
        assert!(inference.used_average);
        assert_eq!(inference.period, UnitPeriod::monthly(2));
    }

    #[test]
    fn test_distinct_gaps_average_to_weeks() {
        // 9, 20 and 30 days: average 19 days
        let dates = vec![d(2021, 1, 1), d(2021, 1, 10), d(2021, 1, 30), d(2021, 3, 1)];
        let inference = infer(&dates).unwrap();
        assert!(inference.used_average);
        assert_eq!(inference.period, UnitPeriod::weekly(2));
    }

    #[test]
    fn test_distinct_long_gaps_average_to_yearly() {
        // 11M then a same-day 2-year gap: 1096 days over 2 gaps
        let dates = vec![d(2010, 1, 1), d(2010, 12, 1), d(2013, 1, 1)];
        let inference = infer(&dates).unwrap();
        assert!(inference.used_average);
        assert_eq!(inference.period, UnitPeriod::yearly());
    }

    #[test]
    fn test_average_of_364_days_is_not_yearly() {
        // Daily(360) then a 368-day Yearly gap
        let dates = vec![d(2021, 1, 1), d(2021, 12, 27), d(2022, 12, 30)];
        let inference = infer(&dates).unwrap();
        assert!(inference.used_average);
        assert_eq!(inference.period, UnitPeriod::weekly(52));
    }

    #[test]
    fn test_average_of_365_days_is_yearly() {
        // Daily(360) then a 370-day Yearly gap
        let dates = vec![d(2021, 1, 1), d(2021, 12, 27), d(2023, 1, 1)];
        let inference = infer(&dates).unwrap();
        assert!(inference.used_average);
        assert_eq!(inference.period, UnitPeriod::yearly());
    }

    #[test]
    fn test_single_gap_is_its_own_mode() {
        let inference = infer(&[d(1978, 1, 10), d(1978, 2, 10)]).unwrap();
        assert_eq!(inference.period, UnitPeriod::monthly(1));
        assert!(!inference.used_average);
    }

    #[test]
    fn test_no_gaps_infers_nothing() {
        assert!(infer(&[]).is_none());
        assert!(infer(&[d(2021, 1, 1)]).is_none());
        assert!(infer(&[d(2021, 1, 1), d(2021, 1, 1)]).is_none());
    }
}
