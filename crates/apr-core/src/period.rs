//! Period model: the recurring calendar granularity an APR is computed in and
//! elapsed time measured in that granularity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AprError;

/// Calendar granularity of a unit period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl PeriodKind {
    /// Single-letter suffix used in compact period tags.
    pub const fn suffix(self) -> char {
        match self {
            PeriodKind::Daily => 'D',
            PeriodKind::Weekly => 'W',
            PeriodKind::Monthly => 'M',
            PeriodKind::Yearly => 'Y',
        }
    }

    /// Days in a single unit of this kind.
    pub const fn unit_days(self) -> u32 {
        match self {
            PeriodKind::Daily => 1,
            PeriodKind::Weekly => 7,
            PeriodKind::Monthly => 30,
            PeriodKind::Yearly => 365,
        }
    }
}

/// A recurring granularity such as "2 months" or "14 days".
///
/// Serialized as its compact tag (`"2M"`, `"14D"`, `"1Y"`). A usable unit
/// period has `count >= 1` and a day length that fits in a `u32`; see
/// [`UnitPeriod::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitPeriod {
    pub kind: PeriodKind,
    pub count: u32,
}

impl UnitPeriod {
    pub const fn new(kind: PeriodKind, count: u32) -> Self {
        Self { kind, count }
    }

    pub const fn daily(count: u32) -> Self {
        Self::new(PeriodKind::Daily, count)
    }

    pub const fn weekly(count: u32) -> Self {
        Self::new(PeriodKind::Weekly, count)
    }

    pub const fn monthly(count: u32) -> Self {
        Self::new(PeriodKind::Monthly, count)
    }

    /// Yearly periods are always a single year; a common period never exceeds one year.
    pub const fn yearly() -> Self {
        Self::new(PeriodKind::Yearly, 1)
    }

    pub const fn is_valid(&self) -> bool {
        self.count >= 1 && self.count.checked_mul(self.kind.unit_days()).is_some()
    }

    /// Number of unit periods in a year.
    ///
    /// Yearly is always exactly one, regardless of `count`.
    pub fn periods_per_year(&self) -> f64 {
        let count = f64::from(self.count);
        match self.kind {
            PeriodKind::Monthly => 12.0 / count,
            PeriodKind::Weekly => 52.0 / count,
            PeriodKind::Yearly => 1.0,
            PeriodKind::Daily => 365.0 / count,
        }
    }

    /// Days in one unit period, using the 30-day month convention.
    ///
    /// Saturates for periods that fail [`UnitPeriod::is_valid`].
    pub fn days_per_period(&self) -> u32 {
        self.kind.unit_days().saturating_mul(self.count)
    }
}

impl fmt::Display for UnitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.kind.suffix())
    }
}

impl FromStr for UnitPeriod {
    type Err = AprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AprError::InvalidInput {
            field: "unit_period".into(),
            reason: format!("'{s}' {reason}"),
        };

        let tag = s.trim();
        let suffix = tag
            .chars()
            .last()
            .ok_or_else(|| invalid("is empty"))?
            .to_ascii_uppercase();
        let kind = match suffix {
            'D' => PeriodKind::Daily,
            'W' => PeriodKind::Weekly,
            'M' => PeriodKind::Monthly,
            'Y' => PeriodKind::Yearly,
            _ => return Err(invalid("must end in D, W, M or Y")),
        };
        let count: u32 = tag[..tag.len() - 1]
            .parse()
            .map_err(|_| invalid("must start with a whole number of units"))?;
        if count < 1 {
            return Err(invalid("must have a count of at least 1"));
        }
        if kind == PeriodKind::Yearly && count != 1 {
            return Err(invalid("is longer than one year"));
        }
        let period = Self { kind, count };
        if !period.is_valid() {
            return Err(invalid("is too long to count in days"));
        }
        Ok(period)
    }
}

impl TryFrom<String> for UnitPeriod {
    type Error = AprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UnitPeriod> for String {
    fn from(period: UnitPeriod) -> Self {
        period.to_string()
    }
}

/// Elapsed time as whole unit periods plus a remainder of odd days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodSpan {
    pub periods: i32,
    pub odd_days: i32,
}

impl PeriodSpan {
    pub const ZERO: PeriodSpan = PeriodSpan {
        periods: 0,
        odd_days: 0,
    };

    pub const fn new(periods: i32, odd_days: i32) -> Self {
        Self { periods, odd_days }
    }
}
