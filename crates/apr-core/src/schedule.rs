//! Line items and the series that owns them.
//!
//! Items are appended while the series is open. [`LineItemSeries::complete`]
//! fixes the start date and common period, resolves every item to both a
//! calendar date and a [`PeriodSpan`], and freezes the series.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common_period;
use crate::dates::{resolve_date, resolve_span};
use crate::error::AprError;
use crate::period::{PeriodSpan, UnitPeriod};
use crate::present_value::DiscountBasis;
use crate::types::Money;
use crate::AprResult;

/// Direction of a cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    /// Inflow to the lender; positive.
    Payment,
    /// Outflow to the borrower; negative.
    Disbursement,
}

impl LineItemKind {
    pub fn sign(self) -> Decimal {
        match self {
            LineItemKind::Payment => Decimal::ONE,
            LineItemKind::Disbursement => Decimal::NEGATIVE_ONE,
        }
    }
}

/// How a line item is placed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledBy {
    /// On a calendar date.
    Date(NaiveDate),
    /// Whole common periods plus odd days after the start date.
    Offset(PeriodSpan),
}

/// A single cash flow, possibly recurring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    /// Magnitude as entered, never negative.
    pub amount: Money,
    #[serde(flatten)]
    pub scheduled_by: ScheduledBy,
    #[serde(default = "default_occurrences")]
    pub occurrences: u32,
    /// Spacing between occurrences; required when `occurrences > 1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<UnitPeriod>,
}

fn default_occurrences() -> u32 {
    1
}

impl LineItem {
    /// Creates a single line item. Negative amounts are rejected; the sign
    /// comes from `kind`.
    pub fn new(kind: LineItemKind, amount: Money, scheduled_by: ScheduledBy) -> AprResult<Self> {
        let item = Self {
            kind,
            amount,
            scheduled_by,
            occurrences: 1,
            recurrence: None,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn payment_on(amount: Money, date: NaiveDate) -> AprResult<Self> {
        Self::new(LineItemKind::Payment, amount, ScheduledBy::Date(date))
    }

    pub fn disbursement_on(amount: Money, date: NaiveDate) -> AprResult<Self> {
        Self::new(LineItemKind::Disbursement, amount, ScheduledBy::Date(date))
    }

    pub fn payment_after(amount: Money, periods: i32, odd_days: i32) -> AprResult<Self> {
        Self::new(
            LineItemKind::Payment,
            amount,
            ScheduledBy::Offset(PeriodSpan::new(periods, odd_days)),
        )
    }

    pub fn disbursement_after(amount: Money, periods: i32, odd_days: i32) -> AprResult<Self> {
        Self::new(
            LineItemKind::Disbursement,
            amount,
            ScheduledBy::Offset(PeriodSpan::new(periods, odd_days)),
        )
    }

    /// Repeats the item `occurrences` times, each `recurrence` after the last.
    pub fn recurring(mut self, occurrences: u32, recurrence: UnitPeriod) -> AprResult<Self> {
        self.occurrences = occurrences;
        self.recurrence = Some(recurrence);
        self.validate()?;
        Ok(self)
    }

    /// Amount carrying the sign of its kind.
    pub fn signed_amount(&self) -> Money {
        self.amount * self.kind.sign()
    }

    /// Checks the invariants of a line item; run on construction and again
    /// when a deserialized item is added to a series.
    pub fn validate(&self) -> AprResult<()> {
        if self.amount < Decimal::ZERO {
            return Err(AprError::InvalidInput {
                field: "amount".into(),
                reason: "New line item must have an amount >= 0".into(),
            });
        }
        if self.occurrences < 1 {
            return Err(AprError::InvalidInput {
                field: "occurrences".into(),
                reason: "A line item occurs at least once".into(),
            });
        }
        if self.occurrences > 1 {
            match self.recurrence {
                Some(period) if period.is_valid() => {}
                _ => {
                    return Err(AprError::InvalidInput {
                        field: "recurrence".into(),
                        reason: "Recurring line items need a recurrence period of at least one unit"
                            .into(),
                    })
                }
            }
        }
        if let ScheduledBy::Offset(span) = self.scheduled_by {
            if span.periods < 0 {
                return Err(AprError::InvalidInput {
                    field: "periods".into(),
                    reason: "Offsets are measured forward from the start date".into(),
                });
            }
        }
        Ok(())
    }
}

/// A line item with both its date and its span from the start resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub kind: LineItemKind,
    /// Signed amount.
    pub amount: Money,
    /// `amount` as used for discounting.
    pub value: f64,
    pub date: NaiveDate,
    pub span: PeriodSpan,
    pub occurrences: u32,
    pub recurrence: Option<UnitPeriod>,
}

/// The frozen result of completing a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSchedule {
    pub start_date: NaiveDate,
    pub basis: DiscountBasis,
    /// Present only when the common period was inferred rather than supplied.
    pub inference: Option<common_period::PeriodInference>,
    /// Items in date order.
    pub items: Vec<ResolvedItem>,
}

impl CompletedSchedule {
    pub fn common_period(&self) -> UnitPeriod {
        self.basis.common_period
    }
}

/// Ordered collection of line items awaiting completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemSeries {
    items: Vec<LineItem>,
    common_period: Option<UnitPeriod>,
    start_date: Option<NaiveDate>,
    completed: Option<CompletedSchedule>,
}

impl LineItemSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the common period instead of inferring it from the dates.
    pub fn with_common_period(mut self, period: UnitPeriod) -> Self {
        self.common_period = Some(period);
        self
    }

    /// Anchors offsets to `date` instead of the earliest dated item.
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn add(&mut self, item: LineItem) -> AprResult<()> {
        if self.is_completed() {
            return Err(AprError::SeriesCompleted);
        }
        item.validate()?;
        self.items.push(item);
        Ok(())
    }

    /// Replaces the common-period override. Rejected once completed.
    pub fn set_common_period(&mut self, period: UnitPeriod) -> AprResult<()> {
        if self.is_completed() {
            return Err(AprError::SeriesCompleted);
        }
        self.common_period = Some(period);
        Ok(())
    }

    /// The supplied common period before completion, the resolved one after.
    pub fn common_period(&self) -> Option<UnitPeriod> {
        match &self.completed {
            Some(schedule) => Some(schedule.common_period()),
            None => self.common_period,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    pub fn schedule(&self) -> AprResult<&CompletedSchedule> {
        self.completed.as_ref().ok_or(AprError::NotCompleted)
    }

    /// Completes the series once; later calls return the same schedule.
    pub fn complete(&mut self) -> AprResult<&CompletedSchedule> {
        if self.completed.is_none() {
            let schedule = self.resolve()?;
            tracing::debug!(
                start_date = %schedule.start_date,
                common_period = %schedule.common_period(),
                items = schedule.items.len(),
                "line item series completed"
            );
            self.completed = Some(schedule);
        }
        self.schedule()
    }

    fn resolve(&self) -> AprResult<CompletedSchedule> {
        if self.items.is_empty() {
            return Err(AprError::InsufficientData(
                "A line item series needs at least one line item".into(),
            ));
        }

        let dated: Vec<NaiveDate> = self
            .items
            .iter()
            .filter_map(|item| match item.scheduled_by {
                ScheduledBy::Date(date) => Some(date),
                ScheduledBy::Offset(_) => None,
            })
            .collect();
        let has_offsets = dated.len() < self.items.len();

        let start_date = match (self.start_date, dated.iter().min()) {
            (Some(explicit), Some(earliest)) => explicit.min(*earliest),
            (Some(explicit), None) => explicit,
            (None, Some(earliest)) => *earliest,
            (None, None) => {
                return Err(AprError::InsufficientData(
                    "Period-scheduled line items need a dated line item or a start date".into(),
                ))
            }
        };

        let (common_period, inference) = match self.common_period {
            Some(period) if period.is_valid() => (period, None),
            Some(period) => {
                return Err(AprError::UnresolvablePeriod(format!(
                    "common period {period} is not a usable unit period"
                )))
            }
            None => match common_period::infer(&dated) {
                Some(inference) => (inference.period, Some(inference)),
                None if has_offsets => {
                    return Err(AprError::UnresolvablePeriod(
                        "A period has been specified, but no common period could be established"
                            .into(),
                    ))
                }
                // every item shares one date, so every span is zero
                None => (UnitPeriod::yearly(), None),
            },
        };

        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let (date, span) = match item.scheduled_by {
                ScheduledBy::Date(date) => (date, resolve_span(start_date, date, &common_period)?),
                ScheduledBy::Offset(span) => {
                    let date = resolve_date(&span, start_date, &common_period)?;
                    if date < start_date {
                        return Err(AprError::InvalidInput {
                            field: "odd_days".into(),
                            reason: format!("offset resolves to {date}, before the start date {start_date}"),
                        });
                    }
                    (date, span)
                }
            };
            let amount = item.signed_amount();
            let value = amount.to_f64().ok_or_else(|| AprError::InvalidInput {
                field: "amount".into(),
                reason: format!("{amount} cannot be represented as f64"),
            })?;
            items.push(ResolvedItem {
                kind: item.kind,
                amount,
                value,
                date,
                span,
                occurrences: item.occurrences,
                recurrence: item.recurrence,
            });
        }
        items.sort_by_key(|item| item.date);

        Ok(CompletedSchedule {
            start_date,
            basis: DiscountBasis::new(common_period),
            inference,
            items,
        })
    }
}
