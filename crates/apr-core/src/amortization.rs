//! One amortization pass: discount every line item at a candidate rate and
//! fold the present values into a running balance.
//!
//! The pass reads a [`CompletedSchedule`] and returns a fresh [`Ledger`]; the
//! schedule is never mutated, so passes at different rates may run
//! concurrently over the same schedule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::UnitPeriod;
use crate::present_value::{pvif, pvifa};
use crate::schedule::{CompletedSchedule, LineItemKind};
use crate::types::{Factor, Money, Rate};
use crate::AprResult;

/// Per-item result of an amortization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: LineItemKind,
    pub date: NaiveDate,
    /// Signed amount.
    pub amount: Money,
    pub periods: i32,
    pub odd_days: i32,
    pub occurrences: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_period: Option<UnitPeriod>,
    pub present_value_factor: Factor,
    pub present_value: f64,
    /// Running balance including this item.
    pub balance: f64,
}

/// Immutable outcome of discounting a schedule at one rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub rate: Rate,
    pub entries: Vec<LedgerEntry>,
    pub final_balance: f64,
}

/// Discounts every item of `schedule` at `rate`, in date order.
pub fn amortize(schedule: &CompletedSchedule, rate: Rate) -> AprResult<Ledger> {
    let basis = &schedule.basis;
    let days_per_period = f64::from(basis.days_per_period);
    let mut entries = Vec::with_capacity(schedule.items.len());
    let mut running_balance = 0.0;

    for item in &schedule.items {
        let present_value_factor = match item.recurrence {
            Some(recurrence) if item.occurrences > 1 => pvifa(
                schedule.start_date,
                item.date,
                &recurrence,
                rate,
                basis,
                item.occurrences,
            )?,
            _ => pvif(&item.span, rate, basis.periods_per_year, days_per_period),
        };
        let present_value = item.value * present_value_factor;
        running_balance += present_value;

        entries.push(LedgerEntry {
            kind: item.kind,
            date: item.date,
            amount: item.amount,
            periods: item.span.periods,
            odd_days: item.span.odd_days,
            occurrences: item.occurrences,
            recurrence_period: item.recurrence,
            present_value_factor,
            present_value,
            balance: running_balance,
        });
    }

    Ok(Ledger {
        rate,
        entries,
        final_balance: running_balance,
    })
}

impl CompletedSchedule {
    /// Runs an amortization pass at `rate`.
    pub fn amortize(&self, rate: Rate) -> AprResult<Ledger> {
        amortize(self, rate)
    }
}
