//! Structured input/output surface for APR calculations.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{Ledger, LedgerEntry};
use crate::common_period::{self, PeriodInference};
use crate::error::AprError;
use crate::period::UnitPeriod;
use crate::schedule::{CompletedSchedule, LineItem, LineItemSeries};
use crate::solver::{solve, IterationRecord, SolverConfig};
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::AprResult;

const METHODOLOGY: &str =
    "Regulation Z Appendix J: actuarial APR with odd-day simple interest, 30-day months";

/// Input for an APR calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprInput {
    pub line_items: Vec<LineItem>,
    /// Common period to use instead of inferring one from the dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_period: Option<UnitPeriod>,
    /// Date that offsets are measured from, when no dated item is earlier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl AprInput {
    /// Builds an open series from the input's line items.
    pub fn to_series(&self) -> AprResult<LineItemSeries> {
        let mut series = LineItemSeries::new();
        if let Some(period) = self.common_period {
            series = series.with_common_period(period);
        }
        if let Some(date) = self.start_date {
            series = series.with_start_date(date);
        }
        for item in &self.line_items {
            series.add(item.clone())?;
        }
        Ok(series)
    }
}

/// Output of an APR calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprOutput {
    /// Annual percentage rate as a decimal (0.0694 = 6.94%)
    pub apr: Rate,
    /// APR in percent, rounded to two places
    pub apr_percent: Option<Decimal>,
    pub converged: bool,
    pub iterations: u32,
    pub final_balance: f64,
    pub common_period: UnitPeriod,
    /// False when the common period was supplied
    pub common_period_inferred: bool,
    pub periods_per_year: f64,
    pub days_per_period: u32,
    pub start_date: NaiveDate,
    pub line_items: Vec<LedgerEntry>,
    pub iteration_trace: Vec<IterationRecord>,
}

/// Calculate the APR of a line item schedule.
pub fn calculate_apr(input: &AprInput) -> AprResult<ComputationOutput<AprOutput>> {
    let start = Instant::now();
    let mut series = input.to_series()?;
    let schedule = series.complete()?;
    let mut warnings = schedule_warnings(schedule);

    let outcome = solve(schedule, &input.solver)?;
    if !outcome.converged {
        warnings.push(format!(
            "APR did not converge after {} iterations; final balance {} exceeds tolerance {}",
            outcome.iterations, outcome.ledger.final_balance, input.solver.tolerance
        ));
    }

    let output = AprOutput {
        apr: outcome.apr,
        apr_percent: Decimal::from_f64(outcome.apr * 100.0).map(|p| p.round_dp(2)),
        converged: outcome.converged,
        iterations: outcome.iterations,
        final_balance: outcome.ledger.final_balance,
        common_period: schedule.common_period(),
        common_period_inferred: input.common_period.is_none(),
        periods_per_year: schedule.basis.periods_per_year,
        days_per_period: schedule.basis.days_per_period,
        start_date: schedule.start_date,
        line_items: outcome.ledger.entries,
        iteration_trace: outcome.trace,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        &assumptions(schedule, &input.solver),
        warnings,
        elapsed,
        output,
    ))
}

/// Run a single amortization pass of the schedule at a fixed rate.
pub fn amortize_at_rate(input: &AprInput, rate: Rate) -> AprResult<ComputationOutput<Ledger>> {
    let start = Instant::now();
    let mut series = input.to_series()?;
    let schedule = series.complete()?;
    let warnings = schedule_warnings(schedule);
    let ledger = schedule.amortize(rate)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        &assumptions(schedule, &input.solver),
        warnings,
        elapsed,
        ledger,
    ))
}

/// Infer the common period of a set of dates.
pub fn infer_period(dates: &[NaiveDate]) -> AprResult<ComputationOutput<PeriodInference>> {
    let start = Instant::now();
    let inference = common_period::infer(dates).ok_or_else(|| {
        AprError::InsufficientData(
            "At least two distinct dates are needed to infer a common period".into(),
        )
    })?;

    let mut warnings = Vec::new();
    if inference.used_average {
        warnings.push(format!(
            "No dominant payment interval; common period {} taken from the average gap",
            inference.period
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Modal classification of gaps between consecutive distinct dates",
        &serde_json::json!({ "dates": dates.len() }),
        warnings,
        elapsed,
        inference,
    ))
}

fn assumptions(schedule: &CompletedSchedule, config: &SolverConfig) -> serde_json::Value {
    serde_json::json!({
        "common_period": schedule.common_period().to_string(),
        "start_date": schedule.start_date.to_string(),
        "initial_rate": config.initial_rate,
        "initial_step": config.initial_step,
        "tolerance": config.tolerance,
        "max_iterations": config.max_iterations,
    })
}

fn schedule_warnings(schedule: &CompletedSchedule) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(inference) = &schedule.inference {
        if inference.used_average {
            warnings.push(format!(
                "No dominant payment interval; common period {} taken from the average gap",
                inference.period
            ));
        }
    }

    let sign_changes = schedule
        .items
        .windows(2)
        .filter(|pair| pair[0].kind != pair[1].kind)
        .count();
    if sign_changes > 1 {
        warnings.push(format!(
            "Cash flows change direction {sign_changes} times; the rate search may not converge"
        ));
    }

    warnings
}
