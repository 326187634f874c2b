//! Directional step search for the rate that zeroes a schedule's balance.
//!
//! No derivative is used. The step starts at `initial_step`, shrinks tenfold
//! whenever the final balance changes sign between consecutive passes, and
//! is pointed so that a positive previous balance raises the rate and a
//! negative one lowers it.

use serde::{Deserialize, Serialize};

use crate::amortization::{amortize, Ledger};
use crate::error::AprError;
use crate::period::UnitPeriod;
use crate::schedule::{CompletedSchedule, LineItemSeries};
use crate::types::Rate;
use crate::AprResult;

pub const DEFAULT_INITIAL_STEP: f64 = 0.1;
pub const DEFAULT_TOLERANCE: f64 = 0.001;
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;
const STEP_SHRINK: f64 = 10.0;

/// Search parameters. The defaults reproduce the Regulation Z reference
/// behavior and should only be changed deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting rate guess.
    pub initial_rate: Rate,
    pub initial_step: f64,
    /// Largest absolute final balance accepted as zero.
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_rate: 0.0,
            initial_step: DEFAULT_INITIAL_STEP,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    pub fn with_initial_rate(mut self, rate: Rate) -> Self {
        self.initial_rate = rate;
        self
    }

    fn validate(&self) -> AprResult<()> {
        let invalid = |field: &str, reason: &str| AprError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        };
        if !self.initial_rate.is_finite() {
            return Err(invalid("initial_rate", "must be a finite number"));
        }
        if !self.initial_step.is_finite() || self.initial_step == 0.0 {
            return Err(invalid("initial_step", "must be a finite, non-zero number"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(invalid("tolerance", "must be a finite, non-negative number"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must allow at least one iteration"));
        }
        Ok(())
    }
}

/// One evaluated candidate rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    /// Step in effect when the rate was evaluated.
    pub step: f64,
    pub rate: Rate,
    pub final_balance: f64,
}

/// Result of a rate search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AprOutcome {
    /// The last rate evaluated; the solution when `converged`.
    pub apr: Rate,
    pub converged: bool,
    pub iterations: u32,
    /// Ledger of the last evaluated rate.
    pub ledger: Ledger,
    pub trace: Vec<IterationRecord>,
}

impl AprOutcome {
    pub fn final_balance(&self) -> f64 {
        self.ledger.final_balance
    }

    /// Turns a non-converged outcome into an error.
    pub fn require_converged(self) -> AprResult<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(AprError::ConvergenceFailure {
                iterations: self.iterations,
                final_balance: self.ledger.final_balance,
            })
        }
    }
}

fn opposite_signs(a: f64, b: f64) -> bool {
    (a < 0.0 && b > 0.0) || (a > 0.0 && b < 0.0)
}

/// Searches for the rate at which `schedule`'s final balance is within
/// tolerance of zero.
pub fn solve(schedule: &CompletedSchedule, config: &SolverConfig) -> AprResult<AprOutcome> {
    config.validate()?;

    let mut rate = config.initial_rate;
    let mut step = config.initial_step;
    let mut last_balance = 0.0;
    let mut trace = Vec::new();

    loop {
        let ledger = amortize(schedule, rate)?;
        let balance = ledger.final_balance;
        let iteration = trace.len() as u32 + 1;
        trace.push(IterationRecord {
            iteration,
            step,
            rate,
            final_balance: balance,
        });
        tracing::trace!(iteration, rate, step, balance, "apr iteration");

        let converged = balance.abs() <= config.tolerance;
        if converged || iteration >= config.max_iterations {
            if converged {
                tracing::debug!(iterations = iteration, apr = rate, "apr converged");
            } else {
                tracing::warn!(
                    iterations = iteration,
                    apr = rate,
                    final_balance = balance,
                    "apr did not converge"
                );
            }
            return Ok(AprOutcome {
                apr: rate,
                converged,
                iterations: iteration,
                ledger,
                trace,
            });
        }

        // crossed zero since the last pass: refine
        if opposite_signs(last_balance, balance) {
            step /= STEP_SHRINK;
        }
        if (last_balance < 0.0 && step > 0.0) || (last_balance > 0.0 && step < 0.0) {
            step = -step;
        }

        rate += step;
        last_balance = balance;
    }
}

/// Stateful front end over a [`LineItemSeries`]: completes the series on
/// first use and keeps the most recent outcome.
#[derive(Debug, Clone, Default)]
pub struct AprCalculator {
    series: Option<LineItemSeries>,
    config: SolverConfig,
    outcome: Option<AprOutcome>,
}

impl AprCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(series: LineItemSeries) -> Self {
        Self {
            series: Some(series),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_series(&mut self, series: LineItemSeries) {
        self.series = Some(series);
        self.outcome = None;
    }

    pub fn series(&self) -> Option<&LineItemSeries> {
        self.series.as_ref()
    }

    /// The series' common period: supplied before completion, resolved after.
    pub fn unit_period(&self) -> AprResult<Option<UnitPeriod>> {
        let series = self.series.as_ref().ok_or(AprError::MissingSeries)?;
        Ok(series.common_period())
    }

    pub fn set_unit_period(&mut self, period: UnitPeriod) -> AprResult<()> {
        let series = self.series.as_mut().ok_or(AprError::MissingSeries)?;
        series.set_common_period(period)
    }

    /// Calculates the APR starting from the configured initial rate.
    pub fn calculate(&mut self) -> AprResult<&AprOutcome> {
        self.run(self.config)
    }

    /// Calculates the APR starting from `starting_rate`.
    pub fn calculate_from(&mut self, starting_rate: Rate) -> AprResult<&AprOutcome> {
        self.run(self.config.with_initial_rate(starting_rate))
    }

    /// The outcome of the last calculation.
    pub fn outcome(&self) -> Option<&AprOutcome> {
        self.outcome.as_ref()
    }

    fn run(&mut self, config: SolverConfig) -> AprResult<&AprOutcome> {
        let series = self.series.as_mut().ok_or(AprError::MissingSeries)?;
        let schedule = series.complete()?;
        let outcome = solve(schedule, &config)?;
        Ok(self.outcome.insert(outcome))
    }
}
