use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use apr_core::apr::{self, AprInput};
use apr_core::period::UnitPeriod;

use crate::input;

/// Arguments for an APR calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to a JSON or YAML schedule (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Common period tag such as 1M, 2W or 1Y (inferred when omitted)
    #[arg(long)]
    pub common_period: Option<UnitPeriod>,

    /// Date that period offsets are measured from
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Starting rate guess as a decimal
    #[arg(long, allow_hyphen_values = true)]
    pub initial_rate: Option<f64>,

    /// Initial rate step
    #[arg(long, allow_hyphen_values = true)]
    pub initial_step: Option<f64>,

    /// Largest final balance accepted as zero
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Maximum number of amortization passes
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Include the per-iteration trace in the output
    #[arg(long)]
    pub trace: bool,
}

/// Loads a schedule from `--input` or stdin.
pub fn load_schedule(path: Option<&str>) -> Result<AprInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input <file.json|file.yaml> or a schedule on stdin is required".into())
    }
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut apr_input = load_schedule(args.input.as_deref())?;

    if let Some(period) = args.common_period {
        apr_input.common_period = Some(period);
    }
    if let Some(date) = args.start_date {
        apr_input.start_date = Some(date);
    }
    let solver = &mut apr_input.solver;
    if let Some(rate) = args.initial_rate {
        solver.initial_rate = rate;
    }
    if let Some(step) = args.initial_step {
        solver.initial_step = step;
    }
    if let Some(tolerance) = args.tolerance {
        solver.tolerance = tolerance;
    }
    if let Some(max_iterations) = args.max_iterations {
        solver.max_iterations = max_iterations;
    }

    let result = apr::calculate_apr(&apr_input)?;
    let mut value = serde_json::to_value(result)?;
    if !args.trace {
        if let Some(Value::Object(result)) = value.get_mut("result") {
            result.remove("iteration_trace");
        }
    }
    Ok(value)
}
