use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use apr_core::apr;
use apr_core::period::UnitPeriod;

use super::calculate::load_schedule;

/// Arguments for a single amortization pass
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to a JSON or YAML schedule (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual rate as a decimal (0.12 = 12%)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: f64,

    /// Common period tag such as 1M, 2W or 1Y (inferred when omitted)
    #[arg(long)]
    pub common_period: Option<UnitPeriod>,

    /// Date that period offsets are measured from
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if !args.rate.is_finite() {
        return Err("--rate must be a finite number".into());
    }
    let mut apr_input = load_schedule(args.input.as_deref())?;
    if let Some(period) = args.common_period {
        apr_input.common_period = Some(period);
    }
    if let Some(date) = args.start_date {
        apr_input.start_date = Some(date);
    }

    let result = apr::amortize_at_rate(&apr_input, args.rate)?;
    Ok(serde_json::to_value(result)?)
}
