use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use apr_core::apr::{self, AprInput};
use apr_core::schedule::ScheduledBy;

use crate::input;

/// Arguments for common period inference
#[derive(Args)]
pub struct CommonPeriodArgs {
    /// Comma-separated dates, e.g. "2021-01-15,2021-02-15,2021-03-15"
    #[arg(long, value_delimiter = ',')]
    pub dates: Option<Vec<NaiveDate>>,

    /// Path to a JSON or YAML schedule whose dated line items are used
    #[arg(long)]
    pub input: Option<String>,
}

fn dated_items(schedule: &AprInput) -> Vec<NaiveDate> {
    schedule
        .line_items
        .iter()
        .filter_map(|item| match item.scheduled_by {
            ScheduledBy::Date(date) => Some(date),
            ScheduledBy::Offset(_) => None,
        })
        .collect()
}

pub fn run_common_period(args: CommonPeriodArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dates = if let Some(dates) = args.dates {
        dates
    } else if let Some(ref path) = args.input {
        let schedule: AprInput = input::file::read_input(path)?;
        dated_items(&schedule)
    } else if let Some(data) = input::stdin::read_stdin()? {
        let schedule: AprInput = serde_json::from_value(data)?;
        dated_items(&schedule)
    } else {
        return Err("--dates, --input <file> or a schedule on stdin is required".into());
    };

    let result = apr::infer_period(&dates)?;
    Ok(serde_json::to_value(result)?)
}
