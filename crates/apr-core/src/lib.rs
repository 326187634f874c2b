pub mod amortization;
pub mod apr;
pub mod common_period;
pub mod dates;
pub mod error;
pub mod period;
pub mod present_value;
pub mod schedule;
pub mod solver;
pub mod types;

pub use error::AprError;
pub use types::*;

/// Standard result type for all APR operations
pub type AprResult<T> = Result<T, AprError>;
