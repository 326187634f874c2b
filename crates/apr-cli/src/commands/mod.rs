pub mod amortize;
pub mod calculate;
pub mod common_period;
