// Fee calculation orchestration
pub mod fee_service;

pub use fee_service::{FeeRun, FeeService, calculate_fees};
