mod check_in_executor;

pub use check_in_executor::{AccountOutcome, CheckInExecutor};
