pub mod client;
pub mod solver;
pub mod waf_bypass;

pub use client::{CheckInResult, HttpClient, RetryConfig};
pub use solver::{SolverMethod, TurnstileSolver};
pub use waf_bypass::{BypassData, WafBypassService};
