//! Login risk scoring: rule-based heuristics over an account's login history.
//!
//! The scorer annotates successful logins, it never blocks them — every
//! failure path inside this module degrades to "not suspicious".

pub mod scorer;
pub mod tracker;

pub use scorer::RiskConfig;
pub use tracker::{LoginTracker, TestOverrides};
