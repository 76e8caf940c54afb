pub mod account;
pub mod job;
pub mod login_activity;
