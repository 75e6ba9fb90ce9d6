pub mod activity;
pub mod repair;
