pub mod activity;
pub mod activity_groups;
pub mod dashboard;
pub mod debug_log;
pub mod expansion;
pub mod render;
