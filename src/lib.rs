// Library exports for the binary and tests
pub mod config;
pub mod db;
pub mod models;
pub mod services;
