pub mod config;
pub mod loader;
pub mod service;
pub mod telemetry;
