//! Configuration module
//!
//! Settings for the API endpoint, export destination and display
//! preferences, persisted as TOML.

pub mod config;

pub use config::Config;
