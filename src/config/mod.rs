//! Configuration loading and management for the VR/VA Benefit Engine.
//!
//! This module provides functionality to load the run configuration from a
//! YAML file: processing month, cutoff day, the company/employee split,
//! excluded positions and where sources are read from and reports written to.
//!
//! # Example
//!
//! ```no_run
//! use vr_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/vr.yaml").unwrap();
//! println!("Cutoff day: {}", config.config().cutoff_day);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{MonthSettings, OutputConfig, RunConfig, SourceFiles};
