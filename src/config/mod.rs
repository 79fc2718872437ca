//! Engine settings for medprice
//!
//! This module handles loading, parsing, and validating the TOML settings file.
//! The pharmacy source catalog itself lives in [`crate::catalog`].
//!
//! # Example
//!
//! ```no_run
//! use medprice::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("medprice.toml")).unwrap();
//! println!("Retries per source: {}", config.engine.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, EngineConfig, MatchingConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, content_hash, load_config, load_config_with_hash, parse_config,
};
