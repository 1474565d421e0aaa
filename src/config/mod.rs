//! Configuration module for Jobtide
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is built once at startup and passed by reference.
//!
//! # Example
//!
//! ```no_run
//! use jobtide::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("jobtide.toml")).unwrap();
//! println!("Keywords: {:?}", config.crawler.keywords);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, EngineKind, NotifierConfig, OutputConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
