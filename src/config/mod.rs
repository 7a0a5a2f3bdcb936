//! Configuration module for Shelter-Scrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelter_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shelter.toml")).unwrap();
//! println!("Scraping {} sources", config.sources.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, PageOrder, ParserConfig, ScraperConfig, SourceConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
