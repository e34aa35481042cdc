//! Configuration module for Agent-Trawl
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving the search settings into the URL the crawl starts from.
//!
//! # Example
//!
//! ```no_run
//! use agent_trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("agent-trawl.toml")).unwrap();
//! println!("Will collect up to {} agents", config.crawler.max_results);
//! ```

mod parser;
mod search;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, IdentityConfig, OutputConfig, OutputFormat, SearchConfig,
};
pub(crate) use types::default_user_agents;

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use search::{resolve_start_url, region_identifier, DEFAULT_SEARCH_URL};
pub use validation::validate;
