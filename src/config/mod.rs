//! Configuration loading and validation
//!
//! Trawler is configured from a single TOML file with one section per
//! component. Every field has a documented default, so a minimal config only
//! needs the storage path.

mod parser;
pub mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    Config, FetchConfig, FilterConfig, FrontierConfig, HostsConfig, RuleSet, StorageConfig,
};
pub use validation::validate;
