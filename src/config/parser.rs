use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, parses, and validates a configuration file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Used to detect configuration changes between runs of the crawl processes.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[storage]
database-path = "./crawl.db"

[hosts]
crawl-delay-ms = 20000
batch-size = 50

[frontier]
batch-size = 4
max-batch-size = 16

[fetch]
user-agent = "TestBot/1.0"

[filters.domains]
accept = [".nz"]
reject = [".google."]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.storage.database_path, "./crawl.db");
        assert_eq!(config.hosts.crawl_delay_ms, 20_000);
        assert_eq!(config.hosts.batch_size, 50);
        assert_eq!(config.frontier.batch_size, 4);
        assert_eq!(config.fetch.user_agent, "TestBot/1.0");
        assert_eq!(config.filters.domains.accept, vec![".nz"]);
    }

    #[test]
    fn test_empty_config_gets_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.hosts.batch_size, 100);
        assert_eq!(config.frontier.batch_size, 8);
        assert_eq!(config.frontier.max_batch_size, 32);
        assert!(config.frontier.auto_grow_batch_size);
        assert_eq!(config.fetch.request_timeout_secs, 10);
        assert!(config
            .fetch
            .accept_content_types
            .contains(&"text/html".to_string()));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[frontier]\nbatch-size = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_init_mode_forces_conservative_settings() {
        let file = create_temp_config("[frontier]\npreload-known-urls = true\n");
        let mut config = load_config(file.path()).unwrap();
        config.apply_init_mode();

        assert_eq!(config.frontier.batch_size, 1);
        assert_eq!(config.hosts.batch_size, 1);
        assert_eq!(config.frontier.max_pending_writes, 1);
        assert!(!config.frontier.auto_grow_batch_size);
        assert!(!config.frontier.preload_known_urls);
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
