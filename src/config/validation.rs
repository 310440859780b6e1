use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Catches values that would stall or break the schedulers before any
/// process starts polling.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.storage.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.database-path must not be empty".to_string(),
        ));
    }

    if config.hosts.batch_size == 0 {
        return Err(ConfigError::Validation(
            "hosts.batch-size must be at least 1".to_string(),
        ));
    }

    if config.frontier.batch_size == 0 {
        return Err(ConfigError::Validation(
            "frontier.batch-size must be at least 1".to_string(),
        ));
    }

    if config.frontier.max_batch_size < config.frontier.batch_size {
        return Err(ConfigError::Validation(format!(
            "frontier.max-batch-size ({}) must not be smaller than frontier.batch-size ({})",
            config.frontier.max_batch_size, config.frontier.batch_size
        )));
    }

    if config.frontier.max_pending_writes == 0 {
        return Err(ConfigError::Validation(
            "frontier.max-pending-writes must be at least 1".to_string(),
        ));
    }

    if config.fetch.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch.request-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.fetch.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fetch.user-agent must not be empty".to_string(),
        ));
    }

    for pattern in config
        .filters
        .domains
        .accept
        .iter()
        .chain(config.filters.domains.reject.iter())
    {
        if pattern.trim_matches('.').is_empty() {
            return Err(ConfigError::Validation(format!(
                "filters.domains pattern {:?} has no hostname part",
                pattern
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = Config::default();
        config.frontier.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_max_batch_below_batch_rejected() {
        let mut config = Config::default();
        config.frontier.batch_size = 8;
        config.frontier.max_batch_size = 4;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_dots_only_domain_pattern_rejected() {
        let mut config = Config::default();
        config.filters.domains.reject = vec!["..".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_anchored_domain_patterns_accepted() {
        let mut config = Config::default();
        config.filters.domains.accept = vec![".nz".to_string(), "www.example.".to_string()];
        config.filters.domains.reject = vec![".google.".to_string()];
        assert!(validate(&config).is_ok());
    }
}
