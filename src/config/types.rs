use serde::Deserialize;

/// Main configuration structure for Trawler
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub hosts: HostsConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

impl Config {
    /// Applies cold-start `--init` mode: batch sizes forced to 1, cache
    /// preloading and adaptive batch growth disabled. A safe conservative
    /// first run against an empty store.
    pub fn apply_init_mode(&mut self) {
        self.hosts.batch_size = 1;
        self.frontier.batch_size = 1;
        self.frontier.max_pending_writes = 1;
        self.frontier.auto_grow_batch_size = false;
        self.frontier.preload_known_urls = false;
    }
}

/// Backing store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Host registry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct HostsConfig {
    /// Minimum milliseconds between dequeues of the same host
    #[serde(default = "default_crawl_delay_ms")]
    pub crawl_delay_ms: u64,

    /// Milliseconds between refreshes of a host's robots.txt and status
    #[serde(default = "default_host_refresh_period_ms")]
    pub host_refresh_period_ms: u64,

    /// Maximum size of the in-memory known-hostnames cache
    #[serde(default = "default_max_known_hosts")]
    pub max_known_hosts: usize,

    /// Number of hosts fetched from the store per batch
    #[serde(default = "default_hosts_batch_size")]
    pub batch_size: usize,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            crawl_delay_ms: default_crawl_delay_ms(),
            host_refresh_period_ms: default_host_refresh_period_ms(),
            max_known_hosts: default_max_known_hosts(),
            batch_size: default_hosts_batch_size(),
        }
    }
}

/// URL frontier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FrontierConfig {
    /// Size of the rotating host cache and of per-host URL batches
    #[serde(default = "default_frontier_batch_size")]
    pub batch_size: usize,

    /// Ceiling for adaptive batch growth
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Grow the batch size by one after each on-time full rotation.
    /// A throughput heuristic, not a correctness requirement.
    #[serde(default = "default_true")]
    pub auto_grow_batch_size: bool,

    /// Politeness budget per full rotation of the host cache (milliseconds)
    #[serde(default = "default_crawl_delay_ms")]
    pub crawl_delay_ms: u64,

    /// Pending URL upserts buffered before a batched write is issued
    #[serde(default = "default_max_pending_writes")]
    pub max_pending_writes: usize,

    /// Maximum size of the in-memory known-URLs cache
    #[serde(default = "default_max_known_urls")]
    pub max_known_urls: usize,

    /// Preload the known-URLs cache from the store at startup
    #[serde(default)]
    pub preload_known_urls: bool,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            batch_size: default_frontier_batch_size(),
            max_batch_size: default_max_batch_size(),
            auto_grow_batch_size: true,
            crawl_delay_ms: default_crawl_delay_ms(),
            max_pending_writes: default_max_pending_writes(),
            max_known_urls: default_max_known_urls(),
            preload_known_urls: false,
        }
    }
}

/// Page fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Identifying user agent, also checked against robots.txt rules
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Content-Type values accepted for storage
    #[serde(default = "default_accept_content_types")]
    pub accept_content_types: Vec<String>,

    /// Content-Language tags accepted for storage (primary subtag matches)
    #[serde(default = "default_accept_languages")]
    pub accept_languages: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            accept_content_types: default_accept_content_types(),
            accept_languages: default_accept_languages(),
        }
    }
}

/// Link filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// File extension rules: accept is an allowlist override, reject a denylist
    #[serde(default)]
    pub extensions: RuleSet,

    /// URL scheme rules, same semantics as extensions
    #[serde(default)]
    pub schemes: RuleSet,

    /// Domain rules: must match an accept pattern (empty accept = all) AND
    /// match no reject pattern. Patterns are partial hostnames, dot-anchored.
    #[serde(default)]
    pub domains: RuleSet,

    /// Maximum size of the memoized domain-verdict cache
    #[serde(default = "default_max_domain_cache")]
    pub max_domain_cache: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extensions: RuleSet::default(),
            schemes: RuleSet::default(),
            domains: RuleSet::default(),
            max_domain_cache: default_max_domain_cache(),
        }
    }
}

/// An accept/reject pattern pair used by the link filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default)]
    pub accept: Vec<String>,
    #[serde(default)]
    pub reject: Vec<String>,
}

fn default_database_path() -> String {
    "./trawler.db".to_string()
}

fn default_crawl_delay_ms() -> u64 {
    10_000
}

fn default_host_refresh_period_ms() -> u64 {
    24 * 60 * 60 * 1000
}

fn default_max_known_hosts() -> usize {
    4000
}

fn default_hosts_batch_size() -> usize {
    100
}

fn default_frontier_batch_size() -> usize {
    8
}

fn default_max_batch_size() -> usize {
    32
}

fn default_max_pending_writes() -> usize {
    200
}

fn default_max_known_urls() -> usize {
    200_000
}

fn default_user_agent() -> String {
    "Trawler/1.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_accept_content_types() -> Vec<String> {
    vec![
        "text/html".to_string(),
        "application/xhtml+xml".to_string(),
        "application/xml".to_string(),
    ]
}

fn default_accept_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_max_domain_cache() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}
