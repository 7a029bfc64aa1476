use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level settings for an extraction run.
///
/// Per-site settings (URLs, strategy chains, timeouts) live in the sites
/// YAML file, not here.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub sites_path: PathBuf,
    pub diagnostics_dir: PathBuf,
    pub user_agent: String,
    /// Additional attempts for a query whose navigation failed.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `retry_backoff_base_ms * 2^attempt`.
    pub retry_backoff_base_ms: u64,
}
