//! Orchestrator configuration
//!
//! Defines every tunable of the orchestrator: the deadline, strategy sizing,
//! the valid categories, the article source and the completion pipeline.

use std::time::Duration;

use crate::service::job::looks_like_email;
use crate::service::{RetryPolicy, SupervisorSettings};
use crate::source::category::DEFAULT_CATEGORIES;
use crate::strategy::StrategySettings;

/// Orchestrator configuration
///
/// Read once at startup and never changed afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Hard ceiling on a job's processing time
    pub max_duration: Duration,

    /// Subtracted from `max_duration` to get the cancellation deadline
    pub safety_margin: Duration,

    /// How long a cancelled strategy may keep running before it is dropped
    pub cancel_grace: Duration,

    /// Categories a submission may ask for, canonical spelling
    pub categories: Vec<String>,

    /// Contact used when a submission carries none
    pub default_contact: Option<String>,

    /// Root URL of the blog
    pub source_url: String,

    /// Per-request timeout against the blog
    pub request_timeout: Duration,

    /// Worker count of the bounded strategy
    pub pool_size: usize,

    /// In-flight cap of the concurrent strategy
    pub concurrency_cap: usize,

    /// Directory exported result files are written to
    pub export_dir: String,

    /// Public URL under which `export_dir` is served, if any
    pub export_base_url: Option<String>,

    pub export_attempts: u32,
    pub export_backoff: Duration,
    pub export_backoff_max: Duration,

    /// Timeout of the webhook call
    pub notify_timeout: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional (see [`Config::default`]):
    /// - QUARRY_BIND_ADDR (default: 0.0.0.0:8000)
    /// - QUARRY_MAX_DURATION (seconds, default: 300)
    /// - QUARRY_SAFETY_MARGIN (seconds, default: 1)
    /// - QUARRY_CANCEL_GRACE_MS (milliseconds, default: 500)
    /// - QUARRY_CATEGORIES (comma separated)
    /// - QUARRY_DEFAULT_CONTACT
    /// - QUARRY_SOURCE_URL (default: https://xepelin.com)
    /// - QUARRY_REQUEST_TIMEOUT (seconds, default: 30)
    /// - QUARRY_POOL_SIZE (default: 5)
    /// - QUARRY_CONCURRENCY_CAP (default: 10)
    /// - QUARRY_EXPORT_DIR (default: exports)
    /// - QUARRY_EXPORT_BASE_URL
    /// - QUARRY_EXPORT_ATTEMPTS (default: 3)
    /// - QUARRY_EXPORT_BACKOFF / QUARRY_EXPORT_BACKOFF_MAX (seconds, default: 4 / 10)
    /// - QUARRY_NOTIFY_TIMEOUT (seconds, default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: var("QUARRY_BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_duration: secs("QUARRY_MAX_DURATION").unwrap_or(defaults.max_duration),
            safety_margin: secs("QUARRY_SAFETY_MARGIN").unwrap_or(defaults.safety_margin),
            cancel_grace: parsed::<u64>("QUARRY_CANCEL_GRACE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.cancel_grace),
            categories: var("QUARRY_CATEGORIES")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.categories),
            default_contact: var("QUARRY_DEFAULT_CONTACT"),
            source_url: var("QUARRY_SOURCE_URL").unwrap_or(defaults.source_url),
            request_timeout: secs("QUARRY_REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            pool_size: parsed("QUARRY_POOL_SIZE").unwrap_or(defaults.pool_size),
            concurrency_cap: parsed("QUARRY_CONCURRENCY_CAP").unwrap_or(defaults.concurrency_cap),
            export_dir: var("QUARRY_EXPORT_DIR").unwrap_or(defaults.export_dir),
            export_base_url: var("QUARRY_EXPORT_BASE_URL"),
            export_attempts: parsed("QUARRY_EXPORT_ATTEMPTS").unwrap_or(defaults.export_attempts),
            export_backoff: secs("QUARRY_EXPORT_BACKOFF").unwrap_or(defaults.export_backoff),
            export_backoff_max: secs("QUARRY_EXPORT_BACKOFF_MAX")
                .unwrap_or(defaults.export_backoff_max),
            notify_timeout: secs("QUARRY_NOTIFY_TIMEOUT").unwrap_or(defaults.notify_timeout),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_duration.is_zero() {
            anyhow::bail!("max_duration must be greater than 0");
        }

        if self.safety_margin >= self.max_duration {
            anyhow::bail!("safety_margin must be smaller than max_duration");
        }

        if self.pool_size == 0 {
            anyhow::bail!("pool_size must be greater than 0");
        }

        if self.concurrency_cap == 0 {
            anyhow::bail!("concurrency_cap must be greater than 0");
        }

        if self.categories.is_empty() {
            anyhow::bail!("at least one category must be configured");
        }

        if self.export_attempts == 0 {
            anyhow::bail!("export_attempts must be greater than 0");
        }

        if !self.source_url.starts_with("http://") && !self.source_url.starts_with("https://") {
            anyhow::bail!("source_url must start with http:// or https://");
        }

        if let Some(contact) = &self.default_contact {
            if !looks_like_email(contact) {
                anyhow::bail!("default_contact is not a valid email address: {contact}");
            }
        }

        Ok(())
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            max_duration: self.max_duration,
            safety_margin: self.safety_margin,
            cancel_grace: self.cancel_grace,
        }
    }

    pub fn strategy_settings(&self) -> StrategySettings {
        StrategySettings {
            pool_size: self.pool_size,
            concurrency_cap: self.concurrency_cap,
            cancel_grace: self.cancel_grace,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.export_attempts,
            backoff: self.export_backoff,
            max_backoff: self.export_backoff_max,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            max_duration: Duration::from_secs(300),
            safety_margin: Duration::from_secs(1),
            cancel_grace: Duration::from_millis(500),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            default_contact: None,
            source_url: "https://xepelin.com".to_string(),
            request_timeout: Duration::from_secs(30),
            pool_size: 5,
            concurrency_cap: 10,
            export_dir: "exports".to_string(),
            export_base_url: None,
            export_attempts: 3,
            export_backoff: Duration::from_secs(4),
            export_backoff_max: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(10),
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    var(name).and_then(|s| s.parse::<T>().ok())
}

fn secs(name: &str) -> Option<Duration> {
    parsed::<u64>(name).map(Duration::from_secs)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_duration, Duration::from_secs(300));
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.concurrency_cap, 10);
        assert_eq!(config.categories.len(), 7);
        assert_eq!(config.supervisor_settings().deadline(), Duration::from_secs(299));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.safety_margin = config.max_duration;
        assert!(config.validate().is_err());
        config.safety_margin = Duration::from_secs(1);

        config.pool_size = 0;
        assert!(config.validate().is_err());
        config.pool_size = 5;

        config.categories.clear();
        assert!(config.validate().is_err());
        config.categories = vec!["pymes".to_string()];

        config.default_contact = Some("not-an-address".to_string());
        assert!(config.validate().is_err());
        config.default_contact = Some("ops@example.com".to_string());
        assert!(config.validate().is_ok());

        config.source_url = "xepelin.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" pymes, corporativos ,,xepelin "),
            vec!["pymes", "corporativos", "xepelin"]
        );
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = Config {
            export_attempts: 5,
            ..Config::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
    }
}
