use std::time::Duration;

use figment::providers::{Env, Serialized};
use figment::Figment;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::rules::errors::Error;
use crate::rules::Result;
use crate::utils::retry::RetryPolicy;

pub const CONFIG_ENV_PREFIX: &str = "RISK_SCANNER_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Substring identifying the rules table among the account's tables.
    pub rules_table_marker: String,
    /// Highest risk score a template may have and still pass the job.
    pub max_risk_score: u64,
    /// Wait after bootstrapping defaults before the rules table is scanned again.
    pub bootstrap_settle_ms: u64,
    /// Key prefix of scan reports in the output bucket.
    pub report_prefix: String,
    /// Ask the pipeline to re-invoke the job later instead of failing it when the rule
    /// or artifact store stays unavailable after retries. Only done once per job.
    pub continue_on_transient_failure: bool,
    pub retry: RetryPolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            rules_table_marker: "RulesTable".to_string(),
            max_risk_score: 0,
            bootstrap_settle_ms: 2_000,
            report_prefix: "risk-scanner".to_string(),
            continue_on_transient_failure: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl ScannerConfig {
    /// Defaults overridden by `RISK_SCANNER_*` variables, `__` separating nested keys
    /// (e.g. `RISK_SCANNER_RETRY__MAX_ATTEMPTS`).
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(ScannerConfig::default()))
            .merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"))
    }

    pub fn from_env() -> Result<ScannerConfig> {
        let config: ScannerConfig = Self::figment().extract()?;
        config.validate()?;
        debug!("Scanner configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules_table_marker.trim().is_empty() {
            return Err(Error::ConfigError(
                "rules_table_marker must not be empty".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::ConfigError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bootstrap_settle(&self) -> Duration {
        Duration::from_millis(self.bootstrap_settle_ms)
    }
}
