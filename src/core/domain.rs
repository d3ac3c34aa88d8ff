use std::time::Duration as StdDuration;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryError, LibraryResult};

pub const CONFIG_ENV: &str = "CIRCULATION_CONFIG";

// upper bounds keep every date computed from the policy far inside chrono's range
const MAX_PERIOD_DAYS: i64 = 3650;
const MAX_LEASE_SECS: i64 = 3600;

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
}

// rejects blank identifiers before any lock is taken
pub fn validate_id(field: &str, value: &str) -> LibraryResult<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::validation(format!("{} is required", field).as_str(), Some("400".to_string())));
    }
    Ok(())
}

// Configuration abstracts the institution-level circulation policy. It is passed to every
// service at construction instead of being looked up from the environment by the logic.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub max_holds: i64,
    pub loan_period_days: i64,
    pub hold_window_days: i64,
    pub lock_timeout_ms: u64,
    pub lock_lease_secs: i64,
    pub sweep_page_size: usize,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            max_holds: 4,
            loan_period_days: 21,
            hold_window_days: 7,
            lock_timeout_ms: 2000,
            lock_lease_secs: 30,
            sweep_page_size: 100,
        }
    }

    // parses a JSON document of overrides on top of the defaults for the branch
    pub fn from_json(branch_id: &str, json: &str) -> LibraryResult<Self> {
        let mut value = serde_json::to_value(Configuration::new(branch_id))?;
        let overrides: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(target), Some(source)) = (value.as_object_mut(), overrides.as_object()) {
            for (k, v) in source {
                target.insert(k.to_string(), v.clone());
            }
        } else {
            return Err(LibraryError::validation("configuration overrides must be a JSON object", None));
        }
        let config: Configuration = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    // overrides come from CIRCULATION_CONFIG when it is set
    pub fn from_env(branch_id: &str) -> LibraryResult<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(json) if !json.trim().is_empty() => Configuration::from_json(branch_id, json.as_str()),
            _ => Ok(Configuration::new(branch_id)),
        }
    }

    pub fn with_loan_period_days(mut self, days: i64) -> Self {
        self.loan_period_days = days;
        self
    }

    pub fn with_hold_window_days(mut self, days: i64) -> Self {
        self.hold_window_days = days;
        self
    }

    pub fn with_max_holds(mut self, max_holds: i64) -> Self {
        self.max_holds = max_holds;
        self
    }

    pub fn with_lock_timeout_ms(mut self, timeout: u64) -> Self {
        self.lock_timeout_ms = timeout;
        self
    }

    pub fn validate(&self) -> LibraryResult<()> {
        if !(1..=MAX_PERIOD_DAYS).contains(&self.loan_period_days) || !(1..=MAX_PERIOD_DAYS).contains(&self.hold_window_days) {
            return Err(LibraryError::validation(
                format!("loan period and hold window must be between 1 and {} days", MAX_PERIOD_DAYS).as_str(), None));
        }
        if self.lock_timeout_ms == 0 || !(1..=MAX_LEASE_SECS).contains(&self.lock_lease_secs) {
            return Err(LibraryError::validation(
                format!("lock timeout must be positive and lock lease between 1 and {} seconds", MAX_LEASE_SECS).as_str(), None));
        }
        if self.max_holds <= 0 || self.sweep_page_size == 0 {
            return Err(LibraryError::validation("max holds and sweep page size must be positive", None));
        }
        Ok(())
    }

    pub fn loan_period(&self) -> Duration {
        Duration::days(self.loan_period_days)
    }

    pub fn hold_window(&self) -> Duration {
        Duration::days(self.hold_window_days)
    }

    pub fn lock_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.lock_timeout_ms)
    }

    pub fn lock_lease(&self) -> Duration {
        Duration::seconds(self.lock_lease_secs)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::domain::Configuration;

    #[tokio::test]
    async fn test_should_build_config() {
        let config = Configuration::new("test");
        assert_eq!(4, config.max_holds);
        assert_eq!(21, config.loan_period_days);
        assert_eq!(7, config.hold_window_days);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_should_apply_config_overrides() {
        let config = Configuration::new("test")
            .with_loan_period_days(14)
            .with_hold_window_days(3)
            .with_max_holds(2)
            .with_lock_timeout_ms(10);
        assert_eq!(14, config.loan_period().num_days());
        assert_eq!(3, config.hold_window().num_days());
        assert_eq!(2, config.max_holds);
        assert_eq!(10, config.lock_timeout().as_millis());
    }

    #[tokio::test]
    async fn test_should_override_config_from_json() {
        let config = Configuration::from_json("test", r#"{"hold_window_days": 3, "lock_timeout_ms": 50}"#)
            .expect("should parse config");
        assert_eq!("test", config.branch_id.as_str());
        assert_eq!(3, config.hold_window_days);
        assert_eq!(50, config.lock_timeout_ms);
        assert_eq!(21, config.loan_period_days);
    }

    #[tokio::test]
    async fn test_should_reject_invalid_config() {
        assert!(Configuration::from_json("test", r#"{"hold_window_days": 0}"#).is_err());
        assert!(Configuration::from_json("test", r#"[1, 2]"#).is_err());
        assert!(Configuration::from_json("test", r#"{"hold_window_days": 100000000}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"hold_window_days": 3651}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"hold_window_days": 3650}"#).is_ok());
        assert!(Configuration::from_json("test", r#"{"loan_period_days": 0}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"loan_period_days": 3651}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"lock_timeout_ms": 0}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"lock_lease_secs": 0}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"lock_lease_secs": -5}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"lock_lease_secs": 3601}"#).is_err());
        assert!(Configuration::from_json("test", r#"{"max_holds": 0}"#).is_err());
    }
}
