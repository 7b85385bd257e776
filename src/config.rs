//! Application configuration.
//!
//! Values come from the host setup call and can be overridden through
//! environment variables.

use serde::{Deserialize, Serialize};

/// Overrides the application name
pub const APP_NAME_ENV: &str = "HOSTKIT_APP_NAME";

/// Overrides the application version
pub const APP_VERSION_ENV: &str = "HOSTKIT_APP_VERSION";

/// Marks the process as a non-interactive CLI run (suppresses progress traces)
pub const RUN_IN_CLI_ENV: &str = "HOSTKIT_RUN_IN_CLI";

/// Process-level application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    /// Running as a plain CLI command rather than a long-lived service
    #[serde(default)]
    pub run_in_cli: bool,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            run_in_cli: false,
        }
    }

    /// Build a config purely from environment variables.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Apply environment overrides on top of the current values.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(APP_NAME_ENV).filter(|v| !v.trim().is_empty()) {
            self.name = name;
        }
        if let Some(version) = lookup(APP_VERSION_ENV).filter(|v| !v.trim().is_empty()) {
            self.version = version;
        }
        if let Some(flag) = lookup(RUN_IN_CLI_ENV) {
            self.run_in_cli = is_truthy(&flag);
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_run_in_cli(mut self, run_in_cli: bool) -> Self {
        self.run_in_cli = run_in_cli;
        self
    }
}

/// "1", "true", "yes" and "on" (any case) count as enabled.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" yes "));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_overrides_replace_values() {
        let config = AppConfig::new("orders", "1.0.0").apply_overrides(lookup(&[
            (APP_NAME_ENV, "billing"),
            (RUN_IN_CLI_ENV, "yes"),
        ]));

        assert_eq!(config.name, "billing");
        assert_eq!(config.version, "1.0.0");
        assert!(config.run_in_cli);
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let config = AppConfig::new("orders", "1.0.0")
            .with_run_in_cli(true)
            .apply_overrides(lookup(&[(APP_VERSION_ENV, "  "), (RUN_IN_CLI_ENV, "0")]));

        assert_eq!(config.version, "1.0.0");
        assert!(!config.run_in_cli);
    }

    #[test]
    fn test_serialization() {
        let config = AppConfig::new("orders", "2.1.0").with_run_in_cli(true);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["name"], "orders");
        assert_eq!(json["runInCli"], true);

        let parsed: AppConfig =
            serde_json::from_str(r#"{"name":"orders","version":"2.1.0"}"#).unwrap();
        assert!(!parsed.run_in_cli);
    }
}
