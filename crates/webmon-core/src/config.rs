//! webmon.json / webmon.toml policy document parser.
//!
//! The document nests everything under a `webmonconfig` table:
//!
//! ```json
//! {
//!   "webmonconfig": {
//!     "waittime": 2000,
//!     "http200": { "retrytimes": 0, "action": "nothing" },
//!     "http500": { "retrytimes": 1, "action": "restart" },
//!     "timeout": { "retrytimes": 2, "action": "restart" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::policy::{Action, Policy, PolicyEntry};
use crate::types::OutcomeKey;

/// Top-level config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebmonConfig {
    pub webmonconfig: MonitorSection,
}

/// The `webmonconfig` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    /// Probe timeout in milliseconds.
    pub waittime: u64,
    /// Pause between retries in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryinterval: Option<u64>,
    /// Pause between cycles in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollinterval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthykey: Option<String>,
    /// Every other key is an outcome key.
    #[serde(flatten)]
    pub outcomes: BTreeMap<String, OutcomeSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeSection {
    #[serde(default)]
    pub retrytimes: u32,
    #[serde(default)]
    pub action: Action,
}

impl WebmonConfig {
    /// Read a config file, picking the parser from its extension.
    ///
    /// Files without an extension are parsed as JSON.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            None | Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the document and build the immutable [`Policy`].
    pub fn into_policy(self) -> ConfigResult<Policy> {
        let section = self.webmonconfig;
        if section.waittime == 0 {
            return Err(ConfigError::ZeroWaitTime);
        }

        let mut policy = Policy::new(Duration::from_millis(section.waittime));
        if let Some(ms) = section.retryinterval {
            policy = policy.with_retry_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = section.pollinterval {
            policy = policy.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(raw) = section.healthykey.as_deref() {
            policy = policy.with_healthy_key(OutcomeKey::parse(raw)?);
        }

        for (raw, outcome) in section.outcomes {
            let key = OutcomeKey::parse(&raw)?;
            debug!(%key, retrytimes = outcome.retrytimes, action = ?outcome.action, "policy entry");
            policy = policy.with_entry(key, PolicyEntry::new(outcome.retrytimes, outcome.action));
        }

        Ok(policy)
    }
}

/// Load and validate the policy at `path`.
pub fn load_policy(path: &Path) -> ConfigResult<Policy> {
    WebmonConfig::from_file(path)?.into_policy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbeOutcome;
    use std::io::Write;

    const SAMPLE_JSON: &str = r#"
{
  "webmonconfig": {
    "waittime": 2000,
    "http200": { "retrytimes": 0, "action": "nothing" },
    "http500": { "retrytimes": 1, "action": "restart" },
    "timeout": { "retrytimes": 2, "action": "restart" }
  }
}
"#;

    #[test]
    fn parse_json_document() {
        let policy = WebmonConfig::from_json(SAMPLE_JSON).unwrap().into_policy().unwrap();
        assert_eq!(policy.wait_time, Duration::from_millis(2000));
        assert_eq!(policy.len(), 3);

        let entry = policy.lookup(&OutcomeKey::from(ProbeOutcome::Status(500)));
        assert_eq!(entry, PolicyEntry::new(1, Action::Restart));

        let entry = policy.lookup(&OutcomeKey::from(ProbeOutcome::Timeout));
        assert_eq!(entry.max_attempts(), 3);
    }

    #[test]
    fn parse_toml_document() {
        let toml_str = r#"
[webmonconfig]
waittime = 1500
pollinterval = 250

[webmonconfig.http403]
retrytimes = 3
action = "restart"
"#;
        let policy = WebmonConfig::from_toml(toml_str).unwrap().into_policy().unwrap();
        assert_eq!(policy.wait_time, Duration::from_millis(1500));
        assert_eq!(policy.poll_interval, Duration::from_millis(250));
        assert_eq!(
            policy.lookup(&OutcomeKey::from(ProbeOutcome::Status(403))),
            PolicyEntry::new(3, Action::Restart)
        );
    }

    #[test]
    fn omitted_fields_default() {
        let json = r#"{ "webmonconfig": { "waittime": 100, "error": {} } }"#;
        let policy = WebmonConfig::from_json(json).unwrap().into_policy().unwrap();
        assert!(policy.contains(&OutcomeKey::from(ProbeOutcome::Error)));
        assert_eq!(
            policy.lookup(&OutcomeKey::from(ProbeOutcome::Error)),
            PolicyEntry::default()
        );
        assert_eq!(policy.retry_interval, Duration::from_secs(1));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let json = r#"{ "webmonconfig": { "waittime": 100, "http500": { "action": "reboot" } } }"#;
        assert!(matches!(WebmonConfig::from_json(json), Err(ConfigError::Json(_))));
    }

    #[test]
    fn invalid_outcome_key_is_rejected() {
        let json = r#"{ "webmonconfig": { "waittime": 100, "http5000": { "retrytimes": 1 } } }"#;
        let err = WebmonConfig::from_json(json).unwrap().into_policy().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOutcomeKey(key) if key == "http5000"));
    }

    #[test]
    fn zero_waittime_is_rejected() {
        let json = r#"{ "webmonconfig": { "waittime": 0 } }"#;
        let err = WebmonConfig::from_json(json).unwrap().into_policy().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroWaitTime));
    }

    #[test]
    fn custom_healthy_key() {
        let json = r#"{ "webmonconfig": { "waittime": 100, "healthykey": "http204" } }"#;
        let policy = WebmonConfig::from_json(json).unwrap().into_policy().unwrap();
        assert_eq!(policy.healthy_key.as_str(), "http204");
    }

    #[test]
    fn load_policy_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(SAMPLE_JSON.as_bytes()).unwrap();

        let policy = load_policy(file.path()).unwrap();
        assert_eq!(policy.len(), 3);
    }

    #[test]
    fn load_policy_missing_file() {
        let err = load_policy(Path::new("/nonexistent/webmon.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = load_policy(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
    }
}
