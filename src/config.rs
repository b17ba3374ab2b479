//! Coordinator configuration loading: polling cadence, watcher deadline and scoring.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ServiceError;

/// Default location on disk where the coordinator looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/coordinator.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIGUAIN_CONFIG_PATH";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_OUTCOME_POINTS: i32 = 500;
const DEFAULT_EXACT_SCORE_BONUS: i32 = 0;

/// Points awarded by the built-in outcome scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Points for predicting the right outcome category.
    pub outcome_points: i32,
    /// Extra points when the exact score was predicted.
    pub exact_score_bonus: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            outcome_points: DEFAULT_OUTCOME_POINTS,
            exact_score_bonus: DEFAULT_EXACT_SCORE_BONUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Runtime settings of one game coordinator.
pub struct CoordinatorConfig {
    poll_interval: Duration,
    request_timeout: Duration,
    scoring: ScoringConfig,
}

impl CoordinatorConfig {
    /// Build a configuration with explicit timings and default scoring.
    pub fn new(poll_interval: Duration, request_timeout: Duration) -> Self {
        Self {
            poll_interval,
            request_timeout,
            scoring: ScoringConfig::default(),
        }
    }

    /// Replace the scoring settings.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration stored at `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        poll_interval_ms = config.poll_interval.as_millis() as u64,
                        "loaded coordinator config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "invalid coordinator config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(contents: &str) -> Result<Self, ServiceError> {
        let raw = serde_json::from_str::<RawConfig>(contents)
            .map_err(|err| ServiceError::InvalidConfig(format!("malformed config: {err}")))?;
        raw.validate()?;
        Ok(raw.into())
    }

    /// Reject settings a coordinator cannot run with.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.poll_interval.is_zero() {
            return Err(ServiceError::InvalidConfig(
                "polling interval must be strictly positive".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ServiceError::InvalidConfig(
                "watcher request timeout must be strictly positive".into(),
            ));
        }
        Ok(())
    }

    /// Delay between two watcher requests.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Deadline granted to a single watcher request.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Scoring settings for the built-in scorer.
    pub fn scoring(&self) -> ScoringConfig {
        self.scoring
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[validate(range(min = 1))]
    poll_interval_ms: u64,
    #[validate(range(min = 1))]
    request_timeout_ms: u64,
    #[validate(nested)]
    scoring: RawScoring,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            scoring: RawScoring::default(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
struct RawScoring {
    #[validate(range(min = 0))]
    outcome_points: i32,
    #[validate(range(min = 0))]
    exact_score_bonus: i32,
}

impl Default for RawScoring {
    fn default() -> Self {
        Self {
            outcome_points: DEFAULT_OUTCOME_POINTS,
            exact_score_bonus: DEFAULT_EXACT_SCORE_BONUS,
        }
    }
}

impl From<RawConfig> for CoordinatorConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(value.poll_interval_ms),
            request_timeout: Duration::from_millis(value.request_timeout_ms),
            scoring: ScoringConfig {
                outcome_points: value.scoring.outcome_points,
                exact_score_bonus: value.scoring.exact_score_bonus,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = CoordinatorConfig::from_json(r#"{ "poll_interval_ms": 250 }"#)
            .unwrap();

        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.scoring(), ScoringConfig::default());
    }

    #[test]
    fn scoring_section_is_read() {
        let config = CoordinatorConfig::from_json(
            r#"{ "scoring": { "outcome_points": 3, "exact_score_bonus": 2 } }"#,
        )
        .unwrap();

        assert_eq!(
            config.scoring(),
            ScoringConfig {
                outcome_points: 3,
                exact_score_bonus: 2,
            }
        );
    }

    #[test]
    fn zero_interval_in_file_is_rejected() {
        let err = CoordinatorConfig::from_json(r#"{ "poll_interval_ms": 0 }"#)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfig(_)));
    }

    #[test]
    fn negative_points_are_rejected() {
        let err = CoordinatorConfig::from_json(r#"{ "scoring": { "outcome_points": -5 } }"#)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfig(_)));
    }

    #[test]
    fn zero_durations_fail_validation() {
        let zero_poll = CoordinatorConfig::new(Duration::ZERO, Duration::from_secs(1));
        let zero_timeout = CoordinatorConfig::new(Duration::from_secs(1), Duration::ZERO);

        assert!(zero_poll.validate().is_err());
        assert!(zero_timeout.validate().is_err());
        assert!(CoordinatorConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_or_broken_file_falls_back_to_defaults() {
        let dir = env::temp_dir();
        let missing = dir.join(format!("liguain-missing-{}.json", Uuid::new_v4()));
        assert_eq!(
            CoordinatorConfig::load_from(&missing),
            CoordinatorConfig::default()
        );

        let broken = dir.join(format!("liguain-broken-{}.json", Uuid::new_v4()));
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(
            CoordinatorConfig::load_from(&broken),
            CoordinatorConfig::default()
        );
        fs::remove_file(&broken).unwrap();
    }

    #[test]
    fn file_contents_are_loaded() {
        let name = format!("liguain-config-{}.json", Uuid::new_v4());
        let path = env::temp_dir().join(name);
        let contents = r#"{ "poll_interval_ms": 10, "request_timeout_ms": 5 }"#;
        fs::write(&path, contents).unwrap();

        let config = CoordinatorConfig::load_from(&path);
        fs::remove_file(&path).unwrap();

        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.request_timeout(), Duration::from_millis(5));
    }
}
