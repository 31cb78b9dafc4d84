// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Configuration for the Carta publishing pipeline.
//!
//! All options load from environment variables prefixed `CARTA_`. Validation
//! is basic: credentials are checked for presence, not that they work.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Environment variable prefix for all options.
pub const ENV_PREFIX: &str = "CARTA_";

/// Placeholder shown for redacted values.
const SAFE_VALUE: &str = "[**REDACTED**]";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Errors raised when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required option was not set.
    #[error("{name} must be set")]
    Missing {
        /// Option name (without prefix).
        name: &'static str,
    },

    /// An option was set to an unusable value.
    #[error("{name} is invalid: {reason}")]
    Invalid {
        /// Option name (without prefix).
        name: &'static str,
        /// Why the value is unusable.
        reason: String,
    },
}

/// Application configuration.
///
/// Built from the process environment via [`Config::load`], or from an
/// explicit map via [`Config::from_map`] (used in tests).
#[derive(Clone, Debug, Serialize)]
pub struct Config {
    pub log_level: String,
    pub parallel_jobs: usize,
    pub sentry_dsn: String,
    pub sentry_environment: String,
    pub enable_feature_sentry: bool,

    pub store_gitlab_endpoint: String,
    pub store_gitlab_token: String,
    pub store_gitlab_project_id: String,
    pub store_gitlab_branch: String,
    pub store_gitlab_cache_path: PathBuf,

    pub export_path: PathBuf,
    pub base_url: String,

    pub aws_s3_bucket: String,
    pub aws_access_id: String,
    pub aws_access_secret: String,

    pub admin_metadata_encryption_key_private: String,
    pub admin_metadata_signing_key_public: String,

    pub templates_plausible_domain: String,
    pub templates_item_contact_endpoint: String,
    pub templates_item_maps_endpoint: String,
    pub templates_item_versions_endpoint: String,
    pub templates_item_contact_turnstile_key: String,

    pub verify_sharepoint_proxy_endpoint: String,
    pub verify_san_proxy_endpoint: String,
}

fn get(vars: &BTreeMap<String, String>, name: &str) -> Option<String> {
    vars.get(&format!("{ENV_PREFIX}{name}")).cloned()
}

fn get_or(vars: &BTreeMap<String, String>, name: &str, default: &str) -> String {
    get(vars, name).unwrap_or_else(|| default.to_owned())
}

fn require(vars: &BTreeMap<String, String>, name: &'static str) -> Result<String, ConfigError> {
    get(vars, name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing { name })
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let vars: BTreeMap<String, String> = std::env::vars().collect();
        Self::from_map(&vars)
    }

    /// Build configuration from an explicit variable map.
    pub fn from_map(vars: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let parallel_jobs = match get(vars, "PARALLEL_JOBS") {
            None => 1,
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: "PARALLEL_JOBS",
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            log_level: get_or(vars, "LOG_LEVEL", "warn"),
            parallel_jobs,
            sentry_dsn: get_or(vars, "SENTRY_DSN", ""),
            sentry_environment: get_or(vars, "SENTRY_ENVIRONMENT", "development"),
            enable_feature_sentry: get_or(vars, "ENABLE_FEATURE_SENTRY", "true") == "true",

            store_gitlab_endpoint: require(vars, "STORE_GITLAB_ENDPOINT")?,
            store_gitlab_token: require(vars, "STORE_GITLAB_TOKEN")?,
            store_gitlab_project_id: require(vars, "STORE_GITLAB_PROJECT_ID")?,
            store_gitlab_branch: get_or(vars, "STORE_GITLAB_BRANCH", "main"),
            store_gitlab_cache_path: PathBuf::from(require(vars, "STORE_GITLAB_CACHE_PATH")?),

            export_path: PathBuf::from(require(vars, "EXPORT_PATH")?),
            base_url: require(vars, "BASE_URL")?,

            aws_s3_bucket: require(vars, "AWS_S3_BUCKET")?,
            aws_access_id: require(vars, "AWS_ACCESS_ID")?,
            aws_access_secret: require(vars, "AWS_ACCESS_SECRET")?,

            admin_metadata_encryption_key_private: get_or(
                vars,
                "ADMIN_METADATA_ENCRYPTION_KEY_PRIVATE",
                "",
            ),
            admin_metadata_signing_key_public: get_or(
                vars,
                "ADMIN_METADATA_SIGNING_KEY_PUBLIC",
                "",
            ),

            templates_plausible_domain: require(vars, "TEMPLATES_PLAUSIBLE_DOMAIN")?,
            templates_item_contact_endpoint: require(vars, "TEMPLATES_ITEM_CONTACT_ENDPOINT")?,
            templates_item_maps_endpoint: get_or(
                vars,
                "TEMPLATES_ITEM_MAPS_ENDPOINT",
                "https://embedded-maps.data.bas.ac.uk/v1",
            ),
            templates_item_versions_endpoint: get_or(vars, "TEMPLATES_ITEM_VERSIONS_ENDPOINT", ""),
            templates_item_contact_turnstile_key: get_or(
                vars,
                "TEMPLATES_ITEM_CONTACT_TURNSTILE_KEY",
                "",
            ),

            verify_sharepoint_proxy_endpoint: get_or(vars, "VERIFY_SHAREPOINT_PROXY_ENDPOINT", ""),
            verify_san_proxy_endpoint: get_or(vars, "VERIFY_SAN_PROXY_ENDPOINT", ""),
        })
    }

    /// Validate loaded configuration.
    ///
    /// Presence of required options is enforced at load time; this checks
    /// value shapes (log level, paths that exist must be directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid {
                name: "LOG_LEVEL",
                reason: format!("unknown level '{}'", self.log_level),
            });
        }
        if self.parallel_jobs == 0 {
            return Err(ConfigError::Invalid {
                name: "PARALLEL_JOBS",
                reason: "must be at least 1".into(),
            });
        }
        if self.store_gitlab_cache_path.exists() && !self.store_gitlab_cache_path.is_dir() {
            return Err(ConfigError::Invalid {
                name: "STORE_GITLAB_CACHE_PATH",
                reason: "must be a directory".into(),
            });
        }
        if self.export_path.exists() && !self.export_path.is_dir() {
            return Err(ConfigError::Invalid {
                name: "EXPORT_PATH",
                reason: "must be a directory".into(),
            });
        }
        Ok(())
    }

    /// Whether publishing should use the trusted (rsync) path.
    ///
    /// Trusted publishing is selected by targeting a bucket flagged for
    /// secure hosting; testing buckets contain 'testing'.
    pub fn testing_environment(&self) -> bool {
        self.aws_s3_bucket.contains("testing")
    }

    /// Dump configuration for display with sensitive values redacted.
    pub fn dumps_safe(&self) -> BTreeMap<&'static str, String> {
        let redact = |value: &str| {
            if value.is_empty() {
                String::new()
            } else {
                SAFE_VALUE.to_owned()
            }
        };
        BTreeMap::from([
            ("LOG_LEVEL", self.log_level.clone()),
            ("PARALLEL_JOBS", self.parallel_jobs.to_string()),
            ("SENTRY_DSN", self.sentry_dsn.clone()),
            ("SENTRY_ENVIRONMENT", self.sentry_environment.clone()),
            (
                "ENABLE_FEATURE_SENTRY",
                self.enable_feature_sentry.to_string(),
            ),
            (
                "STORE_GITLAB_ENDPOINT",
                self.store_gitlab_endpoint.clone(),
            ),
            ("STORE_GITLAB_TOKEN", redact(&self.store_gitlab_token)),
            (
                "STORE_GITLAB_PROJECT_ID",
                self.store_gitlab_project_id.clone(),
            ),
            ("STORE_GITLAB_BRANCH", self.store_gitlab_branch.clone()),
            (
                "STORE_GITLAB_CACHE_PATH",
                self.store_gitlab_cache_path.display().to_string(),
            ),
            ("EXPORT_PATH", self.export_path.display().to_string()),
            ("BASE_URL", self.base_url.clone()),
            ("AWS_S3_BUCKET", self.aws_s3_bucket.clone()),
            ("AWS_ACCESS_ID", self.aws_access_id.clone()),
            ("AWS_ACCESS_SECRET", redact(&self.aws_access_secret)),
            (
                "ADMIN_METADATA_ENCRYPTION_KEY_PRIVATE",
                redact(&self.admin_metadata_encryption_key_private),
            ),
            (
                "ADMIN_METADATA_SIGNING_KEY_PUBLIC",
                self.admin_metadata_signing_key_public.clone(),
            ),
            (
                "TEMPLATES_PLAUSIBLE_DOMAIN",
                self.templates_plausible_domain.clone(),
            ),
            (
                "TEMPLATES_ITEM_CONTACT_ENDPOINT",
                self.templates_item_contact_endpoint.clone(),
            ),
            (
                "TEMPLATES_ITEM_MAPS_ENDPOINT",
                self.templates_item_maps_endpoint.clone(),
            ),
            (
                "TEMPLATES_ITEM_VERSIONS_ENDPOINT",
                self.templates_item_versions_endpoint.clone(),
            ),
            (
                "TEMPLATES_ITEM_CONTACT_TURNSTILE_KEY",
                redact(&self.templates_item_contact_turnstile_key),
            ),
            (
                "VERIFY_SHAREPOINT_PROXY_ENDPOINT",
                self.verify_sharepoint_proxy_endpoint.clone(),
            ),
            (
                "VERIFY_SAN_PROXY_ENDPOINT",
                self.verify_san_proxy_endpoint.clone(),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_vars() -> BTreeMap<String, String> {
        BTreeMap::from(
            [
                ("CARTA_STORE_GITLAB_ENDPOINT", "https://gitlab.example.com"),
                ("CARTA_STORE_GITLAB_TOKEN", "glpat-secret"),
                ("CARTA_STORE_GITLAB_PROJECT_ID", "123"),
                ("CARTA_STORE_GITLAB_CACHE_PATH", "/tmp/carta-cache"),
                ("CARTA_EXPORT_PATH", "/tmp/carta-site"),
                ("CARTA_BASE_URL", "https://data.bas.ac.uk"),
                ("CARTA_AWS_S3_BUCKET", "carta-site"),
                ("CARTA_AWS_ACCESS_ID", "AKIA123"),
                ("CARTA_AWS_ACCESS_SECRET", "secret"),
                ("CARTA_TEMPLATES_PLAUSIBLE_DOMAIN", "data.bas.ac.uk"),
                (
                    "CARTA_TEMPLATES_ITEM_CONTACT_ENDPOINT",
                    "https://forms.example.com/contact",
                ),
            ]
            .map(|(k, v)| (k.to_owned(), v.to_owned())),
        )
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let config = Config::from_map(&minimal_vars()).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.parallel_jobs, 1);
        assert_eq!(config.store_gitlab_branch, "main");
        assert_eq!(config.sentry_environment, "development");
        assert!(config.enable_feature_sentry);
        config.validate().unwrap();
    }

    #[test]
    fn missing_required_option_fails() {
        let mut vars = minimal_vars();
        vars.remove("CARTA_STORE_GITLAB_TOKEN");
        let err = Config::from_map(&vars).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                name: "STORE_GITLAB_TOKEN"
            }
        ));
    }

    #[test]
    fn empty_required_option_fails() {
        let mut vars = minimal_vars();
        vars.insert("CARTA_AWS_S3_BUCKET".into(), String::new());
        assert!(Config::from_map(&vars).is_err());
    }

    #[test]
    fn non_numeric_parallel_jobs_fails() {
        let mut vars = minimal_vars();
        vars.insert("CARTA_PARALLEL_JOBS".into(), "many".into());
        let err = Config::from_map(&vars).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "PARALLEL_JOBS",
                ..
            }
        ));
    }

    #[test]
    fn zero_parallel_jobs_rejected_by_validate() {
        let mut vars = minimal_vars();
        vars.insert("CARTA_PARALLEL_JOBS".into(), "0".into());
        let config = Config::from_map(&vars).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_log_level_rejected_by_validate() {
        let mut vars = minimal_vars();
        vars.insert("CARTA_LOG_LEVEL".into(), "verbose".into());
        let config = Config::from_map(&vars).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                name: "LOG_LEVEL",
                ..
            })
        ));
    }

    #[test]
    fn cache_path_must_be_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut vars = minimal_vars();
        vars.insert(
            "CARTA_STORE_GITLAB_CACHE_PATH".into(),
            file.path().display().to_string(),
        );
        let config = Config::from_map(&vars).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                name: "STORE_GITLAB_CACHE_PATH",
                ..
            })
        ));
    }

    #[test]
    fn dumps_safe_redacts_secrets() {
        let config = Config::from_map(&minimal_vars()).unwrap();
        let dumped = config.dumps_safe();
        assert_eq!(dumped["STORE_GITLAB_TOKEN"], SAFE_VALUE);
        assert_eq!(dumped["AWS_ACCESS_SECRET"], SAFE_VALUE);
        assert_eq!(dumped["AWS_ACCESS_ID"], "AKIA123");
        // Unset secrets stay empty rather than showing the placeholder.
        assert_eq!(dumped["ADMIN_METADATA_ENCRYPTION_KEY_PRIVATE"], "");
    }

    #[test]
    fn testing_environment_detected_from_bucket() {
        let mut vars = minimal_vars();
        vars.insert("CARTA_AWS_S3_BUCKET".into(), "carta-site-testing".into());
        let config = Config::from_map(&vars).unwrap();
        assert!(config.testing_environment());
    }
}
