//! Environment configuration for the gateway
//!
//! Builds an [`Env`] from process environment variables, optionally loaded
//! from a `.env` file first.
//!
//! | Variable                    | Meaning                                           |
//! |-----------------------------|---------------------------------------------------|
//! | `FF_EGRESS_TRACKER_ENABLED` | Egress tracking switch (`true`/`false`, `1`/`0`, `yes`/`no`). Absent means disabled. |
//! | `ACCOUNTING_SERVICE_URL`    | Endpoint receiving usage records                  |
//! | `EDGEGATE_ENV`              | Deployment profile, `production` or `development` |
//!
//! # Example
//!
//! ```ignore
//! use edgegate_extras::config::{env_from_process, load_dotenv};
//!
//! load_dotenv();
//! let env = env_from_process()?;
//! if env.egress_tracking_enabled {
//!     // ...
//! }
//! ```

use edgegate_core::{Env, Profile};
use serde::Deserialize;

/// Error type for configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed
    #[error("Configuration error: {0}")]
    Envy(#[from] envy::Error),
    /// A boolean flag had a value that is neither true nor false
    #[error("Invalid value '{value}' for {name}, expected true or false")]
    InvalidFlag { name: &'static str, value: String },
}

/// Raw environment variables as read through `envy`
///
/// Field names map to the upper-cased variable names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvVars {
    #[serde(default)]
    pub ff_egress_tracker_enabled: Option<String>,
    #[serde(default)]
    pub accounting_service_url: Option<String>,
    #[serde(default)]
    pub edgegate_env: Option<String>,
}

impl EnvVars {
    /// Validate the raw values and build an [`Env`]
    pub fn into_env(self) -> Result<Env, ConfigError> {
        let enabled = match self.ff_egress_tracker_enabled.as_deref() {
            Some(value) => parse_flag("FF_EGRESS_TRACKER_ENABLED", value)?,
            None => false,
        };

        let mut env = Env::new().with_egress_tracking(enabled);
        if let Some(url) = self.accounting_service_url.filter(|url| !url.trim().is_empty()) {
            env = env.with_accounting_service_url(url);
        }
        if let Some(profile) = self.edgegate_env.as_deref() {
            env = env.with_profile(Profile::from_name(profile));
        }
        Ok(env)
    }
}

/// Parse a boolean feature flag, case-insensitively
pub fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}

/// Build an [`Env`] from the current process environment
pub fn env_from_process() -> Result<Env, ConfigError> {
    let vars = envy::from_env::<EnvVars>()?;
    let env = vars.into_env()?;
    tracing::debug!(
        egress_tracking = env.egress_tracking_enabled,
        accounting_service = env.accounting_service_url.is_some(),
        profile = env.profile.as_str(),
        "Loaded gateway environment"
    );
    Ok(env)
}

/// Build an [`Env`] from explicit key/value pairs
pub fn env_from_iter<I>(vars: I) -> Result<Env, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::from_iter::<_, EnvVars>(vars)?.into_env()
}

/// Load environment variables from a `.env` file in the current directory
///
/// A missing file is not an error and existing variables are not
/// overridden.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}
