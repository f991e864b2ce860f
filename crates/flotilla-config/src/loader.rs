use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::raw::RawConfig;

/// Validated server configuration.
///
/// All keys are optional at load time. Each manager demands the keys it
/// needs via [`Config::require`] during initialization, so a deployment
/// that never touches the database can omit `database_url` and so on.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database_url: Option<String>,
    pub aws_default_region: Option<String>,
    pub queue_namespace: Option<String>,
    pub flotilla_mode: Option<String>,
    pub owner_id_var: Option<String>,
}

impl Config {
    /// Build a config from environment variables only.
    pub fn from_env() -> Config {
        let mut conf = Config::default();
        conf.apply_env_overrides();
        conf
    }

    /// Look up a key by its configuration name, failing with the key name
    /// when it is absent.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        let value = match key {
            "database_url" => &self.database_url,
            "aws_default_region" => &self.aws_default_region,
            "queue.namespace" => &self.queue_namespace,
            "flotilla_mode" => &self.flotilla_mode,
            "owner_id_var" => &self.owner_id_var,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        for (var, slot) in [
            ("DATABASE_URL", &mut self.database_url),
            ("AWS_DEFAULT_REGION", &mut self.aws_default_region),
            ("FLOTILLA_QUEUE_NAMESPACE", &mut self.queue_namespace),
            ("FLOTILLA_MODE", &mut self.flotilla_mode),
            ("FLOTILLA_OWNER_ID_VAR", &mut self.owner_id_var),
        ] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *slot = Some(value);
                }
            }
        }
    }
}

/// Load the config file at `path` and apply environment overrides on top.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!("loaded config from {}", path.display());

    let mut conf = Config {
        database_url: raw.database_url,
        aws_default_region: raw.aws_default_region,
        queue_namespace: raw.queue.namespace,
        flotilla_mode: raw.flotilla_mode,
        owner_id_var: raw.owner_id_var,
    };
    conf.apply_env_overrides();
    Ok(conf)
}
