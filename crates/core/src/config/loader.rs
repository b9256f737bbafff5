use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "TUNEBATCH_CONFIG";

/// Config file used when `TUNEBATCH_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Prefix of per-key environment overrides.
const ENV_PREFIX: &str = "TUNEBATCH_";

/// Path of the config file to load: `TUNEBATCH_CONFIG`, else `config.toml`
/// in the working directory.
pub fn config_path_from_env() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from file with environment variable overrides
///
/// Nested keys are addressed with a double underscore, e.g.
/// `TUNEBATCH_ORCHESTRATOR__MAX_CONCURRENT_FETCHES=2` or
/// `TUNEBATCH_SPOTIFY__CLIENT_SECRET=...`, so secrets can stay out of the
/// file. `TUNEBATCH_CONFIG` itself is not a config key.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__")
}
