//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file when no flag is given.
pub const CONFIG_PATH_ENV: &str = "RPC_GATEWAY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the effective configuration.
///
/// Order: explicit path, then `RPC_GATEWAY_CONFIG`, then built-in defaults.
/// Environment overrides are applied last and the result is re-validated.
pub fn resolve_config(explicit_path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let mut config = match explicit_path.or(env_path.as_deref()) {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `RPC_GATEWAY_*` overrides from a variable lookup.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("RPC_GATEWAY_HTTP_ADDR") {
        config.gateway.bind_address = v;
    }
    if let Some(v) = lookup("RPC_GATEWAY_RPC_ADDR") {
        config.rpc.bind_address = v;
    }
    if let Some(v) = lookup("RPC_GATEWAY_UPSTREAM_ADDR") {
        config.upstream.address = v;
    }
    if let Some(v) = lookup("RPC_GATEWAY_LOG_LEVEL") {
        config.observability.log_level = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_replace_only_present_keys() {
        let vars: HashMap<&str, &str> = [
            ("RPC_GATEWAY_HTTP_ADDR", "127.0.0.1:9000"),
            ("RPC_GATEWAY_UPSTREAM_ADDR", "10.1.2.3:1234"),
        ]
        .into_iter()
        .collect();

        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.gateway.bind_address, "127.0.0.1:9000");
        assert_eq!(config.upstream.address, "10.1.2.3:1234");
        assert_eq!(config.rpc.bind_address, "0.0.0.0:1234");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("rpc-gateway-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[gateway]\nroute = \"no-slash\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("no-slash"));
    }
}
