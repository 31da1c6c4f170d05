//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::TransformSpec;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[routes]]
            route_id = "api"
            path = "/api/{**rest}"
            hosts = ["example.com"]
            methods = ["GET", "POST"]
            cors_policy = "frontend"
            authorization_policy = "default"
            priority = 10
            cluster_id = "web"

            [[routes.transforms]]
            type = "path_remove_prefix"
            prefix = "/api"

            [[clusters]]
            cluster_id = "web"
            destinations = [{ name = "d1", address = "http://127.0.0.1:3000" }]

            [[cors.policies]]
            name = "frontend"
            allowed_origins = ["https://app.example.com"]
            allow_credentials = true
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.routes.len(), 1);
        let route = &config.routes[0];
        assert_eq!(route.route_id, "api");
        assert_eq!(route.priority, 10);
        assert_eq!(
            route.transforms,
            vec![TransformSpec::PathRemovePrefix { prefix: "/api".into() }]
        );
        assert_eq!(config.clusters[0].destinations[0].name, "d1");

        let policy = &config.cors.policies[0];
        assert_eq!(policy.name, "frontend");
        assert!(policy.policy.allow_credentials);
        // Unset fields fall back to the permissive defaults.
        assert_eq!(policy.policy.allowed_methods, vec!["*".to_string()]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn test_parse_and_validation_errors() {
        assert!(matches!(parse_config("routes = 3"), Err(ConfigError::Parse(_))));

        let err = parse_config(
            r#"
            [[routes]]
            route_id = "a"
            cluster_id = "missing"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/routegate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
