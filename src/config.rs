use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
}

/// Backend connection settings, injected at construction.
///
/// `base_url` points at the knowledge-jar gateway. When `use_local_backend`
/// is false, chat-completion traffic is sent straight to the Azure OpenAI
/// deployment described by `azure` instead.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_use_local_backend")]
    pub use_local_backend: bool,
    #[serde(default)]
    pub azure: Option<AzureConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AzureConfig {
    pub endpoint: String,
    pub key: String,
    pub deployment_name: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_use_local_backend() -> bool {
    true
}

fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}

impl Config {
    /// Minimal config for tests and commands that only need a target URL.
    pub fn minimal(base_url: &str) -> Self {
        Self {
            backend: BackendConfig {
                base_url: base_url.to_string(),
                use_local_backend: true,
                azure: None,
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let backend = &config.backend;

    if backend.base_url.trim().is_empty() {
        anyhow::bail!("backend.base_url must not be empty");
    }
    if backend.base_url.ends_with('/') {
        anyhow::bail!("backend.base_url must not end with '/'");
    }

    if !backend.use_local_backend {
        let azure = backend.azure.as_ref().ok_or_else(|| {
            anyhow::anyhow!("[backend.azure] required when use_local_backend = false")
        })?;
        if azure.endpoint.trim().is_empty()
            || azure.key.trim().is_empty()
            || azure.deployment_name.trim().is_empty()
        {
            anyhow::bail!(
                "backend.azure.endpoint, key, and deployment_name must be set when use_local_backend = false"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Config> {
        let config: Config = toml::from_str(s)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn local_backend_needs_only_base_url() {
        let config = parse(
            r#"
            [backend]
            base_url = "http://127.0.0.1:8000"
            "#,
        )
        .unwrap();
        assert!(config.backend.use_local_backend);
        assert!(config.backend.azure.is_none());
    }

    #[test]
    fn trailing_slash_rejected() {
        let err = parse(
            r#"
            [backend]
            base_url = "http://127.0.0.1:8000/"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not end with"));
    }

    #[test]
    fn empty_base_url_rejected() {
        let err = parse(
            r#"
            [backend]
            base_url = ""
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn azure_mode_requires_azure_table() {
        let err = parse(
            r#"
            [backend]
            base_url = "http://127.0.0.1:8000"
            use_local_backend = false
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("backend.azure"));
    }

    #[test]
    fn azure_mode_parses_with_default_api_version() {
        let config = parse(
            r#"
            [backend]
            base_url = "http://127.0.0.1:8000"
            use_local_backend = false

            [backend.azure]
            endpoint = "https://example.openai.azure.com"
            key = "secret"
            deployment_name = "gpt-4o"
            "#,
        )
        .unwrap();
        let azure = config.backend.azure.unwrap();
        assert_eq!(azure.api_version, "2024-02-15-preview");
    }
}
