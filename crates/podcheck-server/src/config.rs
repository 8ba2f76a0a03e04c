//! Server configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use podcheck_core::{AuthorityConfig, FetchConfig, PipelineConfig};

/// Full configuration for the podcheck server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PodcheckConfig {
    /// Resource pre-filled for the credit-score pipeline after login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_credit_resource: Option<String>,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity provider settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Authority URI templates.
    #[serde(default)]
    pub authorities: AuthorityConfig,

    /// Fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally visible base URL; the provider redirects back to
    /// `<public_url>/redirect`.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Issuer pre-filled on the status page.
    #[serde(default = "default_issuer")]
    pub default_issuer: String,
    /// Client identifier registered with the provider out of band. When
    /// unset the server registers itself dynamically at each provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Name sent with dynamic client registration.
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Requested scopes, space-separated.
    #[serde(default = "default_scope")]
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3001
}
fn default_public_url() -> String {
    "http://localhost:3001".into()
}
fn default_issuer() -> String {
    "https://solidcommunity.net/".into()
}
fn default_client_name() -> String {
    "podcheck".into()
}
fn default_scope() -> String {
    "openid webid offline_access".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_issuer: default_issuer(),
            client_id: None,
            client_name: default_client_name(),
            scope: default_scope(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl PodcheckConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<PodcheckConfig>(&contents)?
        } else {
            Self::default()
        };
        config.pipeline().validate()?;
        config.redirect_target()?;
        Ok(config)
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The pipeline settings carried by this config.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            authorities: self.authorities.clone(),
            fetch: self.fetch.clone(),
            default_credit_resource: self.default_credit_resource.clone(),
        }
    }

    /// Where the identity provider sends the browser back to.
    pub fn redirect_target(&self) -> anyhow::Result<Url> {
        let base = Url::parse(&self.server.public_url)
            .map_err(|e| anyhow::anyhow!("invalid public_url {}: {}", self.server.public_url, e))?;
        Ok(base.join("redirect")?)
    }

    /// The `addr:port` the server binds.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.listen_addr, self.server.port)
    }
}
