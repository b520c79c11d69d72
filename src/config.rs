use std::{collections::HashMap, path::PathBuf};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ca: CaConfig,
    pub crl: CrlConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaBackend {
    Native,
    LegacyImport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaConfig {
    pub backend: CaBackend,
    /// Credential directory holding the root and all issued pairs.
    pub dir: PathBuf,
    pub vpn_ca_path: PathBuf,
    pub openssl_path: PathBuf,
    /// easy-rsa data directory imported on first start, if present.
    #[serde(default)]
    pub legacy_dir: Option<PathBuf>,
    pub tool_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrlConfig {
    #[serde(default)]
    pub url: Option<String>,
    pub path: PathBuf,
    pub timeout_secs: u64,
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// API clients by name.
    #[serde(default)]
    pub clients: HashMap<String, ApiClient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiClient {
    pub token: SecretString,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("server.host", "localhost")?
            .set_default("server.port", 8080)?
            .set_default("ca.backend", "native")?
            .set_default("ca.dir", "data/ca")?
            .set_default("ca.vpn_ca_path", "vpn-ca")?
            .set_default("ca.openssl_path", "/usr/bin/openssl")?
            .set_default("ca.legacy_dir", "data/easy-rsa")?
            .set_default("ca.tool_timeout_secs", 60)?
            .set_default("crl.path", "data/ca.crl")?
            .set_default("crl.timeout_secs", 30)?
            .add_source(File::with_name("config/settings").required(false));

        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format APP_SERVER__HOST or APP_CA__DIR
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        builder.build()?.try_deserialize()
    }
}
