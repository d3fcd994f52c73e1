//! Network definition parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Path to the vega binary used for the tendermint, vega and faucet tasks.
    pub vega_binary_path: String,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    pub name: String,
    pub ethereum_endpoint: Option<String>,
    #[serde(default)]
    pub pre_start: PreStartConfig,
    pub faucet: Option<FaucetConfig>,
    pub wallet: Option<WalletConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreStartConfig {
    #[serde(default)]
    pub docker: Vec<DockerConfig>,
}

/// An auxiliary container started before any node set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DockerConfig {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub static_port: Option<StaticPort>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticPort {
    /// Port inside the container.
    pub to: u16,
    /// Port reserved on the host.
    pub value: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaucetConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    pub name: String,
    /// Path to the wallet binary.
    pub binary: String,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let toml_str = r#"
vega_binary_path = "/usr/local/bin/vega"

[network]
name = "testnet"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.network.name, "testnet");
        assert!(config.network.pre_start.docker.is_empty());
        assert!(config.network.faucet.is_none());
        assert!(config.network.wallet.is_none());
    }

    #[test]
    fn test_parse_pre_start_docker() {
        let toml_str = r#"
vega_binary_path = "vega"

[network]
name = "testnet"

[[network.pre_start.docker]]
name = "pg"
image = "postgres:14"
args = ["-c", "max_connections=50"]
static_port = { to = 5432, value = 5232 }

[network.pre_start.docker.env]
POSTGRES_USER = "vega"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let pg = &config.network.pre_start.docker[0];
        assert_eq!(pg.image, "postgres:14");
        assert_eq!(pg.static_port, Some(StaticPort { to: 5432, value: 5232 }));
        assert_eq!(pg.env.get("POSTGRES_USER").map(String::as_str), Some("vega"));
        assert!(pg.command.is_none());
    }

    #[test]
    fn test_from_file_roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            vega_binary_path: "vega".to_string(),
            network: NetworkConfig {
                name: "testnet".to_string(),
                ethereum_endpoint: None,
                pre_start: PreStartConfig::default(),
                faucet: Some(FaucetConfig {
                    name: "faucet-1".to_string(),
                }),
                wallet: None,
            },
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }
}
