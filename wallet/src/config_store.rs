use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use blake3::Hasher as Blake3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::Prefix;
use crate::errors::{WalletError, WalletResult};
use crate::transaction::TransactionVersion;

const CONFIG_VERSION: u16 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

/// Which UMI ledger the node serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Current,
    Legend,
}

impl Chain {
    pub fn send_version(self) -> TransactionVersion {
        match self {
            Chain::Current => TransactionVersion::Current,
            Chain::Legend => TransactionVersion::Legend,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub chain: Chain,
    pub base_url: String,
    /// Statistics service; the legend chain has none.
    pub stats_url: Option<String>,
    pub timeout_secs: u64,
    pub prefix: Prefix,
}

impl NetworkConfig {
    pub fn new(network: Network, chain: Chain) -> Self {
        let (base_url, stats_url) = match (network, chain) {
            (Network::Mainnet, Chain::Current) => {
                ("https://mainnet.umi.top", Some("https://stats.umi.top"))
            }
            (Network::Testnet, Chain::Current) => (
                "https://testnet.umi.top",
                Some("https://testnet-stats.umi.top"),
            ),
            (Network::Mainnet, Chain::Legend) => ("https://legend.umi.top", None),
            (Network::Testnet, Chain::Legend) => ("https://testnet-legend.umi.top", None),
        };

        Self {
            network,
            chain,
            base_url: base_url.to_string(),
            stats_url: stats_url.map(str::to_string),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            prefix: Prefix::UMI,
        }
    }

    pub fn mainnet() -> Self {
        Self::new(Network::Mainnet, Chain::Current)
    }

    pub fn testnet() -> Self {
        Self::new(Network::Testnet, Chain::Current)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_stats_url(mut self, stats_url: impl Into<String>) -> Self {
        self.stats_url = Some(stats_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn node_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn stats_endpoint(&self) -> WalletResult<&str> {
        if self.chain == Chain::Legend {
            return Err(WalletError::ValidationError(
                "The legend chain has no statistics service".to_string(),
            ));
        }

        self.stats_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| WalletError::ValidationError("No statistics URL configured".to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn send_version(&self) -> TransactionVersion {
        self.chain.send_version()
    }

    pub fn validate(&self) -> WalletResult<()> {
        let valid_url =
            |url: &str| url.starts_with("https://") || url.starts_with("http://");

        if !valid_url(&self.base_url) {
            return Err(WalletError::ValidationError(format!(
                "Node URL must be http(s): {}",
                self.base_url
            )));
        }
        if let Some(stats) = &self.stats_url {
            if !valid_url(stats) {
                return Err(WalletError::ValidationError(format!(
                    "Statistics URL must be http(s): {}",
                    stats
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(WalletError::ValidationError(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u16,
    checksum: [u8; 32],
    payload: NetworkConfig,
    modified_at: DateTime<Utc>,
}

/// Handles persistence of the network configuration with integrity checks.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> WalletResult<NetworkConfig> {
        let bytes = fs::read(&self.path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != CONFIG_VERSION {
            return Err(WalletError::ValidationError(format!(
                "Unsupported config version {}",
                envelope.version
            )));
        }

        if checksum(&envelope.payload)? != envelope.checksum {
            return Err(WalletError::ValidationError(
                "Config integrity verification failed".to_string(),
            ));
        }

        envelope.payload.validate()?;
        Ok(envelope.payload)
    }

    pub fn load_or_default(&self) -> WalletResult<NetworkConfig> {
        if !self.path.exists() {
            let config = NetworkConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        self.load()
    }

    pub fn save(&self, config: &NetworkConfig) -> WalletResult<()> {
        config.validate()?;

        let envelope = ConfigEnvelope {
            version: CONFIG_VERSION,
            checksum: checksum(config)?,
            payload: config.clone(),
            modified_at: Utc::now(),
        };

        let serialized = serde_json::to_vec_pretty(&envelope)?;
        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        log::debug!("Saved network config to {}", self.path.display());
        Ok(())
    }

    pub fn update<F>(&self, updater: F) -> WalletResult<NetworkConfig>
    where
        F: FnOnce(&mut NetworkConfig) -> WalletResult<()>,
    {
        let mut config = self.load_or_default()?;
        updater(&mut config)?;
        self.save(&config)?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn checksum(config: &NetworkConfig) -> WalletResult<[u8; 32]> {
    let mut hasher = Blake3::new();
    hasher.update(&serde_json::to_vec(config)?);
    Ok(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_config_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("network.json");
        let store = ConfigStore::new(&path);

        let config = NetworkConfig::testnet().with_base_url("http://localhost:8080/");
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.node_url(), "http://localhost:8080");
        assert!(!path.with_extension("new").exists());
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("nested").join("network.json"));

        assert!(matches!(store.load(), Err(WalletError::FileNotFound(_))));
        let config = store.load_or_default().unwrap();
        assert_eq!(config, NetworkConfig::mainnet());
        assert!(store.path().exists());
    }

    #[test]
    fn tampered_config_detected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("network.json");
        let store = ConfigStore::new(&path);
        store.save(&NetworkConfig::mainnet()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        fs::write(&path, contents.replace("mainnet.umi.top", "mainnet.evil.top")).unwrap();

        let result = store.load();
        assert!(matches!(result, Err(WalletError::ValidationError(_))));
    }

    #[test]
    fn update_persists_changes() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("network.json"));

        store
            .update(|config| {
                config.chain = Chain::Legend;
                config.stats_url = None;
                Ok(())
            })
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.send_version(), TransactionVersion::Legend);
    }

    #[test]
    fn invalid_config_is_not_saved() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("network.json"));

        let config = NetworkConfig::mainnet().with_base_url("ftp://node");
        assert!(store.save(&config).is_err());
        assert!(!store.path().exists());

        let config = NetworkConfig::mainnet().with_timeout(Duration::from_millis(10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn chain_selects_send_version_and_stats() {
        let current = NetworkConfig::new(Network::Testnet, Chain::Current);
        assert_eq!(current.send_version(), TransactionVersion::Current);
        assert!(current.stats_endpoint().is_ok());

        let legend = NetworkConfig::new(Network::Mainnet, Chain::Legend)
            .with_stats_url("https://stats.example");
        assert_eq!(legend.send_version(), TransactionVersion::Legend);
        assert!(matches!(
            legend.stats_endpoint(),
            Err(WalletError::ValidationError(_))
        ));
    }

    #[test]
    fn serialized_names_are_lowercase() {
        let json = serde_json::to_value(NetworkConfig::testnet()).unwrap();
        assert_eq!(json["network"], "testnet");
        assert_eq!(json["chain"], "current");
        assert_eq!(json["prefix"], "umi");
    }
}
