//! Wallet configuration from environment variables
//!
//! Every setting has a default; `from_env` only overrides what is set. Parsing goes through a
//! lookup function so tests can supply their own variables.

use crate::indexer::IndexerClientConfig;
use crate::wallet::WalletError;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const GWEI: u128 = 1_000_000_000;

/// Ledger network the wallet talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
	Mainnet,
	/// Sepolia test network.
	Testnet,
}

impl Network {
	pub fn chain_id(&self) -> u64 {
		match self {
			Network::Mainnet => 1,
			Network::Testnet => 11_155_111,
		}
	}

	/// Default Etherscan-compatible API endpoint.
	pub fn default_indexer_url(&self) -> &'static str {
		match self {
			Network::Mainnet => "https://api.etherscan.io/api",
			Network::Testnet => "https://api-sepolia.etherscan.io/api",
		}
	}
}

/// Gas price policy and limits
#[derive(Debug, Clone)]
pub struct GasConfig {
	/// Initial gas price in wei.
	pub default_gas_price: u128,
	/// Ceiling applied to every gas price update, in wei.
	pub max_gas_price: u128,
	pub native_gas_limit: u64,
	pub token_gas_limit: u64,
}

impl Default for GasConfig {
	fn default() -> Self {
		Self {
			default_gas_price: GWEI,
			max_gas_price: 100 * GWEI,
			native_gas_limit: crate::transaction::NATIVE_TRANSFER_GAS_LIMIT,
			token_gas_limit: crate::transaction::TOKEN_TRANSFER_GAS_LIMIT,
		}
	}
}

/// Configuration for the periodic refresh
#[derive(Debug, Clone)]
pub struct SyncConfig {
	/// Interval between timer-driven refresh cycles
	pub refresh_interval: Duration,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			refresh_interval: Duration::from_secs(15),
		}
	}
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
	pub network: Network,
	pub indexer: IndexerClientConfig,
	/// Address to watch when running without a signing key.
	pub address: Option<String>,
	/// JSON file of transaction annotations.
	pub metadata_path: Option<PathBuf>,
	pub gas: GasConfig,
	pub sync: SyncConfig,
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			network: Network::Mainnet,
			indexer: IndexerClientConfig::default(),
			address: None,
			metadata_path: None,
			gas: GasConfig::default(),
			sync: SyncConfig::default(),
		}
	}
}

impl WalletConfig {
	/// Load configuration from environment variables
	///
	/// Environment variables:
	/// - `ETH_WALLET_NETWORK`: "mainnet" (default) or "testnet"/"sepolia"
	/// - `ETH_INDEXER_URL`: indexer API endpoint, defaults per network
	/// - `ETH_INDEXER_API_KEY`: indexer API key (optional)
	/// - `ETH_WALLET_ADDRESS`: address to watch (optional)
	/// - `ETH_REFRESH_INTERVAL_SECS`: refresh period, default 15
	/// - `ETH_REQUEST_TIMEOUT_SECS`: per-request timeout, default 30
	/// - `ETH_MAX_GAS_PRICE_GWEI`: gas price ceiling, default 100
	/// - `ETH_METADATA_PATH`: transaction annotation file (optional)
	pub fn from_env() -> Result<Self, WalletError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();
		let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		config.network = match lookup("ETH_WALLET_NETWORK")
			.map(|n| n.to_lowercase())
			.as_deref()
		{
			None | Some("mainnet") => Network::Mainnet,
			Some("testnet") | Some("sepolia") => Network::Testnet,
			Some(other) => {
				warn!("Unknown network '{}', defaulting to mainnet", other);
				Network::Mainnet
			}
		};

		config.indexer.base_url = lookup("ETH_INDEXER_URL")
			.unwrap_or_else(|| config.network.default_indexer_url().to_string());
		config.indexer.api_key = lookup("ETH_INDEXER_API_KEY");
		if let Some(secs) = parse_var::<u64>(&lookup, "ETH_REQUEST_TIMEOUT_SECS")? {
			config.indexer.request_timeout = Duration::from_secs(secs);
		}

		config.address = lookup("ETH_WALLET_ADDRESS");
		config.metadata_path = lookup("ETH_METADATA_PATH").map(PathBuf::from);

		if let Some(secs) = parse_var::<u64>(&lookup, "ETH_REFRESH_INTERVAL_SECS")? {
			if secs == 0 {
				return Err(WalletError::ConfigurationError(
					"ETH_REFRESH_INTERVAL_SECS must be positive".to_string(),
				));
			}
			config.sync.refresh_interval = Duration::from_secs(secs);
		}
		if let Some(gwei) = parse_var::<u128>(&lookup, "ETH_MAX_GAS_PRICE_GWEI")? {
			config.gas.max_gas_price = gwei.saturating_mul(GWEI);
		}

		info!(
			"Using {:?} network via {}",
			config.network, config.indexer.base_url
		);
		Ok(config)
	}
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, WalletError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	lookup(key)
		.map(|value| {
			value.trim().parse::<T>().map_err(|e| {
				WalletError::ConfigurationError(format!("{key}={value} is invalid: {e}"))
			})
		})
		.transpose()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn config_from(vars: &[(&str, &str)]) -> Result<WalletConfig, WalletError> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		WalletConfig::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn defaults_without_variables() {
		let config = config_from(&[]).expect("config");
		assert_eq!(config.network, Network::Mainnet);
		assert_eq!(config.indexer.base_url, "https://api.etherscan.io/api");
		assert_eq!(config.sync.refresh_interval, Duration::from_secs(15));
		assert_eq!(config.gas.default_gas_price, GWEI);
		assert_eq!(config.gas.max_gas_price, 100 * GWEI);
		assert!(config.address.is_none());
	}

	#[test]
	fn overrides_from_variables() {
		let config = config_from(&[
			("ETH_WALLET_NETWORK", "Sepolia"),
			("ETH_INDEXER_API_KEY", "key"),
			("ETH_REFRESH_INTERVAL_SECS", "30"),
			("ETH_MAX_GAS_PRICE_GWEI", "250"),
			("ETH_METADATA_PATH", "/tmp/metadata.json"),
		])
		.expect("config");
		assert_eq!(config.network, Network::Testnet);
		assert_eq!(config.network.chain_id(), 11_155_111);
		assert_eq!(config.indexer.base_url, "https://api-sepolia.etherscan.io/api");
		assert_eq!(config.indexer.api_key.as_deref(), Some("key"));
		assert_eq!(config.sync.refresh_interval, Duration::from_secs(30));
		assert_eq!(config.gas.max_gas_price, 250 * GWEI);
		assert_eq!(config.metadata_path, Some(PathBuf::from("/tmp/metadata.json")));
	}

	#[test]
	fn rejects_malformed_numbers() {
		assert!(matches!(
			config_from(&[("ETH_REFRESH_INTERVAL_SECS", "soon")]),
			Err(WalletError::ConfigurationError(_))
		));
		assert!(matches!(
			config_from(&[("ETH_REFRESH_INTERVAL_SECS", "0")]),
			Err(WalletError::ConfigurationError(_))
		));
	}
}
