use eth_wallet_sync::config::WalletConfig;
use eth_wallet_sync::indexer::EtherscanIndexerClient;
use eth_wallet_sync::transaction::NATIVE_DECIMALS;
use eth_wallet_sync::utils::format_token_amount;
use eth_wallet_sync::wallet::{
	Account, CurrencyCode, FileMetadataStore, LoggingEventHandler, MetadataStore, Token,
	WalletManager,
};

use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
	// Initialize tracing subscriber with debug logging for the wallet crate
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(
					"eth_wallet_sync=debug"
						.parse()
						.unwrap_or_else(|_| tracing::Level::DEBUG.into()),
				)
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	if let Err(e) = run().await {
		error!("Wallet sync service failed: {}", e);
		std::process::exit(1);
	}
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
	info!("Starting wallet sync service");
	let config = WalletConfig::from_env()?;

	let address = config
		.address
		.clone()
		.ok_or("ETH_WALLET_ADDRESS must be set")?;
	let account = Account::watch_only(&address)?;

	let client = Arc::new(EtherscanIndexerClient::new(config.indexer.clone())?);
	info!("Created indexer client for {}", config.indexer.base_url);

	let mut builder = WalletManager::builder(account, client).with_config(config.clone());
	if let Some(path) = &config.metadata_path {
		let store: Arc<dyn MetadataStore> = Arc::new(FileMetadataStore::open(path).await?);
		builder = builder.with_metadata_store(store);
	}
	let manager = builder.build();
	manager
		.register_event_handler(Arc::new(LoggingEventHandler))
		.await;

	info!(
		"Watching {} (wallet id {})",
		manager.address(),
		manager.wallet_id().unwrap_or("unavailable")
	);

	manager.start().await?;
	tokio::signal::ctrl_c().await?;

	let tokens = manager.tokens().await;
	for state in manager.snapshots().await {
		let decimals = display_decimals(&tokens, &state.currency);
		info!(
			"{}: balance {}, {} transactions ({} pending)",
			state.currency,
			state
				.balance
				.map(|b| format_token_amount(b, decimals))
				.unwrap_or_else(|| "unknown".to_string()),
			state.transactions.len(),
			state.pending_count()
		);
	}
	info!("Shutting down");
	Ok(())
}

/// Decimals used to display `currency`: the token's own, or the native asset's.
fn display_decimals(tokens: &[Token], currency: &CurrencyCode) -> u32 {
	tokens
		.iter()
		.find(|token| &token.currency() == currency)
		.map_or(NATIVE_DECIMALS, |token| token.decimals)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn token_balances_use_token_decimals() {
		let tokens = vec![Token::new("USD Coin", "USDC", "USDC", "0x01", 6)];
		assert_eq!(display_decimals(&tokens, &CurrencyCode::new("usdc")), 6);
		assert_eq!(display_decimals(&tokens, &CurrencyCode::native()), NATIVE_DECIMALS);
		assert_eq!(
			format_token_amount(1_500_000, display_decimals(&tokens, &CurrencyCode::new("USDC"))),
			format_token_amount(1_500_000_000_000_000_000, NATIVE_DECIMALS)
		);
	}
}
