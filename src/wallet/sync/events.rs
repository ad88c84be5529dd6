//! Event system for wallet synchronization.
//!
//! This module defines the sync event types, the event handler trait, and the event dispatcher
//! the wallet uses to notify the presentation layer. Refresh cycles and the send path emit
//! events; registered handlers react to them independently of each other.

use super::progress_tracker::CycleStats;
use crate::wallet::{CurrencyCode, WalletError};

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// The fetches a refresh cycle issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
	Balance,
	Transactions,
	TokenBalance,
	TokenTransactions,
	BlockHeight,
}

impl fmt::Display for FetchKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			FetchKind::Balance => "balance",
			FetchKind::Transactions => "transactions",
			FetchKind::TokenBalance => "token balance",
			FetchKind::TokenTransactions => "token transactions",
			FetchKind::BlockHeight => "block height",
		};
		f.write_str(name)
	}
}

/// Events that occur during wallet synchronization
#[derive(Debug, Clone)]
pub enum SyncEvent {
	/// A currency's balance was replaced with a fresh value
	BalanceUpdated { currency: CurrencyCode, balance: u128 },
	/// A currency's merged transaction view was rebuilt
	TransactionsUpdated { currency: CurrencyCode, count: usize },
	/// The last-known chain height changed
	BlockHeightUpdated { height: u64 },
	/// A fetch failed; the previous slice is kept
	FetchFailed {
		fetch: FetchKind,
		currency: Option<CurrencyCode>,
		error: String,
	},
	/// A refresh cycle finished all of its fetches
	CycleCompleted { stats: CycleStats },
	/// A locally signed transaction was accepted by the network
	TransactionSubmitted { currency: CurrencyCode, hash: String },
}

/// Trait for handling sync events.
#[async_trait::async_trait]
pub trait SyncEventHandler: Send + Sync {
	/// Handle a sync event.
	///
	/// Called for every event the wallet dispatches, after the state change it reports has
	/// been applied.
	async fn handle(&self, event: &SyncEvent) -> Result<(), WalletError>;

	/// Get the name of this handler for logging and diagnostics.
	fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
#[derive(Default)]
pub struct EventDispatcher {
	handlers: RwLock<Vec<Arc<dyn SyncEventHandler>>>,
}

impl EventDispatcher {
	/// Create a new, empty event dispatcher.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a new event handler.
	///
	/// Handlers are called in the order they are registered.
	pub async fn register_handler(&self, handler: Arc<dyn SyncEventHandler>) {
		self.handlers.write().await.push(handler);
	}

	/// Dispatch an event to all registered handlers.
	///
	/// Errors from handlers are logged, but do not stop other handlers from running.
	pub async fn dispatch(&self, event: SyncEvent) {
		let handlers = self.handlers.read().await.clone();
		for handler in handlers {
			if let Err(e) = handler.handle(&event).await {
				tracing::error!("Handler {} failed to process event: {}", handler.name(), e);
			}
		}
	}
}

/// Handler that logs every event.
pub struct LoggingEventHandler;

#[async_trait::async_trait]
impl SyncEventHandler for LoggingEventHandler {
	async fn handle(&self, event: &SyncEvent) -> Result<(), WalletError> {
		match event {
			SyncEvent::BalanceUpdated { currency, balance } => {
				info!("{} balance: {}", currency, balance);
			}
			SyncEvent::TransactionsUpdated { currency, count } => {
				info!("{} transactions: {}", currency, count);
			}
			SyncEvent::BlockHeightUpdated { height } => {
				info!("Chain height: {}", height);
			}
			SyncEvent::FetchFailed {
				fetch,
				currency,
				error,
			} => match currency {
				Some(currency) => warn!("{} {} fetch failed: {}", currency, fetch, error),
				None => warn!("{} fetch failed: {}", fetch, error),
			},
			SyncEvent::CycleCompleted { stats } => {
				info!("{}", stats.summary());
			}
			SyncEvent::TransactionSubmitted { currency, hash } => {
				info!("Submitted {} transaction {}", currency, hash);
			}
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"LoggingEventHandler"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	struct Failing;

	#[async_trait::async_trait]
	impl SyncEventHandler for Failing {
		async fn handle(&self, _event: &SyncEvent) -> Result<(), WalletError> {
			Err(WalletError::ConfigurationError("boom".to_string()))
		}

		fn name(&self) -> &'static str {
			"Failing"
		}
	}

	#[derive(Default)]
	struct Recording(Mutex<Vec<String>>);

	#[async_trait::async_trait]
	impl SyncEventHandler for Recording {
		async fn handle(&self, event: &SyncEvent) -> Result<(), WalletError> {
			self.0.lock().unwrap().push(format!("{event:?}"));
			Ok(())
		}

		fn name(&self) -> &'static str {
			"Recording"
		}
	}

	#[tokio::test]
	async fn failing_handler_does_not_block_others() {
		let dispatcher = EventDispatcher::new();
		let recording = Arc::new(Recording::default());
		dispatcher.register_handler(Arc::new(Failing)).await;
		dispatcher.register_handler(Arc::new(LoggingEventHandler)).await;
		dispatcher.register_handler(recording.clone()).await;

		dispatcher
			.dispatch(SyncEvent::BlockHeightUpdated { height: 7 })
			.await;

		let seen = recording.0.lock().unwrap();
		assert_eq!(seen.len(), 1);
		assert!(seen[0].contains("BlockHeightUpdated"));
	}
}
