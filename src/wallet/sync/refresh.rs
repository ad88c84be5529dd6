//! One refresh cycle: five independent fetches applied as they land.
//!
//! Balance, native history, per-token balances, per-token histories and chain height are
//! requested concurrently. A failed fetch leaves its slice at the last-known-good value and is
//! reported as a [`SyncEvent::FetchFailed`]; the others still apply.

use super::events::{FetchKind, SyncEvent};
use super::progress_tracker::CycleProgressTracker;
use crate::indexer::IndexerError;
use crate::wallet::manager::WalletCore;
use crate::wallet::{CurrencyCode, Token};

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run `cycle` and every coalesced follow-up cycle.
pub(crate) async fn run_cycles(core: Arc<WalletCore>, mut cycle: u64) {
	loop {
		run_cycle(&core, cycle).await;
		match core.scheduler.finish() {
			Some(next) => cycle = next,
			None => break,
		}
	}
}

async fn run_cycle(core: &WalletCore, cycle: u64) {
	let tokens = {
		let inner = core.state.lock().await;
		if !inner.alive {
			debug!("Wallet wiped, skipping refresh cycle {}", cycle);
			return;
		}
		inner.tokens.clone()
	};
	let address = core.account.address();
	info!(
		"Refresh cycle {} for {} ({} tokens)",
		cycle,
		address,
		tokens.len()
	);

	let (balance, transactions, token_balances, token_transactions, block_height) = futures::join!(
		fetch_balance(core, address),
		fetch_transactions(core, address),
		join_all(
			tokens
				.iter()
				.map(|token| fetch_token_balance(core, address, token))
		),
		join_all(
			tokens
				.iter()
				.map(|token| fetch_token_transactions(core, address, token))
		),
		fetch_block_height(core),
	);

	let mut tracker = CycleProgressTracker::new(cycle);
	let native = CurrencyCode::native();
	tracker.record(FetchKind::Balance, Some(native.clone()), balance);
	tracker.record(FetchKind::Transactions, Some(native), transactions);
	for (token, ok) in tokens.iter().zip(token_balances) {
		tracker.record(FetchKind::TokenBalance, Some(token.currency()), ok);
	}
	for (token, ok) in tokens.iter().zip(token_transactions) {
		tracker.record(FetchKind::TokenTransactions, Some(token.currency()), ok);
	}
	tracker.record(FetchKind::BlockHeight, None, block_height);

	let stats = tracker.finish();
	if core.is_alive().await {
		core.events.dispatch(SyncEvent::CycleCompleted { stats }).await;
	}
}

async fn report_failure(
	core: &WalletCore,
	fetch: FetchKind,
	currency: Option<CurrencyCode>,
	error: IndexerError,
) -> bool {
	match &currency {
		Some(currency) => warn!("Failed to fetch {} {}: {}", currency, fetch, error),
		None => warn!("Failed to fetch {}: {}", fetch, error),
	}
	core.events
		.dispatch(SyncEvent::FetchFailed {
			fetch,
			currency,
			error: error.to_string(),
		})
		.await;
	false
}

async fn fetch_balance(core: &WalletCore, address: &str) -> bool {
	let native = CurrencyCode::native();
	match core.client.get_balance(address).await {
		Ok(balance) => {
			{
				let mut inner = core.state.lock().await;
				if !inner.alive {
					return true;
				}
				inner.apply_balance(&native, balance);
			}
			debug!("{} balance updated: {}", native, balance);
			core.events
				.dispatch(SyncEvent::BalanceUpdated {
					currency: native,
					balance,
				})
				.await;
			true
		}
		Err(e) => report_failure(core, FetchKind::Balance, Some(native), e).await,
	}
}

async fn fetch_transactions(core: &WalletCore, address: &str) -> bool {
	let native = CurrencyCode::native();
	match core.client.get_transaction_list(address).await {
		Ok(history) => {
			let count = {
				let mut inner = core.state.lock().await;
				if !inner.alive {
					return true;
				}
				inner.native_history = history;
				let count = inner
					.rebuild_view(&native, core.account.primary_address(), core.metadata.as_ref())
					.await;
				count
			};
			debug!("{} view rebuilt with {} entries", native, count);
			core.events
				.dispatch(SyncEvent::TransactionsUpdated {
					currency: native,
					count,
				})
				.await;
			true
		}
		Err(e) => report_failure(core, FetchKind::Transactions, Some(native), e).await,
	}
}

async fn fetch_token_balance(core: &WalletCore, address: &str, token: &Token) -> bool {
	let currency = token.currency();
	match core.client.get_token_balance(address, token).await {
		Ok(balance) => {
			{
				let mut inner = core.state.lock().await;
				if !inner.alive || !inner.has_token(&currency) {
					debug!("Discarding {} balance for untracked token", currency);
					return true;
				}
				inner.apply_balance(&currency, balance);
			}
			debug!("{} balance updated: {}", currency, balance);
			core.events
				.dispatch(SyncEvent::BalanceUpdated { currency, balance })
				.await;
			true
		}
		Err(e) => report_failure(core, FetchKind::TokenBalance, Some(currency), e).await,
	}
}

async fn fetch_token_transactions(core: &WalletCore, address: &str, token: &Token) -> bool {
	let currency = token.currency();
	match core.client.get_token_transaction_list(address, token).await {
		Ok(events) => {
			let count = {
				let mut inner = core.state.lock().await;
				if !inner.alive || !inner.has_token(&currency) {
					debug!("Discarding {} history for untracked token", currency);
					return true;
				}
				inner.token_history.insert(currency.clone(), events);
				let count = inner
					.rebuild_view(&currency, core.account.primary_address(), core.metadata.as_ref())
					.await;
				count
			};
			debug!("{} view rebuilt with {} entries", currency, count);
			core.events
				.dispatch(SyncEvent::TransactionsUpdated { currency, count })
				.await;
			true
		}
		Err(e) => report_failure(core, FetchKind::TokenTransactions, Some(currency), e).await,
	}
}

async fn fetch_block_height(core: &WalletCore) -> bool {
	match core.client.get_latest_block_number().await {
		Ok(height) => {
			{
				let mut inner = core.state.lock().await;
				if !inner.alive {
					return true;
				}
				inner.apply_block_height(height);
				inner
					.rebuild_all(core.account.primary_address(), core.metadata.as_ref())
					.await;
			}
			debug!("Chain height updated: {}", height);
			core.events
				.dispatch(SyncEvent::BlockHeightUpdated { height })
				.await;
			true
		}
		Err(e) => report_failure(core, FetchKind::BlockHeight, None, e).await,
	}
}
