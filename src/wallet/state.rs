//! Mutable wallet state guarded by the manager's state lock.

use crate::config::GasConfig;
use crate::indexer::{RawTransaction, TokenTransferEvent};
use crate::transaction::Address;
use crate::wallet::gas::GasPolicy;
use crate::wallet::metadata::MetadataStore;
use crate::wallet::nonce::next_nonce;
use crate::wallet::sync::pending::PendingTransactionTracker;
use crate::wallet::sync::reconciler;
use crate::wallet::sync::transaction_processor::TransactionProcessor;
use crate::wallet::{CurrencyCode, Token, WalletTransaction};

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Presentation-facing state of one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSyncState {
	pub currency: CurrencyCode,
	/// Last successfully fetched balance in base units, `None` until the first fetch.
	pub balance: Option<u128>,
	/// Merged view, pending entries first.
	pub transactions: Vec<WalletTransaction>,
	/// Last-known chain height.
	pub block_height: Option<u64>,
	pub last_updated: Option<DateTime<Utc>>,
}

impl WalletSyncState {
	pub fn new(currency: CurrencyCode) -> Self {
		Self {
			currency,
			balance: None,
			transactions: Vec::new(),
			block_height: None,
			last_updated: None,
		}
	}

	pub fn pending_count(&self) -> usize {
		self.transactions.iter().filter(|tx| tx.is_pending()).count()
	}
}

/// Everything the refresh cycle and the send path mutate.
pub(crate) struct WalletInner {
	pub alive: bool,
	pub tokens: Vec<Token>,
	pub gas: GasPolicy,
	pub pending: PendingTransactionTracker,
	/// Last-known-good confirmed native history, as fetched.
	pub native_history: Vec<RawTransaction>,
	/// Last-known-good confirmed transfer events per token.
	pub token_history: HashMap<CurrencyCode, Vec<TokenTransferEvent>>,
	pub sync: HashMap<CurrencyCode, WalletSyncState>,
	pub latest_block: Option<u64>,
}

impl WalletInner {
	pub fn new(tokens: Vec<Token>, gas: &GasConfig) -> Self {
		let mut inner = Self {
			alive: true,
			tokens: Vec::new(),
			gas: GasPolicy::new(gas),
			pending: PendingTransactionTracker::new(),
			native_history: Vec::new(),
			token_history: HashMap::new(),
			sync: HashMap::new(),
			latest_block: None,
		};
		inner.register_currency(&CurrencyCode::native());
		inner.set_tokens(tokens);
		inner
	}

	fn register_currency(&mut self, currency: &CurrencyCode) {
		self.pending.register_currency(currency);
		let latest_block = self.latest_block;
		self.sync
			.entry(currency.clone())
			.or_insert_with(|| WalletSyncState {
				block_height: latest_block,
				..WalletSyncState::new(currency.clone())
			});
	}

	fn unregister_currency(&mut self, currency: &CurrencyCode) {
		if currency.is_native() {
			return;
		}
		self.pending.remove_currency(currency);
		self.token_history.remove(currency);
		self.sync.remove(currency);
	}

	/// Replace the token set. Returns the codes of the currencies that were dropped.
	pub fn set_tokens(&mut self, tokens: Vec<Token>) -> Vec<CurrencyCode> {
		let tokens: Vec<Token> = tokens
			.into_iter()
			.filter(|token| {
				let native = token.currency().is_native();
				if native {
					warn!(
						"Ignoring token {} at {}: its code collides with the native asset",
						token.code, token.address
					);
				}
				!native
			})
			.collect();
		let keep: HashSet<CurrencyCode> = tokens.iter().map(Token::currency).collect();
		let dropped: Vec<CurrencyCode> = self
			.tokens
			.iter()
			.map(Token::currency)
			.filter(|currency| !keep.contains(currency))
			.collect();
		for currency in &dropped {
			self.unregister_currency(currency);
		}

		let mut unique: Vec<Token> = Vec::with_capacity(tokens.len());
		for token in tokens {
			if unique.iter().any(|t| t.currency() == token.currency()) {
				warn!("Ignoring duplicate token code {}", token.code);
				continue;
			}
			self.register_currency(&token.currency());
			unique.push(token);
		}
		self.tokens = unique;
		dropped
	}

	pub fn token(&self, currency: &CurrencyCode) -> Option<&Token> {
		self.tokens.iter().find(|t| &t.currency() == currency)
	}

	pub fn has_token(&self, currency: &CurrencyCode) -> bool {
		self.token(currency).is_some()
	}

	pub fn tracks(&self, currency: &CurrencyCode) -> bool {
		currency.is_native() || self.has_token(currency)
	}

	pub fn sync_state_mut(&mut self, currency: &CurrencyCode) -> &mut WalletSyncState {
		self.sync
			.entry(currency.clone())
			.or_insert_with(|| WalletSyncState::new(currency.clone()))
	}

	pub fn apply_balance(&mut self, currency: &CurrencyCode, balance: u128) {
		let state = self.sync_state_mut(currency);
		state.balance = Some(balance);
		state.last_updated = Some(Utc::now());
	}

	pub fn apply_block_height(&mut self, height: u64) {
		self.latest_block = Some(height);
		for state in self.sync.values_mut() {
			state.block_height = Some(height);
		}
	}

	/// Next nonce for `address` over the current native view.
	pub fn next_nonce(&self, address: &str) -> u64 {
		let native = CurrencyCode::native();
		let view = self
			.sync
			.get(&native)
			.map(|state| state.transactions.as_slice())
			.unwrap_or_default();
		next_nonce(address, view)
	}

	/// Reconcile `currency`'s pending records against its confirmed history and rebuild its
	/// merged view. Returns the number of entries in the new view.
	pub async fn rebuild_view(
		&mut self,
		currency: &CurrencyCode,
		address: &Address,
		metadata: &dyn MetadataStore,
	) -> usize {
		let processor = TransactionProcessor::new(address.clone(), self.latest_block);

		let confirmed: Vec<WalletTransaction> = if currency.is_native() {
			self.native_history
				.iter()
				.map(|raw| processor.process_transaction(raw))
				.collect()
		} else {
			let events = self
				.token_history
				.get(currency)
				.map(Vec::as_slice)
				.unwrap_or_default();
			processor.process_transfer_batch(currency, events)
		};

		let confirmed_hashes: HashSet<String> =
			confirmed.iter().map(|tx| tx.hash.to_lowercase()).collect();
		self.pending
			.reconcile_against_confirmed(currency, &confirmed_hashes);
		let pending = processor.process_pending_batch(currency, self.pending.pending(currency));

		let mut merged = reconciler::merge(pending, confirmed, !currency.is_native());
		for tx in merged.iter_mut() {
			match metadata.lookup(&tx.hash).await {
				Ok(found) => tx.metadata = found,
				Err(e) => warn!("Metadata lookup for {} failed: {}", tx.hash, e),
			}
		}

		let count = merged.len();
		let state = self.sync_state_mut(currency);
		state.transactions = merged;
		state.last_updated = Some(Utc::now());
		count
	}

	/// Rebuild every tracked currency's view.
	pub async fn rebuild_all(&mut self, address: &Address, metadata: &dyn MetadataStore) {
		let mut currencies = vec![CurrencyCode::native()];
		currencies.extend(self.tokens.iter().map(Token::currency));
		for currency in &currencies {
			self.rebuild_view(currency, address, metadata).await;
		}
	}

	/// Forget pending records, tokens and token states, and stop accepting updates.
	pub fn wipe(&mut self) {
		self.alive = false;
		self.pending.clear();
		self.set_tokens(Vec::new());
		if let Some(native) = self.sync.get_mut(&CurrencyCode::native()) {
			native.transactions.retain(|tx| !tx.is_pending());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wallet::metadata::InMemoryMetadataStore;
	use crate::wallet::sync::pending::{PendingEntry, PendingTransaction};

	const SELF: &str = "0xaaaa000000000000000000000000000000000001";
	const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";

	fn dai() -> Token {
		Token::new("Dai Stablecoin", "DAI", "DAI", DAI, 18)
	}

	fn pending(hash: &str, nonce: u64) -> PendingEntry {
		PendingEntry::Native(PendingTransaction {
			hash: hash.to_string(),
			from: SELF.to_string(),
			to: "0xbbbb000000000000000000000000000000000002".to_string(),
			value: 1,
			nonce,
			gas_price: 1,
			gas_limit: 48_000,
			block_number: 0,
			confirmations: 0,
			timestamp: 1,
			raw: "0x00".to_string(),
		})
	}

	#[test]
	fn token_set_changes_register_and_drop_currencies() {
		let mut inner = WalletInner::new(vec![dai()], &GasConfig::default());
		assert!(inner.sync.contains_key(&CurrencyCode::new("DAI")));

		let dropped = inner.set_tokens(vec![Token::new("USD Coin", "USDC", "USDC", "0x01", 6)]);
		assert_eq!(dropped, vec![CurrencyCode::new("DAI")]);
		assert!(!inner.sync.contains_key(&CurrencyCode::new("DAI")));
		assert!(inner.tracks(&CurrencyCode::new("USDC")));
		assert!(inner.tracks(&CurrencyCode::native()));
	}

	#[test]
	fn token_named_like_native_asset_is_rejected() {
		let wrapped = Token::new("Wrapped Ether", "eth", "ETH", "0x02", 18);
		let mut inner = WalletInner::new(vec![wrapped], &GasConfig::default());
		assert!(inner.tokens.is_empty());

		let native = CurrencyCode::native();
		inner.pending.add_pending(&native, pending("0x05", 5));
		let dropped = inner.set_tokens(Vec::new());
		assert!(dropped.is_empty());
		assert!(inner.sync.contains_key(&native));
		assert_eq!(inner.pending.pending(&native).len(), 1);
	}

	#[tokio::test]
	async fn dropping_tokens_never_touches_native_pending() {
		let address = Address::parse(SELF).expect("address");
		let store = InMemoryMetadataStore::new();
		let native = CurrencyCode::native();
		let mut inner = WalletInner::new(vec![dai()], &GasConfig::default());

		inner.pending.add_pending(&native, pending("0x05", 5));
		inner.rebuild_view(&native, &address, &store).await;
		inner.set_tokens(vec![Token::new("Wrapped Ether", "Eth", "ETH", "0x02", 18)]);

		assert!(inner.tokens.is_empty());
		assert_eq!(inner.sync[&native].pending_count(), 1);
		assert_eq!(inner.next_nonce(SELF), 6);
	}

	#[test]
	fn duplicate_token_codes_are_ignored() {
		let mut inner = WalletInner::new(Vec::new(), &GasConfig::default());
		inner.set_tokens(vec![dai(), dai()]);
		assert_eq!(inner.tokens.len(), 1);
	}

	#[tokio::test]
	async fn rebuild_drops_confirmed_pending_and_feeds_nonce() {
		let address = Address::parse(SELF).expect("address");
		let store = InMemoryMetadataStore::new();
		let native = CurrencyCode::native();
		let mut inner = WalletInner::new(Vec::new(), &GasConfig::default());

		inner.pending.add_pending(&native, pending("0x05", 5));
		inner.rebuild_view(&native, &address, &store).await;
		assert_eq!(inner.next_nonce(SELF), 6);

		inner.native_history = vec![RawTransaction {
			block_number: 10,
			timestamp: 2,
			value: 1,
			from: SELF.to_string(),
			to: "0xbbbb000000000000000000000000000000000002".to_string(),
			confirmations: 1,
			hash: "0x05".to_string(),
			nonce: 5,
			gas_price: 1,
			gas_limit: 48_000,
			gas_used: 21_000,
			is_error: false,
		}];
		assert_eq!(inner.rebuild_view(&native, &address, &store).await, 1);
		assert!(inner.pending.pending(&native).is_empty());
		assert_eq!(inner.sync[&native].pending_count(), 0);
		assert_eq!(inner.next_nonce(SELF), 6);
	}

	#[test]
	fn wipe_clears_tokens_and_pending() {
		let mut inner = WalletInner::new(vec![dai()], &GasConfig::default());
		inner.pending.add_pending(&CurrencyCode::native(), pending("0x01", 0));
		inner.wipe();
		assert!(!inner.alive);
		assert!(inner.tokens.is_empty());
		assert!(inner.pending.is_empty());
	}
}
