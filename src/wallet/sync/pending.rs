//! Locally submitted transactions awaiting confirmation.

use crate::indexer::TokenTransferEvent;
use crate::wallet::CurrencyCode;

use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Native transaction this wallet signed and broadcast, shaped like a confirmed record with
/// no block yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
	pub hash: String,
	pub from: String,
	pub to: String,
	/// Value in wei. Zero for token contract calls.
	pub value: u128,
	pub nonce: u64,
	pub gas_price: u128,
	pub gas_limit: u64,
	/// Always 0 until confirmed.
	pub block_number: u64,
	/// Always 0 until confirmed.
	pub confirmations: u64,
	/// Submission time, unix seconds.
	pub timestamp: u64,
	/// Signed payload as broadcast, `0x` hex.
	pub raw: String,
}

/// Record held by the tracker for one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEntry {
	Native(PendingTransaction),
	/// Placeholder transfer event for a just-submitted token send.
	TokenTransfer(TokenTransferEvent),
}

impl PendingEntry {
	pub fn hash(&self) -> &str {
		match self {
			PendingEntry::Native(tx) => &tx.hash,
			PendingEntry::TokenTransfer(event) => &event.transaction_hash,
		}
	}
}

/// Optimistically applied records per currency, in insertion order.
#[derive(Debug, Default)]
pub struct PendingTransactionTracker {
	entries: HashMap<CurrencyCode, Vec<PendingEntry>>,
}

impl PendingTransactionTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Start tracking `currency` with an empty collection. No-op if already tracked.
	pub fn register_currency(&mut self, currency: &CurrencyCode) {
		self.entries.entry(currency.clone()).or_default();
	}

	/// Stop tracking `currency`, dropping its records.
	pub fn remove_currency(&mut self, currency: &CurrencyCode) {
		self.entries.remove(currency);
	}

	/// Append a record. Duplicates are not detected.
	pub fn add_pending(&mut self, currency: &CurrencyCode, entry: PendingEntry) {
		self.entries.entry(currency.clone()).or_default().push(entry);
	}

	/// Drop every record of `currency` whose hash appears in `confirmed_hashes`.
	///
	/// `confirmed_hashes` must be lowercase. Returns the number of records removed.
	pub fn reconcile_against_confirmed(
		&mut self,
		currency: &CurrencyCode,
		confirmed_hashes: &HashSet<String>,
	) -> usize {
		let Some(entries) = self.entries.get_mut(currency) else {
			return 0;
		};
		let before = entries.len();
		entries.retain(|entry| !confirmed_hashes.contains(&entry.hash().to_lowercase()));
		let removed = before - entries.len();
		if removed > 0 {
			debug!("{} pending {} transactions confirmed", removed, currency);
		}
		removed
	}

	pub fn pending(&self, currency: &CurrencyCode) -> &[PendingEntry] {
		self.entries
			.get(currency)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Drop all records of all currencies, keeping the registrations.
	pub fn clear(&mut self) {
		for entries in self.entries.values_mut() {
			entries.clear();
		}
	}

	pub fn is_empty(&self) -> bool {
		self.entries.values().all(Vec::is_empty)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn native(hash: &str, nonce: u64) -> PendingEntry {
		PendingEntry::Native(PendingTransaction {
			hash: hash.to_string(),
			from: "0xaaaa000000000000000000000000000000000001".to_string(),
			to: "0xbbbb000000000000000000000000000000000002".to_string(),
			value: 10,
			nonce,
			gas_price: 1,
			gas_limit: 48_000,
			block_number: 0,
			confirmations: 0,
			timestamp: 1_700_000_000,
			raw: "0x00".to_string(),
		})
	}

	#[test]
	fn keeps_insertion_order_without_dedup() {
		let eth = CurrencyCode::native();
		let mut tracker = PendingTransactionTracker::new();
		tracker.add_pending(&eth, native("0x01", 1));
		tracker.add_pending(&eth, native("0x02", 2));
		tracker.add_pending(&eth, native("0x01", 1));

		let hashes: Vec<&str> = tracker.pending(&eth).iter().map(PendingEntry::hash).collect();
		assert_eq!(hashes, vec!["0x01", "0x02", "0x01"]);
	}

	#[test]
	fn confirmed_hashes_remove_records_regardless_of_case() {
		let eth = CurrencyCode::native();
		let mut tracker = PendingTransactionTracker::new();
		tracker.add_pending(&eth, native("0xAB", 1));
		tracker.add_pending(&eth, native("0xcd", 2));

		let confirmed: HashSet<String> = ["0xab".to_string()].into_iter().collect();
		assert_eq!(tracker.reconcile_against_confirmed(&eth, &confirmed), 1);
		assert_eq!(tracker.pending(&eth).len(), 1);
		assert_eq!(tracker.pending(&eth)[0].hash(), "0xcd");
	}

	#[test]
	fn placeholders_reconcile_like_transactions() {
		let dai = CurrencyCode::new("DAI");
		let mut tracker = PendingTransactionTracker::new();
		tracker.register_currency(&dai);
		tracker.add_pending(
			&dai,
			PendingEntry::TokenTransfer(TokenTransferEvent::placeholder(
				"0x6b175474e89094c44da98b954eedeac495271d0f",
				"0xaaaa000000000000000000000000000000000001",
				"0xbbbb000000000000000000000000000000000002",
				5,
				1_700_000_000,
				"0xfeed",
			)),
		);

		let confirmed: HashSet<String> = ["0xfeed".to_string()].into_iter().collect();
		tracker.reconcile_against_confirmed(&dai, &confirmed);
		assert!(tracker.pending(&dai).is_empty());
	}

	#[test]
	fn clear_and_unknown_currencies() {
		let eth = CurrencyCode::native();
		let mut tracker = PendingTransactionTracker::new();
		tracker.add_pending(&eth, native("0x01", 0));
		tracker.clear();
		assert!(tracker.is_empty());
		assert!(tracker.pending(&CurrencyCode::new("USDC")).is_empty());
		assert_eq!(
			tracker.reconcile_against_confirmed(&CurrencyCode::new("USDC"), &HashSet::new()),
			0
		);
	}
}
