use crate::indexer::{RawTransaction, TokenTransferEvent};
use crate::transaction::Address;
use crate::utils::parse_quantity;
use crate::wallet::sync::pending::{PendingEntry, PendingTransaction};
use crate::wallet::{CurrencyCode, Direction, TransactionStatus, WalletError, WalletTransaction};

use tracing::{debug, error};

/// Decodes wire and pending records into view entries relative to one account.
#[derive(Clone)]
pub struct TransactionProcessor {
	address: Address,
	latest_block: Option<u64>,
}

impl TransactionProcessor {
	pub fn new(address: Address, latest_block: Option<u64>) -> Self {
		Self {
			address,
			latest_block,
		}
	}

	fn direction(&self, from: &str, to: &str) -> Direction {
		match (self.address.matches(from), self.address.matches(to)) {
			(true, true) => Direction::Moved,
			(true, false) => Direction::Sent,
			_ => Direction::Received,
		}
	}

	/// Confirmations of a record mined in `block`, falling back to `reported` when the chain
	/// height is unknown or behind.
	fn confirmations(&self, block: Option<u64>, reported: u64) -> u64 {
		match (self.latest_block, block) {
			(Some(latest), Some(block)) if latest >= block => (latest - block + 1).max(reported),
			_ => reported,
		}
	}

	/// Process a confirmed native transaction
	pub fn process_transaction(&self, raw: &RawTransaction) -> WalletTransaction {
		WalletTransaction {
			hash: raw.hash.clone(),
			currency: CurrencyCode::native(),
			from: raw.from.to_lowercase(),
			to: raw.to.to_lowercase(),
			amount: raw.value,
			direction: self.direction(&raw.from, &raw.to),
			status: if raw.is_error {
				TransactionStatus::Failed
			} else {
				TransactionStatus::Confirmed
			},
			nonce: Some(raw.nonce),
			block_number: Some(raw.block_number),
			timestamp: raw.timestamp,
			confirmations: self.confirmations(Some(raw.block_number), raw.confirmations),
			gas_price: Some(raw.gas_price),
			gas_limit: Some(raw.gas_limit),
			gas_used: Some(raw.gas_used),
			metadata: None,
		}
	}

	/// Process a token transfer event, pending placeholder or confirmed
	pub fn process_transfer_event(
		&self,
		currency: &CurrencyCode,
		event: &TokenTransferEvent,
	) -> Result<WalletTransaction, WalletError> {
		let (Some(from), Some(to)) = (event.sender(), event.recipient()) else {
			error!(
				"[PROCESS_TRANSFER] Transfer event {} is missing address topics",
				event.transaction_hash
			);
			return Err(WalletError::DecodeFailure(format!(
				"transfer event {} is missing address topics",
				event.transaction_hash
			)));
		};
		let amount = parse_quantity(&event.data).map_err(|e| {
			error!("[PROCESS_TRANSFER] Failed to decode amount: {}", e);
			WalletError::DecodeFailure(format!(
				"transfer event {}: {}",
				event.transaction_hash, e
			))
		})?;

		Ok(WalletTransaction {
			hash: event.transaction_hash.clone(),
			currency: currency.clone(),
			direction: self.direction(&from, &to),
			from,
			to,
			amount,
			status: if event.is_complete {
				TransactionStatus::Confirmed
			} else {
				TransactionStatus::Pending
			},
			nonce: None,
			block_number: event.block_number,
			timestamp: event.timestamp,
			confirmations: if event.is_complete {
				self.confirmations(event.block_number, 0)
			} else {
				0
			},
			gas_price: None,
			gas_limit: None,
			gas_used: None,
			metadata: None,
		})
	}

	/// Process a locally submitted native transaction
	pub fn process_pending(&self, pending: &PendingTransaction) -> WalletTransaction {
		WalletTransaction {
			hash: pending.hash.clone(),
			currency: CurrencyCode::native(),
			from: pending.from.clone(),
			to: pending.to.clone(),
			amount: pending.value,
			direction: self.direction(&pending.from, &pending.to),
			status: TransactionStatus::Pending,
			nonce: Some(pending.nonce),
			block_number: None,
			timestamp: pending.timestamp,
			confirmations: pending.confirmations,
			gas_price: Some(pending.gas_price),
			gas_limit: Some(pending.gas_limit),
			gas_used: None,
			metadata: None,
		}
	}

	/// Batch process a currency's pending records, skipping undecodable ones
	pub fn process_pending_batch(
		&self,
		currency: &CurrencyCode,
		entries: &[PendingEntry],
	) -> Vec<WalletTransaction> {
		entries
			.iter()
			.filter_map(|entry| match entry {
				PendingEntry::Native(tx) => Some(self.process_pending(tx)),
				PendingEntry::TokenTransfer(event) => {
					self.process_transfer_event(currency, event).ok()
				}
			})
			.collect()
	}

	/// Batch process confirmed transfer events, skipping undecodable ones
	pub fn process_transfer_batch(
		&self,
		currency: &CurrencyCode,
		events: &[TokenTransferEvent],
	) -> Vec<WalletTransaction> {
		let processed: Vec<WalletTransaction> = events
			.iter()
			.filter_map(|event| self.process_transfer_event(currency, event).ok())
			.collect();
		if processed.len() != events.len() {
			debug!(
				"Skipped {} undecodable {} transfer events",
				events.len() - processed.len(),
				currency
			);
		}
		processed
	}
}
