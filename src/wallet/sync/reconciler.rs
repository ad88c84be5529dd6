//! Merging of pending and confirmed records into one transaction view.

use crate::wallet::WalletTransaction;
use std::collections::HashSet;

/// Merge `pending` and `confirmed` into a single view: pending entries first, in insertion
/// order, followed by the confirmed entries.
///
/// Each hash occurs once, compared case-insensitively. A pending entry whose hash also
/// appears in `confirmed` is dropped so the confirmed record wins, and repeated confirmed
/// hashes (several transfer logs emitted by one transaction) keep their first entry. With `sort_confirmed_desc` the confirmed entries are
/// ordered by timestamp, newest first; otherwise their order is kept as fetched.
pub fn merge(
	pending: Vec<WalletTransaction>,
	mut confirmed: Vec<WalletTransaction>,
	sort_confirmed_desc: bool,
) -> Vec<WalletTransaction> {
	if sort_confirmed_desc {
		confirmed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
	}

	let mut confirmed_hashes: HashSet<String> = HashSet::with_capacity(confirmed.len());
	confirmed.retain(|tx| confirmed_hashes.insert(tx.hash.to_lowercase()));

	let mut merged: Vec<WalletTransaction> = pending
		.into_iter()
		.filter(|tx| !confirmed_hashes.contains(&tx.hash.to_lowercase()))
		.collect();
	merged.extend(confirmed);
	merged
}
