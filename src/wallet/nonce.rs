//! Next-nonce derivation from the reconciled native view.

use crate::wallet::WalletTransaction;

/// Next sequence number for `self_address`.
///
/// Considers every entry sent by `self_address` (compared case-insensitively), pending or
/// confirmed, and returns the highest nonce plus one. Returns 0 when the account has never
/// sent anything.
pub fn next_nonce<'a, I>(self_address: &str, transactions: I) -> u64
where
	I: IntoIterator<Item = &'a WalletTransaction>,
{
	transactions
		.into_iter()
		.filter(|tx| tx.from.eq_ignore_ascii_case(self_address))
		.filter_map(|tx| tx.nonce)
		.max()
		.map_or(0, |nonce| nonce + 1)
}
