/// Render an integer amount of base units with `decimals` fractional digits.
///
/// Trailing zeros are kept so amounts line up in logs, e.g. `1500000000000000000` with
/// 18 decimals renders as `1.500000000000000000`.
pub fn format_token_amount(amount: u128, decimals: u32) -> String {
	if decimals == 0 {
		return amount.to_string();
	}
	let scale = 10u128.checked_pow(decimals);
	match scale {
		Some(scale) => format!(
			"{}.{:0width$}",
			amount / scale,
			amount % scale,
			width = decimals as usize
		),
		// 10^decimals exceeds u128, so the whole amount is fractional
		None => format!("0.{:0>width$}", amount, width = decimals as usize),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_whole_and_fractional_parts() {
		assert_eq!(format_token_amount(1_500_000, 6), "1.500000");
		assert_eq!(format_token_amount(42, 0), "42");
		assert_eq!(format_token_amount(5, 3), "0.005");
		assert_eq!(
			format_token_amount(1_000_000_000_000_000_000, 18),
			"1.000000000000000000"
		);
	}
}
