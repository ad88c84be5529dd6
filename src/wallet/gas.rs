use crate::config::GasConfig;
use tracing::debug;

/// Gas price and limits applied to outgoing transactions.
///
/// The stored price never exceeds the configured ceiling; larger requests are clamped.
#[derive(Debug, Clone)]
pub struct GasPolicy {
	gas_price: u128,
	max_gas_price: u128,
	native_gas_limit: u64,
	token_gas_limit: u64,
}

impl GasPolicy {
	pub fn new(config: &GasConfig) -> Self {
		Self {
			gas_price: config.default_gas_price.min(config.max_gas_price),
			max_gas_price: config.max_gas_price,
			native_gas_limit: config.native_gas_limit,
			token_gas_limit: config.token_gas_limit,
		}
	}

	/// Current gas price in wei.
	pub fn gas_price(&self) -> u128 {
		self.gas_price
	}

	pub fn max_gas_price(&self) -> u128 {
		self.max_gas_price
	}

	/// Store `gas_price`, clamped to the ceiling.
	pub fn set_gas_price(&mut self, gas_price: u128) {
		if gas_price > self.max_gas_price {
			debug!(
				"Clamping gas price {} to ceiling {}",
				gas_price, self.max_gas_price
			);
		}
		self.gas_price = gas_price.min(self.max_gas_price);
	}

	pub fn native_gas_limit(&self) -> u64 {
		self.native_gas_limit
	}

	pub fn token_gas_limit(&self) -> u64 {
		self.token_gas_limit
	}
}

impl Default for GasPolicy {
	fn default() -> Self {
		Self::new(&GasConfig::default())
	}
}
