//! Progress tracking for refresh cycles.
//!
//! This module provides the `CycleProgressTracker`, which records the outcome of every fetch
//! a refresh cycle issues and summarizes the cycle once all fetches have settled.

use super::events::FetchKind;
use crate::wallet::CurrencyCode;

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Records fetch outcomes for one refresh cycle
#[derive(Debug, Clone)]
pub struct CycleProgressTracker {
	cycle: u64,
	started_at: Instant,
	succeeded: usize,
	failed: Vec<(FetchKind, Option<CurrencyCode>)>,
}

impl CycleProgressTracker {
	pub fn new(cycle: u64) -> Self {
		Self {
			cycle,
			started_at: Instant::now(),
			succeeded: 0,
			failed: Vec::new(),
		}
	}

	/// Record the outcome of one fetch
	pub fn record(&mut self, fetch: FetchKind, currency: Option<CurrencyCode>, ok: bool) {
		if ok {
			self.succeeded += 1;
		} else {
			self.failed.push((fetch, currency));
		}
	}

	/// Finish the cycle and log its summary
	pub fn finish(self) -> CycleStats {
		let stats = CycleStats {
			cycle: self.cycle,
			succeeded: self.succeeded,
			failed: self.failed,
			elapsed: self.started_at.elapsed(),
		};
		if stats.is_clean() {
			info!("{}", stats.summary());
		} else {
			warn!("{}", stats.summary());
		}
		stats
	}
}

/// Statistics about one refresh cycle
#[derive(Debug, Clone)]
pub struct CycleStats {
	pub cycle: u64,
	pub succeeded: usize,
	pub failed: Vec<(FetchKind, Option<CurrencyCode>)>,
	pub elapsed: Duration,
}

impl CycleStats {
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}

	/// Get a human-readable summary of the cycle
	pub fn summary(&self) -> String {
		format!(
			"Refresh cycle {}: {} fetches succeeded, {} failed in {:?}{}",
			self.cycle,
			self.succeeded,
			self.failed.len(),
			self.elapsed,
			if self.failed.is_empty() {
				String::new()
			} else {
				let failures: Vec<String> = self
					.failed
					.iter()
					.map(|(fetch, currency)| match currency {
						Some(currency) => format!("{currency} {fetch}"),
						None => fetch.to_string(),
					})
					.collect();
				format!(" ({})", failures.join(", "))
			}
		)
	}
}
