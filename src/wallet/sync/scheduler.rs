//! Refresh admission: the idle/refreshing state machine behind periodic sync.
//!
//! At most one refresh cycle runs at a time. Requests arriving while a cycle runs are either
//! skipped (timer ticks) or folded into a single follow-up cycle (everything else). Callers
//! can wait for a given cycle number to complete through a watch channel.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
	Timer,
	Manual,
	PostSend,
	TokensChanged,
}

/// Outcome of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	/// The caller must run cycle `cycle` now.
	Start { cycle: u64 },
	/// A cycle is running; the request is served by cycle `until`, which follows it.
	Coalesced { until: u64 },
	/// Timer tick while a cycle runs.
	Skipped,
	/// The scheduler was halted.
	Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Idle,
	Refreshing,
	Halted,
}

#[derive(Debug)]
struct SchedulerState {
	phase: Phase,
	rerun: bool,
	/// Number of the most recently started cycle.
	started: u64,
	completed: u64,
}

pub struct SyncScheduler {
	state: Mutex<SchedulerState>,
	completed: watch::Sender<u64>,
	timer: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
	pub fn new() -> Self {
		let (completed, _) = watch::channel(0);
		Self {
			state: Mutex::new(SchedulerState {
				phase: Phase::Idle,
				rerun: false,
				started: 0,
				completed: 0,
			}),
			completed,
			timer: Mutex::new(None),
		}
	}

	fn state(&self) -> MutexGuard<'_, SchedulerState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Request a cycle.
	pub fn begin(&self, trigger: RefreshTrigger) -> Admission {
		let mut state = self.state();
		match state.phase {
			Phase::Halted => Admission::Halted,
			Phase::Idle => {
				state.phase = Phase::Refreshing;
				state.started += 1;
				debug!("Starting refresh cycle {} ({:?})", state.started, trigger);
				Admission::Start {
					cycle: state.started,
				}
			}
			Phase::Refreshing if trigger == RefreshTrigger::Timer => {
				debug!("Refresh cycle {} still running, skipping tick", state.started);
				Admission::Skipped
			}
			Phase::Refreshing => {
				state.rerun = true;
				debug!(
					"Refresh cycle {} running, {:?} request coalesced",
					state.started, trigger
				);
				Admission::Coalesced {
					until: state.started + 1,
				}
			}
		}
	}

	/// Mark the running cycle complete.
	///
	/// Returns the number of the follow-up cycle the caller must run next, if any request
	/// was coalesced while the cycle ran.
	pub fn finish(&self) -> Option<u64> {
		let mut state = self.state();
		if state.phase == Phase::Halted {
			return None;
		}
		state.completed = state.started;
		self.completed.send_replace(state.completed);

		if state.rerun {
			state.rerun = false;
			state.started += 1;
			debug!("Starting coalesced refresh cycle {}", state.started);
			Some(state.started)
		} else {
			state.phase = Phase::Idle;
			None
		}
	}

	/// Wait until cycle `cycle` has completed or the scheduler is halted.
	pub async fn wait_for(&self, cycle: u64) {
		let mut completed = self.completed.subscribe();
		// The sender lives as long as `self`
		let _ = completed.wait_for(|done| *done >= cycle).await;
	}

	pub fn is_refreshing(&self) -> bool {
		self.state().phase == Phase::Refreshing
	}

	pub fn is_halted(&self) -> bool {
		self.state().phase == Phase::Halted
	}

	/// Number of the most recently completed cycle.
	pub fn completed_cycles(&self) -> u64 {
		self.state().completed
	}

	/// Attach the periodic timer task, aborting any previous one.
	pub fn set_timer(&self, handle: JoinHandle<()>) {
		let previous = self
			.timer
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.replace(handle);
		if let Some(previous) = previous {
			previous.abort();
		}
	}

	pub fn stop_timer(&self) {
		let handle = self
			.timer
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.take();
		if let Some(handle) = handle {
			handle.abort();
		}
	}

	/// Stop admitting cycles and release every waiter. Irreversible.
	pub fn halt(&self) {
		self.state().phase = Phase::Halted;
		self.stop_timer();
		self.completed.send_replace(u64::MAX);
	}
}

impl Default for SyncScheduler {
	fn default() -> Self {
		Self::new()
	}
}
