//! Optional observability helpers for coordinator operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_token_broker.operation` with the
//!   `kind` (operation kind) and `stage` (call site) fields, plus debug/warn events for
//!   refreshes, retries, and released waiters.
//! - Enable `metrics` to increment the `session_token_broker_operation_total` counter for
//!   every attempt/success/failure/cancellation, labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a `tracing` event when the `tracing` feature is enabled; expands to nothing
/// otherwise.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	}};
}
pub(crate) use event;

/// Operation kinds observed by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Caller-facing request against a resource partition.
	Resource,
	/// Bearer credential refresh through the refresh credential.
	CredentialRefresh,
	/// Partition token refresh through the bearer credential.
	PartitionRefresh,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Resource => "resource",
			OperationKind::CredentialRefresh => "credential_refresh",
			OperationKind::PartitionRefresh => "partition_refresh",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a coordinator operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Caller cancelled the operation.
	Cancelled,
}
impl OperationOutcome {
	/// Classifies a finished operation.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(e) if e.is_cancelled() => Self::Cancelled,
			Err(_) => Self::Failure,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::cancel::CancelReason;

	#[test]
	fn outcome_classifies_cancellation_separately() {
		let cancelled: Result<()> = Err(Error::Cancelled { reason: CancelReason::new("stop") });
		let failed: Result<()> = Err(Error::RefreshFailed);

		assert_eq!(OperationOutcome::of(&Ok(())), OperationOutcome::Success);
		assert_eq!(OperationOutcome::of(&cancelled), OperationOutcome::Cancelled);
		assert_eq!(OperationOutcome::of(&failed), OperationOutcome::Failure);
	}
}
