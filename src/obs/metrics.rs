// self
use crate::obs::{OperationKind, OperationOutcome};

/// Counts one coordinator operation event on `session_token_broker_operation_total`.
///
/// Every operation records an `attempt` on entry and exactly one of `success`, `failure`, or
/// `cancelled` on exit, so `attempt` minus the rest is the number still in flight. Without the
/// `metrics` feature nothing is recorded.
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"session_token_broker_operation_total",
		"kind" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::cancel::CancelReason;

	#[test]
	fn every_partition_refresh_outcome_can_be_recorded() {
		let cancelled: crate::error::Result<()> =
			Err(crate::error::Error::Cancelled { reason: CancelReason::new("shutdown") });

		for outcome in [
			OperationOutcome::Attempt,
			OperationOutcome::of(&Ok(())),
			OperationOutcome::of(&cancelled),
		] {
			record_operation_outcome(OperationKind::PartitionRefresh, outcome);
		}
	}
}
