// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for coordinator activity.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
	transport_calls: AtomicU64,
	credential_refreshes: AtomicU64,
	partition_refreshes: AtomicU64,
	retries: AtomicU64,
}
impl CoordinatorMetrics {
	/// Returns the number of requests handed to the transport.
	pub fn transport_calls(&self) -> u64 {
		self.transport_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of bearer credential refreshes sent to the service.
	pub fn credential_refreshes(&self) -> u64 {
		self.credential_refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of partition token refreshes sent to the service.
	pub fn partition_refreshes(&self) -> u64 {
		self.partition_refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of requests retried after a `401`.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	pub(crate) fn record_transport_call(&self) {
		self.transport_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_credential_refresh(&self) {
		self.credential_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_partition_refresh(&self) {
		self.partition_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}
}
