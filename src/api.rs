//! Caller-facing operations against the resource service.
//!
//! [`ResourceClient`] maps list/get/create/update/delete calls onto [`Target`]s in one of
//! the four known partitions and runs them through a shared [`Coordinator`] with strict
//! semantics. Every call takes the caller's [`CancelToken`] and returns the decoded JSON
//! body; an empty body decodes as [`Value::Null`].

mod files;
mod keys;
mod streams;
mod uploads;

// self
use crate::{
	_prelude::*,
	auth::PartitionName,
	cancel::CancelToken,
	coordinator::{Coordinator, OperationOptions, Target},
	http::ApiTransport,
};

/// Partition of stream operations.
pub const STREAMS: &str = "streams";
/// Partition of file operations.
pub const FILES: &str = "files";
/// Partition of key operations.
pub const KEYS: &str = "keys";
/// Partition of upload operations.
pub const UPLOADS: &str = "uploads";

/// Typed entry point for the resource service.
pub struct ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	coordinator: Arc<Coordinator<T>>,
}
impl<T> ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Wraps a shared coordinator.
	pub fn new(coordinator: Arc<Coordinator<T>>) -> Self {
		Self { coordinator }
	}

	/// Coordinator every call goes through.
	pub fn coordinator(&self) -> &Arc<Coordinator<T>> {
		&self.coordinator
	}

	async fn call(
		&self,
		partition: &'static str,
		target: Target,
		cancel: &CancelToken,
	) -> Result<Value> {
		let target = target.in_partition(PartitionName::from_static(partition));

		self.coordinator.perform_json(target, &OperationOptions::new(cancel.clone())).await
	}
}
impl<T> Clone for ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { coordinator: self.coordinator.clone() }
	}
}
impl<T> Debug for ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResourceClient").field("coordinator", &self.coordinator).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn known_partitions_are_valid_names() {
		for name in [STREAMS, FILES, KEYS, UPLOADS] {
			assert!(PartitionName::new(name).is_ok(), "`{name}` should be a valid partition.");
		}
	}
}
