//! Single-use partition (anti-forgery) tokens.

// self
use crate::{_prelude::*, auth::Secret};

/// Opaque single-use token scoped to one partition.
///
/// The value is consumed the moment it is handed to a caller. The type is not `Clone`: a
/// token moves from the queue to exactly one request.
#[derive(PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionToken(Secret);
impl PartitionToken {
	/// Wraps a token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Secret::new(value))
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.0.expose()
	}

	/// Consumes the token and returns the raw value.
	pub fn into_inner(self) -> String {
		self.0.expose().to_owned()
	}
}
impl From<&str> for PartitionToken {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for PartitionToken {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for PartitionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("PartitionToken(<redacted>)")
	}
}
