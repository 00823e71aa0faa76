//! Immutable bearer and refresh credentials.

// self
use crate::{_prelude::*, auth::Secret};

/// Short- or long-lived credential issued by the resource service.
///
/// Credentials are replaced wholesale and never mutated in place. Equality is structural,
/// which lets the retry guard tell whether a refresh actually produced a new value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
	/// Instant after which the service rejects the credential.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Opaque credential value; callers must avoid logging it.
	pub value: Secret,
}
impl Credential {
	/// Creates a credential from its value and expiry instant.
	pub fn new(value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { expires_at, value: Secret::new(value) }
	}

	/// Returns `true` if the credential is expired at `instant`, treating the final
	/// `leeway` before expiry as already expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime, leeway: Duration) -> bool {
		instant + leeway >= self.expires_at
	}

	/// Convenience helper that checks expiry against the current UTC clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc(), Duration::ZERO)
	}

	/// Returns `true` when both credentials carry the same secret value.
	pub fn same_value(&self, other: &Self) -> bool {
		self.value == other.value
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("expires_at", &self.expires_at)
			.field("value", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_honors_leeway() {
		let credential = Credential::new("access", macros::datetime!(2025-01-01 01:00 UTC));
		let now = macros::datetime!(2025-01-01 00:59 UTC);

		assert!(!credential.is_expired_at(now, Duration::ZERO));
		assert!(credential.is_expired_at(now, Duration::minutes(1)));
		assert!(credential.is_expired_at(macros::datetime!(2025-01-01 01:00 UTC), Duration::ZERO));
	}

	#[test]
	fn deserializes_camel_case_wire_shape() {
		let credential: Credential = serde_json::from_str(
			"{\"expiresAt\":\"2025-06-01T12:00:00Z\",\"value\":\"access-1\"}",
		)
		.expect("Credential should deserialize from the wire shape.");

		assert_eq!(credential.value.expose(), "access-1");
		assert_eq!(credential.expires_at, macros::datetime!(2025-06-01 12:00 UTC));
	}

	#[test]
	fn debug_redacts_value() {
		let credential = Credential::new("access", macros::datetime!(2025-01-01 01:00 UTC));

		assert!(!format!("{credential:?}").contains("access\""));
		assert!(format!("{credential:?}").contains("<redacted>"));
	}

	#[test]
	fn same_value_ignores_expiry() {
		let a = Credential::new("access", macros::datetime!(2025-01-01 01:00 UTC));
		let b = Credential::new("access", macros::datetime!(2025-01-01 02:00 UTC));

		assert!(a.same_value(&b));
		assert_ne!(a, b);
	}
}
