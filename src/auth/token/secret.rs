//! Credential material that formats as `<redacted>`.

// self
use crate::_prelude::*;

/// Bearer, refresh, or partition token value.
///
/// `Debug` and `Display` never print the value; only [`expose`](Self::expose) does, and the
/// coordinator calls it solely to build the `Authorization` header or the `csrf_token`
/// parameter. On the wire it is a plain JSON string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw value, for placing on an outgoing request.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Secret(<redacted>)")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_dumps_do_not_leak_credentials() {
		let session = vec![Secret::new("access-7"), Secret::new("refresh-7")];
		let dump = format!("{session:?} {}", session[1]);

		assert_eq!(dump, "[Secret(<redacted>), Secret(<redacted>)] <redacted>");
		assert_eq!(session[0].expose(), "access-7");
	}

	#[test]
	fn wire_value_is_a_plain_string() {
		let secret: Secret =
			serde_json::from_str("\"csrf-1\"").expect("Token string should deserialize.");

		assert_eq!(secret.expose(), "csrf-1");
		assert_eq!(
			serde_json::to_string(&secret).expect("Secret should serialize."),
			"\"csrf-1\""
		);
	}
}
