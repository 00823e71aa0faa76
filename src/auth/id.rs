//! Validated partition identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const PARTITION_MAX_LEN: usize = 128;

/// Error returned when partition name validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum PartitionNameError {
	/// The name was empty.
	#[error("Partition name cannot be empty.")]
	Empty,
	/// The name contains whitespace characters.
	#[error("Partition name contains whitespace.")]
	ContainsWhitespace,
	/// The name exceeded the allowed character count.
	#[error("Partition name exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Name of a logical resource partition with its own partition-token lifecycle
/// (e.g. `streams`, `files`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionName(String);
impl PartitionName {
	/// Creates a new partition name after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, PartitionNameError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Wraps a compile-time partition name that is known to satisfy validation.
	pub(crate) fn from_static(value: &'static str) -> Self {
		debug_assert!(validate_view(value).is_ok(), "Static partition `{value}` is invalid.");

		Self(value.to_owned())
	}
}
impl Deref for PartitionName {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for PartitionName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<PartitionName> for String {
	fn from(value: PartitionName) -> Self {
		value.0
	}
}
impl TryFrom<String> for PartitionName {
	type Error = PartitionNameError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for PartitionName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for PartitionName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Partition({})", self.0)
	}
}
impl Display for PartitionName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for PartitionName {
	type Err = PartitionNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), PartitionNameError> {
	if view.is_empty() {
		return Err(PartitionNameError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(PartitionNameError::ContainsWhitespace);
	}
	if view.len() > PARTITION_MAX_LEN {
		return Err(PartitionNameError::TooLong { max: PARTITION_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn names_validate() {
		assert!(PartitionName::new(" streams").is_err(), "Leading whitespace must be rejected.");
		assert!(PartitionName::new("").is_err());
		assert!(PartitionName::new("a".repeat(PARTITION_MAX_LEN + 1)).is_err());

		let name = PartitionName::new("streams").expect("Partition fixture should be valid.");

		assert_eq!(name.as_ref(), "streams");
		assert_eq!(format!("{name:?}"), "Partition(streams)");
	}

	#[test]
	fn serde_enforces_validation() {
		let name: PartitionName =
			serde_json::from_str("\"files\"").expect("Partition should deserialize.");

		assert_eq!(&*name, "files");
		assert!(serde_json::from_str::<PartitionName>("\"with space\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<PartitionName, u8> = HashMap::from_iter([(
			PartitionName::new("keys").expect("Partition used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("keys"), Some(&7));
	}
}
