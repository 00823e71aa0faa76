//! Partition token collections and the fresh-token envelope embedded in response bodies.

// self
use crate::{
	_prelude::*,
	auth::{Credential, PartitionName, PartitionToken},
};

const KEY_TOKENS_CAMEL: &str = "csrfTokens";
const KEY_TOKENS_SNAKE: &str = "csrf_tokens";
const KEY_TOKEN: &str = "csrf_token";
const KEY_ACCESS: &str = "accessToken";
const KEY_REFRESH: &str = "refreshToken";

/// Partition name → token map, used for initial configuration and for tokens harvested
/// from responses. Partitions without a token are simply absent.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TokenCollection(BTreeMap<PartitionName, PartitionToken>);
impl TokenCollection {
	/// Inserts or replaces the token for `partition`.
	pub fn insert(&mut self, partition: PartitionName, token: impl Into<PartitionToken>) {
		self.0.insert(partition, token.into());
	}

	/// Returns the token stored for `partition`, if any.
	pub fn get(&self, partition: &str) -> Option<&PartitionToken> {
		self.0.get(partition)
	}

	/// Number of partitions carrying a token.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no partition carries a token.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over partition/token pairs in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&PartitionName, &PartitionToken)> {
		self.0.iter()
	}

	fn merge_json(&mut self, value: &Value) {
		let Some(map) = value.as_object() else {
			return;
		};

		for (name, token) in map {
			// Null entries mean "no token for this partition"; invalid names are ignored.
			if let (Ok(name), Some(token)) = (PartitionName::new(name), token.as_str()) {
				self.0.insert(name, PartitionToken::new(token));
			}
		}
	}
}
impl IntoIterator for TokenCollection {
	type IntoIter = std::collections::btree_map::IntoIter<PartitionName, PartitionToken>;
	type Item = (PartitionName, PartitionToken);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl FromIterator<(PartitionName, PartitionToken)> for TokenCollection {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (PartitionName, PartitionToken)>,
	{
		Self(iter.into_iter().collect())
	}
}

/// Fresh tokens found in a response body.
///
/// Recognized shapes: `{ "csrfTokens": { partition: token } }`,
/// `{ "csrf_tokens": { partition: token } }`, `{ "csrf_token": token }` (applies to the
/// partition used by the request), plus `accessToken`/`refreshToken` credentials. Every
/// other field is ignored, and a malformed field is skipped without discarding the rest.
#[derive(Debug, Default)]
pub struct TokenEnvelope {
	/// Tokens keyed by partition.
	pub partition_tokens: TokenCollection,
	/// Token for the partition the request was made against.
	pub partition_token: Option<PartitionToken>,
	/// Newly issued bearer credential.
	pub access_token: Option<Credential>,
	/// Newly issued refresh credential.
	pub refresh_token: Option<Credential>,
}
impl TokenEnvelope {
	/// Extracts the envelope from a raw response body.
	///
	/// Returns `None` when the body is not a JSON object or carries no recognized token.
	pub fn from_body(body: &[u8]) -> Option<Self> {
		let value = serde_json::from_slice::<Value>(body).ok()?;

		Self::from_value(&value)
	}

	/// Extracts the envelope from an already decoded JSON value.
	pub fn from_value(value: &Value) -> Option<Self> {
		let object = value.as_object()?;
		let mut envelope = Self::default();

		for key in [KEY_TOKENS_CAMEL, KEY_TOKENS_SNAKE] {
			if let Some(tokens) = object.get(key) {
				envelope.partition_tokens.merge_json(tokens);
			}
		}

		envelope.partition_token =
			object.get(KEY_TOKEN).and_then(Value::as_str).map(PartitionToken::new);
		envelope.access_token = object.get(KEY_ACCESS).and_then(credential_from);
		envelope.refresh_token = object.get(KEY_REFRESH).and_then(credential_from);

		if envelope.is_empty() { None } else { Some(envelope) }
	}

	/// Returns `true` when no token of any kind was found.
	pub fn is_empty(&self) -> bool {
		self.partition_tokens.is_empty()
			&& self.partition_token.is_none()
			&& self.access_token.is_none()
			&& self.refresh_token.is_none()
	}
}

fn credential_from(value: &Value) -> Option<Credential> {
	Credential::deserialize(value).ok()
}
