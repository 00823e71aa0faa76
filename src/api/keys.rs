// self
use crate::{
	_prelude::*,
	api::{KEYS, ResourceClient},
	cancel::CancelToken,
	coordinator::Target,
	http::ApiTransport,
};

impl<T> ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists every key.
	pub async fn list_keys(&self, cancel: &CancelToken) -> Result<Value> {
		self.call(KEYS, Target::get([KEYS]), cancel).await
	}

	/// Creates a key from `key`.
	pub async fn create_key(&self, key: Value, cancel: &CancelToken) -> Result<Value> {
		self.call(KEYS, Target::post([KEYS]).with_body(key), cancel).await
	}

	/// Deletes key `id`.
	pub async fn delete_key(&self, id: &str, cancel: &CancelToken) -> Result<Value> {
		self.call(KEYS, Target::delete([KEYS, id]), cancel).await
	}
}
