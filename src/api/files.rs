// self
use crate::{
	_prelude::*,
	api::{FILES, ResourceClient},
	cancel::CancelToken,
	coordinator::Target,
	http::ApiTransport,
};

impl<T> ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists every file.
	pub async fn list_files(&self, cancel: &CancelToken) -> Result<Value> {
		self.call(FILES, Target::get([FILES]), cancel).await
	}

	/// Fetches the metadata of file `id`.
	pub async fn get_file(&self, id: &str, cancel: &CancelToken) -> Result<Value> {
		self.call(FILES, Target::get([FILES, id]), cancel).await
	}

	/// Deletes file `id`.
	pub async fn delete_file(&self, id: &str, cancel: &CancelToken) -> Result<Value> {
		self.call(FILES, Target::delete([FILES, id]), cancel).await
	}
}
