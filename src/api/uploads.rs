// self
use crate::{
	_prelude::*,
	api::{ResourceClient, UPLOADS},
	cancel::CancelToken,
	coordinator::Target,
	http::ApiTransport,
};

impl<T> ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Fetches the manifests of every upload.
	pub async fn get_all_manifests(&self, cancel: &CancelToken) -> Result<Value> {
		self.call(UPLOADS, Target::get([UPLOADS, "manifests"]), cancel).await
	}

	/// Starts an upload described by `upload`.
	pub async fn create_upload(&self, upload: Value, cancel: &CancelToken) -> Result<Value> {
		self.call(UPLOADS, Target::post([UPLOADS]).with_body(upload), cancel).await
	}
}
