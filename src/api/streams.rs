// self
use crate::{
	_prelude::*,
	api::{ResourceClient, STREAMS},
	cancel::CancelToken,
	coordinator::Target,
	http::ApiTransport,
};

impl<T> ResourceClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists every stream.
	pub async fn list_streams(&self, cancel: &CancelToken) -> Result<Value> {
		self.call(STREAMS, Target::get([STREAMS]), cancel).await
	}

	/// Fetches one stream.
	pub async fn get_stream(&self, id: &str, cancel: &CancelToken) -> Result<Value> {
		self.call(STREAMS, Target::get([STREAMS, id]), cancel).await
	}

	/// Fetches the multi-period view of one stream.
	pub async fn get_multi_period_stream(&self, id: &str, cancel: &CancelToken) -> Result<Value> {
		self.call(STREAMS, Target::get([STREAMS, id, "multi-period"]), cancel).await
	}

	/// Creates a stream from `stream`.
	pub async fn create_stream(&self, stream: Value, cancel: &CancelToken) -> Result<Value> {
		self.call(STREAMS, Target::post([STREAMS]).with_body(stream), cancel).await
	}

	/// Replaces the stream `id` with `stream`.
	pub async fn update_stream(
		&self,
		id: &str,
		stream: Value,
		cancel: &CancelToken,
	) -> Result<Value> {
		self.call(STREAMS, Target::put([STREAMS, id]).with_body(stream), cancel).await
	}

	/// Deletes the stream `id`.
	pub async fn delete_stream(&self, id: &str, cancel: &CancelToken) -> Result<Value> {
		self.call(STREAMS, Target::delete([STREAMS, id]), cancel).await
	}
}
