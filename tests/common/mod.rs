//! Scripted in-process transport and fixtures shared by the integration tests.

#![allow(dead_code, unused_imports)]

// std
pub use std::{
	io,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

// crates.io
pub use parking_lot::Mutex;
pub use serde_json::{Value, json};
pub use time::{Duration, OffsetDateTime};
pub use tokio::sync::Notify;
// self
pub use session_token_broker::{
	api::ResourceClient,
	auth::{Credential, PartitionName},
	cancel::CancelToken,
	coordinator::{Coordinator, CoordinatorBuilder, OperationOptions, Target},
	error::{Error, TransportError},
	http::{ApiRequest, ApiResponse, ApiTransport, Method, TransportFuture},
};

/// How the scripted transport answers one request.
pub enum Reply {
	/// Resolve immediately.
	Respond(ApiResponse),
	/// Resolve once the notifier fires.
	After(Arc<Notify>, ApiResponse),
	/// Fail with a transport error.
	Fail,
	/// Never resolve.
	Hang,
}
impl Reply {
	pub fn json(status: u16, body: Value) -> Self {
		Self::Respond(ApiResponse::json_body(status, &body))
	}
}

type Handler = dyn Fn(&ApiRequest) -> Reply + Send + Sync;

/// Transport that records every request and answers through a handler.
#[derive(Clone)]
pub struct ScriptedTransport {
	handler: Arc<Handler>,
	calls: Arc<Mutex<Vec<ApiRequest>>>,
}
impl ScriptedTransport {
	pub fn new<F>(handler: F) -> Self
	where
		F: 'static + Fn(&ApiRequest) -> Reply + Send + Sync,
	{
		Self { handler: Arc::new(handler), calls: Default::default() }
	}

	pub fn calls(&self) -> Vec<ApiRequest> {
		self.calls.lock().clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().len()
	}

	pub async fn until_calls(&self, count: usize) {
		while self.call_count() < count {
			tokio::task::yield_now().await;
		}
	}
}
impl ApiTransport for ScriptedTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let reply = (self.handler)(&request);

		self.calls.lock().push(request);

		Box::pin(async move {
			match reply {
				Reply::Respond(response) => Ok(response),
				Reply::After(notify, response) => {
					notify.notified().await;

					Ok(response)
				},
				Reply::Fail => Err(TransportError::from(io::Error::other("connection reset"))),
				Reply::Hang => std::future::pending().await,
			}
		})
	}
}

pub fn builder() -> CoordinatorBuilder {
	CoordinatorBuilder::parse("https://api.example.com/").expect("Fixture base URL should parse.")
}

pub fn credential(value: &str) -> Credential {
	Credential::new(value, OffsetDateTime::now_utc() + Duration::hours(1))
}

pub fn expired_credential(value: &str) -> Credential {
	Credential::new(value, OffsetDateTime::now_utc() - Duration::minutes(1))
}

pub fn access_body(value: &str) -> Value {
	json!({ "accessToken": { "expiresAt": "2099-01-01T00:00:00Z", "value": value } })
}

pub fn partition(name: &str) -> PartitionName {
	PartitionName::new(name).expect("Partition fixture should be valid.")
}

pub fn client(
	builder: CoordinatorBuilder,
	transport: &ScriptedTransport,
) -> ResourceClient<ScriptedTransport> {
	let coordinator =
		builder.build(transport.clone()).expect("Coordinator fixture should build.");

	ResourceClient::new(Arc::new(coordinator))
}
