//! Drives the resource client against a mock service: the session starts with only a refresh
//! credential, the first call redeems it for a bearer credential, and a later call runs on a
//! partition token issued by the service.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use session_token_broker::{
	api::{ResourceClient, UPLOADS},
	auth::Credential,
	cancel::CancelToken,
	coordinator::{CoordinatorBuilder, ReqwestCoordinator},
	http::ReqwestTransport,
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh")
				.header("authorization", "Bearer demo-refresh");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"accessToken": { "expiresAt": "2099-01-01T00:00:00Z", "value": "demo-access" },
				"csrfTokens": { "uploads": "upload-1" }
			}));
		})
		.await;
	let stream_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/streams/demo")
				.header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "demo", "periods": 3 }));
		})
		.await;
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let refresh = Credential::new("demo-refresh", OffsetDateTime::now_utc() + Duration::days(30));
	let coordinator: ReqwestCoordinator = CoordinatorBuilder::parse(&server.url("/api/"))?
		.refresh_credential(refresh)
		.session_hook(|| println!("The session expired; sign in again."))
		.build(transport)?;
	let client = ResourceClient::new(Arc::new(coordinator));
	let cancel = CancelToken::new();
	let stream = client.get_stream("demo", &cancel).await?;

	println!("Fetched stream: {stream}.");
	println!("Upload token ready: {}.", client.coordinator().has_partition_token(UPLOADS));

	refresh_mock.assert_async().await;
	stream_mock.assert_async().await;

	Ok(())
}
