#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use session_token_broker::{
	api::ResourceClient,
	auth::Credential,
	cancel::CancelToken,
	coordinator::{CoordinatorBuilder, ReqwestCoordinator},
	error::Error,
	http::ReqwestTransport,
	reqwest::Client,
};

// Accepts the self-signed certificate `httpmock` serves over https.
fn test_transport() -> ReqwestTransport {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestTransport::with_client(client)
}

fn client<F>(server: &MockServer, configure: F) -> ResourceClient<ReqwestTransport>
where
	F: FnOnce(CoordinatorBuilder) -> CoordinatorBuilder,
{
	let base =
		CoordinatorBuilder::parse(&server.url("/api/")).expect("Mock server URL should parse.");
	let coordinator: ReqwestCoordinator = configure(base)
		.build(test_transport())
		.expect("Coordinator should build against the mock server.");

	ResourceClient::new(Arc::new(coordinator))
}

fn credential(value: &str) -> Credential {
	Credential::new(value, OffsetDateTime::now_utc() + Duration::hours(1))
}

#[tokio::test]
async fn partition_token_travels_as_query_parameter() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/files").query_param("csrf_token", "f-1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "files": ["a.txt"], "csrf_token": "f-2" }));
		})
		.await;
	let client = client(&server, |builder| builder.partition_token("files", "f-1"));
	let body = client.list_files(&CancelToken::new()).await.expect("Listing should succeed.");

	mock.assert_async().await;

	assert_eq!(body, json!({ "files": ["a.txt"], "csrf_token": "f-2" }));
	assert_eq!(
		client.coordinator().token_collection().get("files").map(|token| token.expose()),
		Some("f-2")
	);
}

#[tokio::test]
async fn bearer_credential_and_json_body_reach_the_server() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/keys")
				.header("authorization", "Bearer access-1")
				.header("content-type", "application/json")
				.json_body(json!({ "name": "deploy" }));
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "k-1" }));
		})
		.await;
	let client = client(&server, |builder| builder.access_credential(credential("access-1")));
	let body = client
		.create_key(json!({ "name": "deploy" }), &CancelToken::new())
		.await
		.expect("Key creation should succeed.");

	mock.assert_async().await;

	assert_eq!(body, json!({ "id": "k-1" }));
}

#[tokio::test]
async fn refresh_endpoint_issues_the_bearer_credential() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh").header("authorization", "Bearer refresh-1");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"accessToken": { "expiresAt": "2099-01-01T00:00:00Z", "value": "access-9" }
			}));
		})
		.await;
	let stream = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/streams/demo").header("authorization", "Bearer access-9");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "demo" }));
		})
		.await;
	let client = client(&server, |builder| builder.refresh_credential(credential("refresh-1")));
	let body =
		client.get_stream("demo", &CancelToken::new()).await.expect("Stream fetch should succeed.");

	refresh.assert_calls_async(1).await;
	stream.assert_calls_async(1).await;

	assert_eq!(body, json!({ "id": "demo" }));
}

#[tokio::test]
async fn server_errors_surface_as_http_status() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/files/missing");
			then.status(404);
		})
		.await;
	let client = client(&server, |builder| builder.access_credential(credential("access-1")));
	let err = client
		.delete_file("missing", &CancelToken::new())
		.await
		.expect_err("Missing file should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::HttpStatus { status: 404 }));
}
