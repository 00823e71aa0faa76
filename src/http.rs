//! Transport primitives for calls against the resource service.
//!
//! The coordinator never talks to the network directly. It assembles an [`ApiRequest`]
//! (method, URL, headers, optional JSON body, cancellation token) and hands it to an
//! [`ApiTransport`], which returns the raw status and body as an [`ApiResponse`].
//! [`ReqwestTransport`] is the default implementation; tests and hosts with their own HTTP
//! stack implement the trait directly.

// self
use crate::{_prelude::*, cancel::CancelToken, error::TransportError};

/// Header carrying bearer and refresh credentials.
pub const AUTHORIZATION: &str = "Authorization";
/// Query parameter carrying a partition token.
pub const PARTITION_TOKEN_PARAM: &str = "csrf_token";

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Network-invocation capability injected into the coordinator.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// coordinator in the process. The returned future may be dropped before it resolves when
/// the request's [`CancelToken`] fires; implementations that hold remote resources should
/// release them on drop or observe [`ApiRequest::cancel`] themselves.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs one HTTP exchange.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}
impl<T> ApiTransport for Arc<T>
where
	T: ?Sized + ApiTransport,
{
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		(**self).send(request)
	}
}

/// HTTP methods used by resource operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully assembled outbound request.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including query parameters.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: BTreeMap<String, String>,
	/// JSON body, if any.
	pub body: Option<Value>,
	/// Cancellation token of the owning operation.
	pub cancel: CancelToken,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url, cancel: CancelToken) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None, cancel }
	}

	/// Returns the header value for `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Returns the first query parameter named `name`.
	pub fn query_param(&self, name: &str) -> Option<String> {
		self.url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
	}

	/// Returns the bearer value of the `Authorization` header, if present.
	pub fn bearer(&self) -> Option<&str> {
		self.header(AUTHORIZATION).and_then(|value| value.strip_prefix("Bearer "))
	}
}

/// Raw response descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from a status code and raw body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Creates a response whose body is the serialized `value`.
	pub fn json_body(status: u16, value: &Value) -> Self {
		Self::new(status, value.to_string())
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Decodes the body, reporting the JSON path of the first mismatch.
	///
	/// An empty body decodes as JSON `null`, which lets `()`/`Option<T>` targets accept
	/// `204 No Content` responses.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source, status: self.status })
	}
}
impl Debug for ApiResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiResponse")
			.field("status", &self.status)
			.field("body_len", &self.body.len())
			.finish()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that identifies itself with `user_agent`.
	pub fn with_user_agent(user_agent: &str) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().user_agent(user_agent).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
				.map_err(TransportError::network)?;
			let mut builder = client.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = &request.body {
				builder = builder
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(body.to_string());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for crate::error::ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn json_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Listing {
			#[allow(dead_code)]
			items: Vec<u32>,
		}

		let response = ApiResponse::new(200, r#"{ "items": [1, "two"] }"#);
		let err = response.json::<Listing>().expect_err("Mismatched item should fail.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "items[1]");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn empty_body_decodes_as_null() {
		let response = ApiResponse::new(204, Vec::new());

		response.json::<()>().expect("Empty body should decode into unit.");
		assert!(response.is_success());
	}

	#[test]
	fn request_helpers_read_headers_and_query() {
		let url = Url::parse("https://api.example.com/streams?csrf_token=abc&x=1")
			.expect("Fixture URL should parse.");
		let mut request = ApiRequest::new(Method::Get, url, CancelToken::new());

		request.headers.insert(AUTHORIZATION.into(), "Bearer access-1".into());

		assert_eq!(request.header("authorization"), Some("Bearer access-1"));
		assert_eq!(request.bearer(), Some("access-1"));
		assert_eq!(request.query_param(PARTITION_TOKEN_PARAM).as_deref(), Some("abc"));
		assert!(request.query_param("missing").is_none());
	}
}
