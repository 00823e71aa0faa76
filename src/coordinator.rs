//! Per-session request coordination.
//!
//! A [`Coordinator`] owns one session's bearer credential, refresh credential, and one
//! [`TokenWaiterQueue`] per partition. Every outbound operation goes through
//! [`Coordinator::perform`], which:
//!
//! 1. refreshes the bearer credential first when it is missing (or expired) but a refresh
//!    credential exists;
//! 2. authorizes with the bearer credential when one is usable, otherwise leases a
//!    single-use partition token from the target partition's queue, refreshing the queue
//!    when it is empty;
//! 3. sends the request through the injected [`ApiTransport`], racing it against the
//!    operation's [`CancelToken`];
//! 4. harvests fresh tokens from the response body into the session and the queues;
//! 5. on a `401` after bearer use, refreshes the bearer credential once and retries once,
//!    failing with [`Error::RefreshFailed`] when the refresh did not change it.

mod builder;

mod metrics;
mod refresh;

pub use builder::*;
pub use metrics::CoordinatorMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, PartitionName, PartitionToken, Secret, TokenCollection, TokenEnvelope},
	cancel::CancelToken,
	error::ConfigError,
	http::{self, ApiRequest, ApiResponse, ApiTransport, Method},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	queue::{TokenLease, TokenWaiterQueue},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Coordinator specialized for the crate's default reqwest transport.
pub type ReqwestCoordinator = Coordinator<ReqwestTransport>;

/// Host-application hook for session-level side effects.
///
/// Closures of the form `Fn() + Send + Sync` implement the trait directly.
pub trait SessionHook: Send + Sync {
	/// Called once when the service rejects the refresh credential; the host should send
	/// the user to its login entry point.
	fn login_required(&self);
}
impl<F> SessionHook for F
where
	F: Fn() + Send + Sync,
{
	fn login_required(&self) {
		self()
	}
}

/// Remote operation addressed relative to the coordinator's base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
	/// HTTP method.
	pub method: Method,
	/// Path segments appended to the base URL.
	pub path: Vec<String>,
	/// Partition whose token authorizes the call when no bearer credential is usable.
	pub partition: Option<PartitionName>,
	/// Additional query parameters.
	pub query: Vec<(String, String)>,
	/// JSON request body.
	pub body: Option<Value>,
}
impl Target {
	/// Creates a target for `method` at the given path segments.
	pub fn new<I, S>(method: Method, path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			method,
			path: path.into_iter().map(Into::into).collect(),
			partition: None,
			query: Vec::new(),
			body: None,
		}
	}

	/// `GET` target.
	pub fn get<I, S>(path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Get, path)
	}

	/// `POST` target.
	pub fn post<I, S>(path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Post, path)
	}

	/// `PUT` target.
	pub fn put<I, S>(path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Put, path)
	}

	/// `DELETE` target.
	pub fn delete<I, S>(path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Delete, path)
	}

	/// Scopes the target to `partition`.
	pub fn in_partition(mut self, partition: PartitionName) -> Self {
		self.partition = Some(partition);

		self
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Attaches a JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}
}

/// Per-call options.
#[derive(Clone, Debug)]
pub struct OperationOptions {
	/// Cancellation token observed for the whole operation, including refreshes it triggers.
	pub cancel: CancelToken,
	/// Fail with [`Error::HttpStatus`] on non-2xx responses (defaults to `true`).
	pub strict: bool,
}
impl OperationOptions {
	/// Strict options bound to `cancel`.
	pub fn new(cancel: CancelToken) -> Self {
		Self { cancel, strict: true }
	}

	/// Returns failed responses to the caller instead of raising [`Error::HttpStatus`].
	pub fn lenient(mut self) -> Self {
		self.strict = false;

		self
	}
}
impl Default for OperationOptions {
	fn default() -> Self {
		Self::new(CancelToken::new())
	}
}

#[derive(Clone, Debug)]
struct Endpoints {
	base: Url,
	refresh_credential: Vec<String>,
	refresh_partition_tokens: Vec<String>,
}
impl Endpoints {
	fn resolve(&self, path: &[String], query: &[(String, String)]) -> Result<Url> {
		let mut url = self.base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidBaseUrl { url: self.base.to_string() })?
			.pop_if_empty()
			.extend(path);

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}
}

#[derive(Default)]
struct Session {
	access: Option<Credential>,
	refresh: Option<Credential>,
}

/// How a single transport call is authorized.
enum Authorization {
	/// Caller-supplied value; used by the credential refresh.
	Explicit(Secret),
	Bearer(Credential),
	Partition(TokenLease),
}

/// Coordinates authorization, refresh, and retry for one authenticated session.
///
/// Coordinators never share state; build one per session and share it behind an [`Arc`].
pub struct Coordinator<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	endpoints: Endpoints,
	session: Mutex<Session>,
	partitions: Mutex<HashMap<PartitionName, Arc<TokenWaiterQueue>>>,
	hook: Option<Arc<dyn SessionHook>>,
	refresh_guard: AsyncMutex<()>,
	single_flight: bool,
	expiry_leeway: Duration,
	metrics: Arc<CoordinatorMetrics>,
}
impl<T> Coordinator<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound call.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Base URL all targets are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.endpoints.base
	}

	/// Activity counters for this coordinator.
	pub fn metrics(&self) -> &CoordinatorMetrics {
		&self.metrics
	}

	/// Current bearer credential, including an expired one.
	pub fn access_credential(&self) -> Option<Credential> {
		self.session.lock().access.clone()
	}

	/// Current refresh credential.
	pub fn refresh_credential(&self) -> Option<Credential> {
		self.session.lock().refresh.clone()
	}

	/// Returns `true` when `partition` has a token ready for immediate use.
	pub fn has_partition_token(&self, partition: &str) -> bool {
		self.partitions.lock().get(partition).is_some_and(|queue| queue.has_token())
	}

	/// Snapshot of the tokens currently stored per partition.
	pub fn token_collection(&self) -> TokenCollection {
		self.partitions
			.lock()
			.iter()
			.filter_map(|(name, queue)| queue.peek().map(|token| (name.clone(), token)))
			.collect()
	}

	/// Delivers `token` to the oldest waiter of `partition`, or stores it.
	pub fn set_partition_token(
		&self,
		partition: &str,
		token: impl Into<PartitionToken>,
	) -> Result<()> {
		let partition = PartitionName::new(partition).map_err(ConfigError::from)?;

		self.queue(&partition).set_token(token);

		Ok(())
	}

	/// Forgets both credentials and every stored partition token.
	///
	/// Waiters stay parked; tokens already handed out are unaffected.
	pub fn clear_session(&self) {
		*self.session.lock() = Session::default();

		for queue in self.partitions.lock().values() {
			queue.clear();
		}
	}

	/// Number of callers parked on `partition`'s queue.
	pub fn waiting(&self, partition: &str) -> usize {
		self.partitions.lock().get(partition).map_or(0, |queue| queue.waiting())
	}

	/// Number of `partition` tokens held by in-flight operations.
	pub fn outstanding(&self, partition: &str) -> usize {
		self.partitions.lock().get(partition).map_or(0, |queue| queue.outstanding())
	}

	/// Returns the queue for `partition`, creating it on first use.
	pub(crate) fn queue(&self, partition: &PartitionName) -> Arc<TokenWaiterQueue> {
		self.partitions
			.lock()
			.entry(partition.clone())
			.or_insert_with(|| Arc::new(TokenWaiterQueue::new(partition.clone())))
			.clone()
	}

	/// Performs `target`, returning the final response.
	///
	/// Non-2xx responses become [`Error::HttpStatus`] unless `options` is lenient. A `401`
	/// after bearer use is retried once with a refreshed credential.
	pub async fn perform(&self, target: Target, options: &OperationOptions) -> Result<ApiResponse> {
		const KIND: OperationKind = OperationKind::Resource;

		let span = OperationSpan::new(KIND, "perform");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span.instrument(self.run(target, options)).await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	/// Performs `target` and decodes the response body.
	pub async fn perform_json<R>(&self, target: Target, options: &OperationOptions) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.perform(target, options).await?.json()
	}

	async fn run(&self, target: Target, options: &OperationOptions) -> Result<ApiResponse> {
		let cancel = &options.cancel;

		cancel.check()?;

		if self.usable_access().is_none() && self.has_refresh_credential() {
			self.refresh_access(None, cancel).await.or_else(refresh_credential_vanished)?;
		}

		let mut authorization = match self.usable_access() {
			Some(access) => Authorization::Bearer(access),
			None => {
				let partition = target.partition.as_ref().ok_or(Error::MissingCredential)?;

				Authorization::Partition(self.lease(partition, cancel).await?)
			},
		};
		let mut response = self.execute(&target, &mut authorization, cancel).await?;
		let rejected_bearer = match &authorization {
			Authorization::Bearer(used)
				if response.is_unauthorized() && self.has_refresh_credential() =>
				Some(used.clone()),
			_ => None,
		};

		if let Some(used) = rejected_bearer {
			self.metrics.record_retry();
			obs::event!(debug, "Bearer credential was rejected; refreshing before one retry.");
			self.refresh_access(Some(&used), cancel).await.or_else(refresh_credential_vanished)?;

			let refreshed = self
				.access_credential()
				.filter(|current| !current.same_value(&used))
				.ok_or(Error::RefreshFailed)?;

			authorization = Authorization::Bearer(refreshed);
			response = self.execute(&target, &mut authorization, cancel).await?;
		}
		if options.strict && !response.is_success() {
			return Err(Error::HttpStatus { status: response.status });
		}

		Ok(response)
	}

	async fn lease(&self, partition: &PartitionName, cancel: &CancelToken) -> Result<TokenLease> {
		let refresh = move || self.refresh_partition(partition, cancel);

		self.queue(partition).take(cancel, Some(refresh)).await
	}

	/// One transport call: attach authorization, send, harvest tokens.
	async fn execute(
		&self,
		target: &Target,
		authorization: &mut Authorization,
		cancel: &CancelToken,
	) -> Result<ApiResponse> {
		cancel.check()?;

		let mut url = self.endpoints.resolve(&target.path, &target.query)?;
		let mut headers = BTreeMap::new();

		match authorization {
			Authorization::Explicit(secret) => {
				headers.insert(http::AUTHORIZATION.to_owned(), bearer(secret));
			},
			Authorization::Bearer(credential) => {
				headers.insert(http::AUTHORIZATION.to_owned(), bearer(&credential.value));
			},
			Authorization::Partition(lease) => {
				let token = lease.spend().ok_or_else(|| Error::PartitionTokenUnavailable {
					partition: lease.partition().clone(),
				})?;

				url.query_pairs_mut().append_pair(http::PARTITION_TOKEN_PARAM, token.expose());
			},
		}

		let request = ApiRequest {
			method: target.method,
			url,
			headers,
			body: target.body.clone(),
			cancel: cancel.clone(),
		};

		self.metrics.record_transport_call();

		let response = tokio::select! {
			biased;
			response = self.transport.send(request) => response?,
			reason = cancel.cancelled() => return Err(Error::Cancelled { reason }),
		};

		self.harvest(target, &response);
		cancel.check()?;

		Ok(response)
	}

	fn harvest(&self, target: &Target, response: &ApiResponse) {
		if let Some(envelope) = TokenEnvelope::from_body(&response.body) {
			self.absorb(envelope, target.partition.as_ref());
		}
	}

	fn absorb(&self, envelope: TokenEnvelope, partition: Option<&PartitionName>) {
		let TokenEnvelope { partition_tokens, partition_token, access_token, refresh_token } =
			envelope;

		if access_token.is_some() || refresh_token.is_some() {
			let mut session = self.session.lock();

			if let Some(access) = access_token {
				session.access = Some(access);
			}
			if let Some(refresh) = refresh_token {
				session.refresh = Some(refresh);
			}
		}
		for (name, token) in partition_tokens {
			self.queue(&name).set_token(token);
		}

		match (partition_token, partition) {
			(Some(token), Some(partition)) => self.queue(partition).set_token(token),
			(Some(_), None) => {
				obs::event!(debug, "Dropping a partition token returned outside any partition.");
			},
			(None, _) => {},
		}
	}

	fn usable_access(&self) -> Option<Credential> {
		let now = OffsetDateTime::now_utc();

		self.session
			.lock()
			.access
			.as_ref()
			.filter(|access| !access.is_expired_at(now, self.expiry_leeway))
			.cloned()
	}

	fn has_refresh_credential(&self) -> bool {
		self.session.lock().refresh.is_some()
	}
}
impl<T> Debug for Coordinator<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let session = self.session.lock();

		f.debug_struct("Coordinator")
			.field("base_url", &self.endpoints.base.as_str())
			.field("access_set", &session.access.is_some())
			.field("refresh_set", &session.refresh.is_some())
			.field("partitions", &self.partitions.lock().len())
			.field("single_flight", &self.single_flight)
			.finish()
	}
}

// A concurrent rejection may clear the refresh credential between the check and the refresh.
fn refresh_credential_vanished(e: Error) -> Result<()> {
	match e {
		Error::MissingCredential => Ok(()),
		e => Err(e),
	}
}

fn bearer(secret: &Secret) -> String {
	format!("Bearer {}", secret.expose())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoints(base: &str) -> Endpoints {
		Endpoints {
			base: Url::parse(base).expect("Fixture base URL should parse."),
			refresh_credential: vec!["auth".into(), "refresh".into()],
			refresh_partition_tokens: vec!["auth".into(), "csrf-tokens".into()],
		}
	}

	#[test]
	fn resolve_appends_segments_and_query() {
		let url = endpoints("https://api.example.com/v1/")
			.resolve(&["streams".into(), "a b".into()], &[("page".into(), "2".into())])
			.expect("Resolution should succeed.");

		assert_eq!(url.as_str(), "https://api.example.com/v1/streams/a%20b?page=2");

		let url = endpoints("https://api.example.com")
			.resolve(&["files".into()], &[])
			.expect("Resolution should succeed.");

		assert_eq!(url.as_str(), "https://api.example.com/files");
	}

	#[test]
	fn target_helpers_compose() {
		let partition = PartitionName::new("keys").expect("Partition fixture should be valid.");
		let target = Target::post(["keys"])
			.in_partition(partition.clone())
			.with_query("dry_run", "true")
			.with_body(serde_json::json!({ "name": "k" }));

		assert_eq!(target.method, Method::Post);
		assert_eq!(target.path, ["keys"]);
		assert_eq!(target.partition, Some(partition));
		assert_eq!(target.query, [("dry_run".to_owned(), "true".to_owned())]);
		assert!(target.body.is_some());
	}

	#[test]
	fn closures_are_session_hooks() {
		let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
		let hook: Arc<dyn SessionHook> = {
			let calls = calls.clone();

			Arc::new(move || {
				calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
			})
		};

		hook.login_required();

		assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
	}
}
