// self
use crate::{
	_prelude::*,
	auth::{Credential, PartitionName, PartitionToken, TokenCollection},
	coordinator::{Coordinator, Endpoints, Session, SessionHook},
	error::ConfigError,
	http::ApiTransport,
	queue::TokenWaiterQueue,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const DEFAULT_REFRESH_CREDENTIAL_PATH: &str = "auth/refresh";
const DEFAULT_REFRESH_PARTITION_TOKENS_PATH: &str = "auth/csrf-tokens";

/// Non-secret coordinator settings that a host can load from its own configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorSettings {
	/// Base URL every resource path is resolved against.
	pub base_url: Url,
	/// Bearer credential refresh endpoint, relative to `base_url`.
	#[serde(default = "default_refresh_credential_path")]
	pub refresh_credential_path: String,
	/// Partition token refresh endpoint, relative to `base_url`.
	#[serde(default = "default_refresh_partition_tokens_path")]
	pub refresh_partition_tokens_path: String,
	/// Seconds before expiry at which a bearer credential is treated as absent.
	#[serde(default)]
	pub expiry_leeway_secs: u32,
	/// Serialize credential refreshes and skip redundant ones.
	#[serde(default)]
	pub single_flight: bool,
}
impl CoordinatorSettings {
	/// Default settings for `base_url`.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_credential_path: default_refresh_credential_path(),
			refresh_partition_tokens_path: default_refresh_partition_tokens_path(),
			expiry_leeway_secs: 0,
			single_flight: false,
		}
	}
}

/// Builder for [`Coordinator`] values.
pub struct CoordinatorBuilder {
	base_url: Url,
	access: Option<Credential>,
	refresh: Option<Credential>,
	partition_tokens: Vec<(String, PartitionToken)>,
	refresh_credential_path: String,
	refresh_partition_tokens_path: String,
	expiry_leeway: Duration,
	single_flight: bool,
	session_hook: Option<Arc<dyn SessionHook>>,
}
impl CoordinatorBuilder {
	/// Creates a builder rooted at `base_url` with default settings.
	pub fn new(base_url: Url) -> Self {
		Self::from_settings(CoordinatorSettings::new(base_url))
	}

	/// Parses `base_url` and creates a builder rooted at it.
	pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
		Ok(Self::new(Url::parse(base_url)?))
	}

	/// Creates a builder from loaded settings.
	pub fn from_settings(settings: CoordinatorSettings) -> Self {
		Self {
			base_url: settings.base_url,
			access: None,
			refresh: None,
			partition_tokens: Vec::new(),
			refresh_credential_path: settings.refresh_credential_path,
			refresh_partition_tokens_path: settings.refresh_partition_tokens_path,
			expiry_leeway: Duration::seconds(i64::from(settings.expiry_leeway_secs)),
			single_flight: settings.single_flight,
			session_hook: None,
		}
	}

	/// Seeds the bearer credential.
	pub fn access_credential(mut self, credential: Credential) -> Self {
		self.access = Some(credential);

		self
	}

	/// Seeds the refresh credential.
	pub fn refresh_credential(mut self, credential: Credential) -> Self {
		self.refresh = Some(credential);

		self
	}

	/// Seeds one partition token; the name is validated by [`build`](Self::build).
	pub fn partition_token(
		mut self,
		partition: impl Into<String>,
		token: impl Into<PartitionToken>,
	) -> Self {
		self.partition_tokens.push((partition.into(), token.into()));

		self
	}

	/// Seeds every token of `tokens`.
	pub fn partition_tokens(mut self, tokens: TokenCollection) -> Self {
		self.partition_tokens.extend(tokens.into_iter().map(|(name, token)| (name.into(), token)));

		self
	}

	/// Overrides the bearer credential refresh path (defaults to `auth/refresh`).
	pub fn refresh_credential_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_credential_path = path.into();

		self
	}

	/// Overrides the partition token refresh path (defaults to `auth/csrf-tokens`).
	pub fn refresh_partition_tokens_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_partition_tokens_path = path.into();

		self
	}

	/// Treats a bearer credential as absent `leeway` before it expires (defaults to zero).
	pub fn expiry_leeway(mut self, leeway: Duration) -> Self {
		self.expiry_leeway = if leeway.is_negative() { Duration::ZERO } else { leeway };

		self
	}

	/// Serializes credential refreshes so concurrent callers share one result.
	pub fn single_flight(mut self, enabled: bool) -> Self {
		self.single_flight = enabled;

		self
	}

	/// Installs the hook notified when the refresh credential is rejected.
	pub fn session_hook<H>(mut self, hook: H) -> Self
	where
		H: 'static + SessionHook,
	{
		self.session_hook = Some(Arc::new(hook));

		self
	}

	/// Validates the configuration and builds a coordinator that owns `transport`.
	pub fn build<T>(self, transport: T) -> Result<Coordinator<T>, ConfigError>
	where
		T: ApiTransport,
	{
		self.build_shared(Arc::new(transport))
	}

	/// Validates the configuration and builds a coordinator around a shared transport.
	pub fn build_shared<T>(self, transport: Arc<T>) -> Result<Coordinator<T>, ConfigError>
	where
		T: ?Sized + ApiTransport,
	{
		validate_base_url(&self.base_url)?;

		let mut partitions = HashMap::new();

		for (name, token) in self.partition_tokens {
			let name = PartitionName::new(name)?;

			partitions.insert(name.clone(), Arc::new(TokenWaiterQueue::with_token(name, token)));
		}

		Ok(Coordinator {
			transport,
			endpoints: Endpoints {
				base: self.base_url,
				refresh_credential: segments(&self.refresh_credential_path),
				refresh_partition_tokens: segments(&self.refresh_partition_tokens_path),
			},
			session: Mutex::new(Session { access: self.access, refresh: self.refresh }),
			partitions: Mutex::new(partitions),
			hook: self.session_hook,
			refresh_guard: AsyncMutex::new(()),
			single_flight: self.single_flight,
			expiry_leeway: self.expiry_leeway,
			metrics: Default::default(),
		})
	}

	/// Builds a coordinator backed by a default [`ReqwestTransport`].
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest(self) -> Result<Coordinator<ReqwestTransport>, ConfigError> {
		self.build(ReqwestTransport::default())
	}
}
impl Debug for CoordinatorBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CoordinatorBuilder")
			.field("base_url", &self.base_url.as_str())
			.field("access", &self.access)
			.field("refresh", &self.refresh)
			.field("partition_tokens", &self.partition_tokens.len())
			.field("refresh_credential_path", &self.refresh_credential_path)
			.field("refresh_partition_tokens_path", &self.refresh_partition_tokens_path)
			.field("expiry_leeway", &self.expiry_leeway)
			.field("single_flight", &self.single_flight)
			.field("session_hook_set", &self.session_hook.is_some())
			.finish()
	}
}

fn default_refresh_credential_path() -> String {
	DEFAULT_REFRESH_CREDENTIAL_PATH.into()
}

fn default_refresh_partition_tokens_path() -> String {
	DEFAULT_REFRESH_PARTITION_TOKENS_PATH.into()
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { scheme: url.scheme().into() });
	}
	if url.cannot_be_a_base() {
		return Err(ConfigError::InvalidBaseUrl { url: url.to_string() });
	}

	Ok(())
}

fn segments(path: &str) -> Vec<String> {
	path.split('/').filter(|segment| !segment.is_empty()).map(Into::into).collect()
}
