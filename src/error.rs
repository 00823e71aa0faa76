//! Coordinator-level error types shared across the queue, transport, and request flows.

// self
use crate::{_prelude::*, auth::PartitionName, cancel::CancelReason};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, IO), passed through from the transport.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the requested shape.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the JSON path of the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the response that failed to decode.
		status: u16,
	},

	/// The caller cancelled the operation.
	#[error("Operation was cancelled: {reason}.")]
	Cancelled {
		/// Caller-supplied cancellation reason.
		reason: CancelReason,
	},
	/// Credential refresh ran but did not produce a new bearer credential.
	#[error("Credential refresh did not produce a new bearer credential.")]
	RefreshFailed,
	/// A refresh was attempted without any credential to base it on.
	#[error("No credential is available to authorize or refresh this request.")]
	MissingCredential,
	/// No partition token is stored and none can arrive.
	#[error("No token for partition `{partition}` is available or in flight.")]
	PartitionTokenUnavailable {
		/// Partition whose token could not be obtained.
		partition: PartitionName,
	},
	/// The remote service rejected the request under strict semantics.
	#[error("Request failed with HTTP status {status}.")]
	HttpStatus {
		/// Numeric HTTP status code.
		status: u16,
	},
}
impl Error {
	/// Returns `true` when the error stems from caller cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled { .. })
	}
}

/// Configuration and validation failures raised while building a coordinator.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base URL cannot carry path segments (e.g. `mailto:` or `data:` URLs).
	#[error("Base URL `{url}` cannot be used as a base for resource paths.")]
	InvalidBaseUrl {
		/// Rejected URL.
		url: String,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Rejected scheme.
		scheme: String,
	},
	/// Base URL string failed to parse.
	#[error("Base URL is not a valid URL.")]
	UnparsableBaseUrl(#[from] url::ParseError),
	/// A partition name failed validation.
	#[error(transparent)]
	InvalidPartition(#[from] crate::auth::PartitionNameError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the resource service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the resource service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_error_keeps_source() {
		let io = std::io::Error::other("connection reset");
		let err: Error = TransportError::from(io).into();

		assert!(matches!(err, Error::Transport(TransportError::Io(_))));

		let source =
			StdError::source(&err).expect("Transport errors should expose their IO source.");

		assert_eq!(source.to_string(), "connection reset");
	}

	#[test]
	fn cancelled_error_carries_reason() {
		let err = Error::Cancelled { reason: CancelReason::new("dialog closed") };

		assert!(err.is_cancelled());
		assert_eq!(err.to_string(), "Operation was cancelled: dialog closed.");
		assert!(!Error::RefreshFailed.is_cancelled());
	}
}
