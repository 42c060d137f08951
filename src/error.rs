//! Relay-level error types shared across dispatch, backends, and stores.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
///
/// The taxonomy mirrors the four outcomes a caller can observe: no credentials held
/// ([`Error::Unauthenticated`]), a terminal HTTP status passed through unchanged
/// ([`Error::Status`]), a transport failure ([`Error::Transport`]), and local
/// configuration or storage problems. A 401 that was transparently refreshed and
/// replayed never surfaces here at all.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The backend answered 401 while no credentials were held; refresh was never
	/// attempted. Carries the triggering response so callers still see the original
	/// error payload.
	#[error("Request was rejected as unauthenticated (status {status}).")]
	Unauthenticated {
		/// HTTP status returned by the backend (always 401 in practice).
		status: u16,
		/// Response body, decoded lossily for diagnostics.
		body: String,
	},
	/// Terminal HTTP error status, passed through unchanged and never retried.
	///
	/// This is also the surface for an expired-and-unrefreshable 401: the *original*
	/// rejection propagates, not a wrapped refresh error.
	#[error("Backend rejected the request with status {status}.")]
	Status {
		/// HTTP status returned by the backend.
		status: u16,
		/// Response body, decoded lossily for diagnostics.
		body: String,
	},
}
impl Error {
	/// Returns the HTTP status attached to this error, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Unauthenticated { status, .. } | Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A header name or value was rejected by the transport.
	#[error("Header `{name}` cannot be encoded for transport.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// A caller-supplied endpoint string cannot be parsed as a URL.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request body failed to serialize as JSON.
	#[error("Request body could not be serialized as JSON.")]
	BodySerialization(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while dispatching the request.")]
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
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_relay_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unreachable".into() };
		let relay_error: Error = store_error.clone().into();

		assert!(matches!(relay_error, Error::Storage(_)));
		assert!(relay_error.to_string().contains("disk unreachable"));

		let source = StdError::source(&relay_error)
			.expect("Relay error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn status_accessor_distinguishes_http_errors() {
		let denied = Error::Status { status: 500, body: String::new() };
		let unauthenticated = Error::Unauthenticated { status: 401, body: String::new() };
		let transport: Error =
			TransportError::Io(std::io::Error::other("connection reset")).into();

		assert_eq!(denied.status(), Some(500));
		assert_eq!(unauthenticated.status(), Some(401));
		assert_eq!(transport.status(), None);
	}
}
