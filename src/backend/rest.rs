//! Reqwest-backed [`RefreshBackend`] speaking the `POST /auth/refresh` contract.

// self
use crate::{
	_prelude::*,
	auth::{RotatedTokens, TokenSecret},
	backend::{BackendError, RefreshBackend, RefreshFuture},
	error::ConfigError,
	http::{HttpTransport, ReqwestTransport, RequestSpec},
};

/// Exchanges refresh tokens against an application-supplied REST endpoint.
///
/// The endpoint receives `{"refresh_token": "<current>"}` and answers with a JSON
/// object carrying the replacement secrets. Both field naming conventions seen in the
/// wild (`access_token` and `accessToken`) are accepted; extra fields such as a `user`
/// object are ignored. A non-2xx answer is a definitive denial, not an error.
pub struct RestRefreshBackend {
	endpoint: Url,
	transport: ReqwestTransport,
}
impl RestRefreshBackend {
	/// Creates a backend for the provided refresh endpoint over a default transport.
	pub fn new(endpoint: Url) -> Self {
		Self::with_transport(endpoint, ReqwestTransport::default())
	}

	/// Creates a backend that reuses the caller-provided transport.
	pub fn with_transport(endpoint: Url, transport: ReqwestTransport) -> Self {
		Self { endpoint, transport }
	}

	/// Parses a caller-supplied endpoint string.
	pub fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
		Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint { source })
	}
}
impl Debug for RestRefreshBackend {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RestRefreshBackend").field("endpoint", &self.endpoint.as_str()).finish()
	}
}
impl RefreshBackend for RestRefreshBackend {
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a> {
		Box::pin(async move {
			let payload = RefreshRequest { refresh_token: refresh_token.expose() };
			let request = RequestSpec::post(self.endpoint.clone())
				.header("x-requested-with", "XMLHttpRequest")
				.json(&payload)
				.map_err(|e| Box::new(e) as BackendError)?;
			let response = self
				.transport
				.execute(request)
				.await
				.map_err(|e| Box::new(e) as BackendError)?;

			if !response.is_success() {
				return Ok(None);
			}

			let grant: RefreshGrant =
				response.json().map_err(|e| Box::new(e) as BackendError)?;

			if grant.access_token.is_empty() {
				return Ok(None);
			}

			Ok(Some(RotatedTokens {
				access_token: TokenSecret::new(grant.access_token),
				refresh_token: grant.refresh_token.map(TokenSecret::new),
			}))
		})
	}
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
	refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshGrant {
	#[serde(alias = "accessToken")]
	access_token: String,
	#[serde(default, alias = "refreshToken")]
	refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn grant_parsing_accepts_both_field_conventions() {
		let snake: RefreshGrant =
			serde_json::from_str("{\"access_token\":\"a2\",\"refresh_token\":\"r2\"}")
				.expect("Snake-case grant should parse.");

		assert_eq!(snake.access_token, "a2");
		assert_eq!(snake.refresh_token.as_deref(), Some("r2"));

		let camel: RefreshGrant =
			serde_json::from_str("{\"accessToken\":\"a2\",\"user\":{\"id\":7}}")
				.expect("CamelCase grant with extra fields should parse.");

		assert_eq!(camel.access_token, "a2");
		assert_eq!(camel.refresh_token, None);
	}

	#[test]
	fn endpoint_parser_rejects_garbage() {
		let err = RestRefreshBackend::parse_endpoint("not a url")
			.expect_err("Invalid endpoint should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
	}
}
