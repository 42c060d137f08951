//! Transport primitives for authenticated request dispatch.
//!
//! The module exposes [`HttpTransport`] alongside the [`RequestSpec`] and [`Response`]
//! value types so downstream crates can integrate custom HTTP clients without pulling
//! in the relay's default reqwest stack. Transports only move bytes: status
//! classification, bearer injection, and refresh orchestration all live in
//! [`Relay`](crate::relay::Relay).

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{HeaderName, HeaderValue};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Status code that triggers the refresh interception path.
pub const UNAUTHORIZED: u16 = 401;

const AUTHORIZATION: &str = "authorization";
const CONTENT_TYPE: &str = "content-type";

/// HTTP verbs the relay dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
	/// `HEAD`.
	Head,
}
impl Method {
	/// Returns the canonical uppercase verb string.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
			Method::Head => "HEAD",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outbound request description: verb, target URL, headers, and optional body.
///
/// No validation happens here beyond what the underlying transport requires. This is a
/// plain value the relay clones for each dispatch attempt, so a replay never observes
/// mutations from the previous one.
#[derive(Clone, Debug)]
pub struct RequestSpec {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Ordered header list; later entries win when transports merge duplicates.
	pub headers: Vec<(String, String)>,
	/// Raw request body, if any.
	pub body: Option<Vec<u8>>,
}
impl RequestSpec {
	/// Creates a spec for the provided verb and URL.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Convenience constructor for `GET` requests.
	pub fn get(url: Url) -> Self {
		Self::new(Method::Get, url)
	}

	/// Convenience constructor for `POST` requests.
	pub fn post(url: Url) -> Self {
		Self::new(Method::Post, url)
	}

	/// Convenience constructor for `PUT` requests.
	pub fn put(url: Url) -> Self {
		Self::new(Method::Put, url)
	}

	/// Convenience constructor for `DELETE` requests.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::Delete, url)
	}

	/// Appends a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches a raw body with the provided content type.
	pub fn body(mut self, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
		self.headers.push((CONTENT_TYPE.into(), content_type.into()));
		self.body = Some(bytes.into());

		self
	}

	/// Serializes `payload` as the JSON body.
	pub fn json<T>(self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(payload)?;

		Ok(self.body("application/json", bytes))
	}

	/// Replaces any `Authorization` header with a bearer value for `token`, or strips it
	/// entirely when no token is held.
	///
	/// Replays rely on this being a replacement: the stale header from a pre-refresh
	/// attempt must never reach the wire again.
	pub fn with_bearer(mut self, token: Option<&TokenSecret>) -> Self {
		self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));

		if let Some(token) = token {
			self.headers.push((AUTHORIZATION.into(), format!("Bearer {}", token.expose())));
		}

		self
	}

	/// Returns the current `Authorization` header value, if one is set.
	pub fn authorization(&self) -> Option<&str> {
		self.headers
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION))
			.map(|(_, value)| value.as_str())
	}
}

/// Response surfaced to relay callers: status, headers, and the full body.
#[derive(Clone, Debug)]
pub struct Response {
	/// HTTP status code.
	pub status: u16,
	/// Response headers in arrival order.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl Response {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the first header matching `name`, case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Decodes the body as lossy UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Deserializes the body as JSON, reporting the path of the first offending field.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
	}
}

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing relay requests.
///
/// The trait is the relay's only dependency on an HTTP client. Implementations must be
/// `Send + Sync + 'static` so one transport can serve every call site in the process,
/// and they must surface non-2xx statuses as ordinary [`Response`] values; status
/// classification belongs to the relay, not the transport.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request and resolves with the complete response.
	fn execute(&self, request: RequestSpec) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Request-level timeouts remain a transport concern: configure them on the wrapped
/// client, the relay never enforces its own.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn convert_method(method: Method) -> reqwest::Method {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
			Method::Head => reqwest::Method::HEAD,
		}
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: RequestSpec) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder =
				client.request(Self::convert_method(request.method), request.url.clone());

			for (name, value) in &request.headers {
				let name = HeaderName::from_bytes(name.as_bytes())
					.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;
				let value = HeaderValue::from_str(value)
					.map_err(|_| ConfigError::InvalidHeader { name: name.to_string() })?;

				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
				})
				.collect();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(Response { status, headers, body })
		})
	}
}
