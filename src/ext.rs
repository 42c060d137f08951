//! Outbound request decoration contracts.
//!
//! Hosting applications often stamp ambient headers such as CSRF tokens or
//! `X-Requested-With` onto every call. Decorators run before bearer injection
//! on every dispatch attempt, so a replay is decorated exactly like the first try.

// self
use crate::{_prelude::*, http::RequestSpec};

/// Transforms an outbound request before it reaches the transport.
///
/// Decorators registered on a relay run in registration order. They must be cheap and
/// infallible; anything that can fail belongs in the transport or the caller.
pub trait RequestDecorator
where
	Self: Send + Sync,
{
	/// Consumes the request and returns the decorated replacement.
	fn decorate(&self, request: RequestSpec) -> RequestSpec;
}

/// Decorator that appends a fixed header set to every request.
#[derive(Clone, Debug, Default)]
pub struct StaticHeaders(Vec<(String, String)>);
impl StaticHeaders {
	/// Builds a decorator from name/value pairs.
	pub fn new<N, V>(headers: impl IntoIterator<Item = (N, V)>) -> Self
	where
		N: Into<String>,
		V: Into<String>,
	{
		Self(headers.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}
}
impl RequestDecorator for StaticHeaders {
	fn decorate(&self, mut request: RequestSpec) -> RequestSpec {
		for (name, value) in &self.0 {
			request = request.header(name.clone(), value.clone());
		}

		request
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn static_headers_append_in_order() {
		let decorator = StaticHeaders::new([
			("x-requested-with", "XMLHttpRequest"),
			("x-csrf-token", "csrf-123"),
		]);
		let request = decorator.decorate(RequestSpec::get(
			Url::parse("https://api.orcaquant.test/predictions").expect("Fixture URL should parse."),
		));

		assert_eq!(
			request.headers,
			vec![
				("x-requested-with".to_string(), "XMLHttpRequest".to_string()),
				("x-csrf-token".to_string(), "csrf-123".to_string()),
			],
		);
	}
}
