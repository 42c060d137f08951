//! Redacting wrapper for bearer and refresh secrets.

// self
use crate::_prelude::*;

/// Opaque secret string whose formatters never reveal the value.
///
/// Access and refresh tokens travel through request headers, log statements, and
/// persisted snapshots; wrapping them keeps accidental `{:?}` output harmless.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Consumes the wrapper and returns the inner value.
	pub fn into_inner(self) -> String {
		self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("a1-super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn secret_round_trips_through_serde() {
		let secret = TokenSecret::new("a1");
		let payload = serde_json::to_string(&secret).expect("Secret should serialize to JSON.");

		assert_eq!(payload, "\"a1\"");

		let back: TokenSecret =
			serde_json::from_str(&payload).expect("Secret should deserialize from JSON.");

		assert_eq!(back.expose(), "a1");
	}
}
