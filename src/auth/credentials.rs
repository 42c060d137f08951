//! Credential pair lifecycle types and the refresh rotation policy.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access/refresh secret pair owned by a relay instance.
///
/// The pair is created on login, replaced on every successful rotation, and cleared on
/// logout or an irrecoverable refresh failure. Persisted snapshots use the camelCase
/// JSON layout (`{"accessToken", "refreshToken"}`) the hosting application stores.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
	/// Short-lived bearer secret attached to every authenticated request.
	pub access_token: TokenSecret,
	/// Longer-lived secret exchanged for a fresh access token, when the backend issued one.
	pub refresh_token: Option<TokenSecret>,
}
impl CredentialPair {
	/// Creates a pair from raw token values.
	pub fn new(access: impl Into<String>, refresh: Option<impl Into<String>>) -> Self {
		Self {
			access_token: TokenSecret::new(access),
			refresh_token: refresh.map(TokenSecret::new),
		}
	}

	/// Applies a refresh outcome, producing the replacement pair.
	///
	/// When the backend omits a new refresh token the previous one is retained; backends
	/// that rotate refresh secrets supersede it.
	pub fn rotated(&self, rotation: RotatedTokens) -> Self {
		Self {
			access_token: rotation.access_token,
			refresh_token: rotation.refresh_token.or_else(|| self.refresh_token.clone()),
		}
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Tokens returned by a successful refresh exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotatedTokens {
	/// Replacement access token.
	pub access_token: TokenSecret,
	/// Replacement refresh token, if the backend rotated it.
	pub refresh_token: Option<TokenSecret>,
}
impl RotatedTokens {
	/// Creates a rotation carrying only a new access token.
	pub fn access_only(access: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access), refresh_token: None }
	}

	/// Creates a rotation that replaces both secrets.
	pub fn full(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access),
			refresh_token: Some(TokenSecret::new(refresh)),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn pair() -> CredentialPair {
		CredentialPair::new("a1", Some("r1"))
	}

	#[test]
	fn rotation_without_new_refresh_retains_previous_secret() {
		let rotated = pair().rotated(RotatedTokens::access_only("a2"));

		assert_eq!(rotated.access_token.expose(), "a2");
		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("r1"));
	}

	#[test]
	fn rotation_with_new_refresh_supersedes_previous_secret() {
		let rotated = pair().rotated(RotatedTokens::full("a2", "r2"));

		assert_eq!(rotated.access_token.expose(), "a2");
		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("r2"));
	}

	#[test]
	fn snapshot_layout_is_camel_case() {
		let payload = serde_json::to_string(&pair())
			.expect("Credential pair should serialize for persistence.");

		assert_eq!(payload, "{\"accessToken\":\"a1\",\"refreshToken\":\"r1\"}");
	}

	#[test]
	fn debug_output_redacts_both_secrets() {
		let rendered = format!("{:?}", pair());

		assert!(!rendered.contains("a1"));
		assert!(!rendered.contains("r1"));
	}
}
