//! Collaborator contracts the hosting application injects into the relay.
//!
//! Registration is last-wins: installing a new refresh backend or logout hook replaces
//! the previous one outright, there is no composition of multiple handlers. A relay
//! without a registered backend behaves as if every refresh resolved to nothing.

#[cfg(feature = "reqwest")] pub mod rest;

#[cfg(feature = "reqwest")] pub use rest::RestRefreshBackend;

// self
use crate::{
	_prelude::*,
	auth::{RotatedTokens, TokenSecret},
};

/// Opaque error a refresh backend may surface.
///
/// The relay treats a backend error identically to a `None` outcome: the wave fails,
/// waiters reject with their own original errors, and logout is signaled. The error
/// itself is only recorded for diagnostics.
pub type BackendError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`RefreshBackend::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<RotatedTokens>, BackendError>> + 'a + Send>>;

/// Exchanges the held refresh token for fresh credentials.
///
/// Resolving `Ok(None)` means the backend definitively declined the exchange (revoked
/// or expired refresh token); `Err` covers everything else that went wrong on the way.
/// Both settle the current wave as a failure.
pub trait RefreshBackend
where
	Self: Send + Sync,
{
	/// Performs one refresh exchange using the relay's current refresh token.
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a>;
}

/// Adapter that lets an async closure serve as a [`RefreshBackend`].
///
/// Mostly useful for tests and small embedders that do not want a dedicated type.
pub struct RefreshFn<F>(F);
impl<F, Fut> RefreshFn<F>
where
	F: Fn(TokenSecret) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<Option<RotatedTokens>, BackendError>> + Send,
{
	/// Wraps the provided closure.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, Fut> RefreshBackend for RefreshFn<F>
where
	F: Fn(TokenSecret) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<Option<RotatedTokens>, BackendError>> + Send,
{
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a> {
		Box::pin((self.0)(refresh_token.clone()))
	}
}

/// Fire-and-forget notification that the session ended.
///
/// Invoked synchronously when a wave fails or a 401 arrives with no credentials held.
/// The relay never catches panics from the hook; a broken handler is the host's bug.
pub trait LogoutHook
where
	Self: Send + Sync,
{
	/// Signals that the credential pair has been cleared.
	fn on_logout(&self);
}
impl<F> LogoutHook for F
where
	F: Fn() + Send + Sync,
{
	fn on_logout(&self) {
		self()
	}
}
