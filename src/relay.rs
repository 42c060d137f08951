//! The relay: an authenticated HTTP client with transparent refresh and replay.

pub mod metrics;

mod request;
mod wave;

pub use metrics::RefreshMetrics;
pub use request::Attempt;
pub use wave::RefreshPhase;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	backend::{LogoutHook, RefreshBackend},
	ext::RequestDecorator,
	http::HttpTransport,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Relay specialized for the crate's default reqwest transport.
pub type ReqwestRelay = Relay<ReqwestTransport>;

/// Issues HTTP requests with automatic bearer injection, intercepts 401 responses,
/// performs at-most-one concurrent token refresh, and transparently replays the
/// requests that failed because of the expired token.
///
/// One relay instance owns the credential pair and the refresh wave state for a whole
/// process: construct it once at the composition root and hand out `Arc<Relay<_>>`
/// references. Collaborators (refresh backend, logout hook, credential store,
/// decorators) are injected after construction so the host can wire the relay to its
/// own credential handling without a circular dependency.
pub struct Relay<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Shared counters for refresh wave outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	credentials: Mutex<Option<CredentialPair>>,
	refresh_gate: AsyncMutex<()>,
	phase: Mutex<RefreshPhase>,
	refresh_backend: RwLock<Option<Arc<dyn RefreshBackend>>>,
	logout_hook: RwLock<Option<Arc<dyn LogoutHook>>>,
	store: RwLock<Option<Arc<dyn CredentialStore>>>,
	decorators: RwLock<Vec<Arc<dyn RequestDecorator>>>,
}
impl<T> Relay<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a relay over the caller-provided transport.
	pub fn with_transport(transport: impl Into<Arc<T>>) -> Self {
		Self {
			transport: transport.into(),
			refresh_metrics: Default::default(),
			credentials: Mutex::new(None),
			refresh_gate: AsyncMutex::new(()),
			phase: Mutex::new(RefreshPhase::Idle),
			refresh_backend: RwLock::new(None),
			logout_hook: RwLock::new(None),
			store: RwLock::new(None),
			decorators: RwLock::new(Vec::new()),
		}
	}

	/// Registers the refresh backend, replacing any previous registration.
	pub fn register_refresh_backend(&self, backend: impl RefreshBackend + 'static) {
		*self.refresh_backend.write() = Some(Arc::new(backend));
	}

	/// Registers the logout hook, replacing any previous registration.
	pub fn register_logout_hook(&self, hook: impl LogoutHook + 'static) {
		*self.logout_hook.write() = Some(Arc::new(hook));
	}

	/// Registers the credential store that observes every snapshot change.
	pub fn register_store(&self, store: impl CredentialStore + 'static) {
		*self.store.write() = Some(Arc::new(store));
	}

	/// Appends an outbound request decorator; decorators run in registration order.
	pub fn add_decorator(&self, decorator: impl RequestDecorator + 'static) {
		self.decorators.write().push(Arc::new(decorator));
	}

	/// Installs a credential pair (login). Only updates in-process state; use
	/// [`Relay::install_and_persist`] to also push the snapshot into the store.
	pub fn install_credentials(&self, pair: CredentialPair) {
		*self.credentials.lock() = Some(pair);
	}

	/// Installs a credential pair and persists the snapshot as a side effect.
	pub async fn install_and_persist(&self, pair: CredentialPair) {
		self.install_credentials(pair.clone());
		self.persist_snapshot(Some(pair)).await;
	}

	/// Clears the credential pair, persists the cleared snapshot, and signals logout.
	pub async fn logout(&self) {
		*self.credentials.lock() = None;

		self.persist_snapshot(None).await;
		self.signal_logout();
	}

	/// Loads a previously persisted snapshot into the relay, returning whether one
	/// existed. Typically called once at startup.
	pub async fn restore_from_store(&self) -> Result<bool> {
		let store = self.store.read().clone();
		let Some(store) = store else { return Ok(false) };
		let Some(pair) = store.load().await? else { return Ok(false) };

		self.install_credentials(pair);

		Ok(true)
	}

	/// Returns a clone of the current access token, if credentials are held.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.credentials.lock().as_ref().map(|pair| pair.access_token.clone())
	}

	/// Returns a clone of the full credential pair, if held.
	pub fn credentials(&self) -> Option<CredentialPair> {
		self.credentials.lock().clone()
	}

	/// Reports whether a refresh wave is currently in flight.
	pub fn refresh_phase(&self) -> RefreshPhase {
		*self.phase.lock()
	}

	pub(crate) fn signal_logout(&self) {
		let hook = self.logout_hook.read().clone();

		if let Some(hook) = hook {
			hook.on_logout();
		}
	}

	pub(crate) async fn persist_snapshot(&self, snapshot: Option<CredentialPair>) {
		let store = self.store.read().clone();
		let Some(store) = store else { return };

		if let Err(err) = store.persist(snapshot).await {
			// Persistence is a side effect; a failed write never fails the caller.
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %err, "Failed to persist credential snapshot.");
			#[cfg(not(feature = "tracing"))]
			let _ = err;
		}
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestTransport> {
	/// Creates a relay over a default reqwest transport.
	///
	/// Use [`Relay::with_transport`] to supply a client carrying custom TLS settings or
	/// a request-level timeout; the relay itself never enforces one.
	pub fn new() -> Self {
		Self::with_transport(ReqwestTransport::default())
	}
}
#[cfg(feature = "reqwest")]
impl Default for Relay<ReqwestTransport> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> Debug for Relay<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("credentials_held", &self.credentials.lock().is_some())
			.field("phase", &*self.phase.lock())
			.field("backend_registered", &self.refresh_backend.read().is_some())
			.finish()
	}
}
