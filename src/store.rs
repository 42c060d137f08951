//! Persistence contracts and built-in stores for the relay's credential snapshot.
//!
//! Persistence is a side effect, not a dependency: the relay pushes every credential
//! change (install, rotation, clear) into the registered store and keeps serving
//! requests even when a write fails. Loading is only ever driven by the hosting
//! application, typically once at startup.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CredentialPair};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for credential snapshots.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists the snapshot, replacing any previous one. `None` clears the stored pair
	/// (logout or an irrecoverable refresh failure).
	fn persist(&self, snapshot: Option<CredentialPair>) -> StoreFuture<'_, ()>;

	/// Loads the stored snapshot, if one exists.
	fn load(&self) -> StoreFuture<'_, Option<CredentialPair>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
