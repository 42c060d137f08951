//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	store::{CredentialStore, StoreError, StoreFuture},
};

type Slot = Arc<RwLock<Option<CredentialPair>>>;

/// Keeps the credential snapshot in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Returns the currently stored snapshot without going through the async contract.
	pub fn snapshot(&self) -> Option<CredentialPair> {
		self.0.read().clone()
	}
}
impl CredentialStore for MemoryStore {
	fn persist(&self, snapshot: Option<CredentialPair>) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = snapshot;

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<CredentialPair>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok::<_, StoreError>(slot.read().clone()) })
	}
}
