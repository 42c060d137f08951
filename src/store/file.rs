//! Simple file-backed [`CredentialStore`] for CLI tools and desktop shells.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	store::{CredentialStore, StoreError, StoreFuture},
};

/// Persists the credential snapshot to a JSON file after each mutation.
///
/// The file holds the opaque `{"accessToken", "refreshToken"}` object; the path (and
/// therefore any key naming scheme around it) is entirely the caller's concern.
/// Clearing the snapshot removes the file.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<CredentialPair>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<Option<CredentialPair>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let pair: CredentialPair =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(Some(pair))
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn write_snapshot(&self, pair: &CredentialPair) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(pair).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize credential snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn remove_snapshot(&self) -> Result<(), StoreError> {
		if !self.path.exists() {
			return Ok(());
		}

		fs::remove_file(&self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to remove {}: {e}", self.path.display()),
		})
	}
}
impl CredentialStore for FileStore {
	fn persist(&self, snapshot: Option<CredentialPair>) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			match &snapshot {
				Some(pair) => self.write_snapshot(pair)?,
				None => self.remove_snapshot()?,
			}

			*guard = snapshot;

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<CredentialPair>> {
		Box::pin(async move { Ok(self.inner.read().clone()) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		env, process,
		time::{SystemTime, UNIX_EPOCH},
	};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn temp_path() -> PathBuf {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.expect("System clock should be past the epoch.")
			.as_nanos();
		let unique = format!("bearer_relay_file_store_{}_{nanos}.json", process::id());

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.persist(Some(CredentialPair::new("a1", Some("r1")))))
			.expect("Failed to persist fixture snapshot to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.load())
			.expect("Failed to load snapshot from file store.")
			.expect("File store lost snapshot after reopen.");

		assert_eq!(fetched.access_token.expose(), "a1");
		assert_eq!(fetched.refresh_token.as_ref().map(TokenSecret::expose), Some("r1"));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn clearing_removes_the_snapshot_file() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.persist(Some(CredentialPair::new("a1", None::<String>))))
			.expect("Failed to persist fixture snapshot to file store.");

		assert!(path.exists());

		rt.block_on(store.persist(None)).expect("Failed to clear file store snapshot.");

		assert!(!path.exists());
		assert!(
			rt.block_on(store.load())
				.expect("Failed to load cleared snapshot from file store.")
				.is_none()
		);
	}
}
