//! Bearer-auth HTTP relay with transparent single-flight token refresh, ordered request
//! replay, and pluggable credential persistence.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod backend;
pub mod error;
pub mod ext;
pub mod http;
pub mod obs;
pub mod relay;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{auth::CredentialPair, http::ReqwestTransport, relay::Relay};

	/// Relay type alias used by reqwest-backed integration tests.
	pub type ReqwestTestRelay = Relay<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates mock servers
	/// present during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`Relay`] over the insecure test transport with the provided credential
	/// pair already installed.
	pub fn build_reqwest_test_relay(access: &str, refresh: &str) -> ReqwestTestRelay {
		let relay = Relay::with_transport(test_reqwest_transport());

		relay.install_credentials(CredentialPair::new(access, Some(refresh)));

		relay
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
