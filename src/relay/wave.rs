//! Single-flight refresh waves: one outbound refresh per failure wave, FIFO waiters.
//!
//! Every request that observes a first-attempt 401 joins the wave through
//! [`Relay::join_refresh_wave`]. The fair async gate admits exactly one leader, which
//! performs the refresh exchange and settles the shared outcome; requests queued
//! behind it re-check the credential state after acquiring the gate and piggyback on
//! the settled wave instead of issuing their own refresh call. Acquisition order is
//! arrival order, so replays are dispatched FIFO; settlement order of the replays
//! themselves is up to the network.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, RotatedTokens, TokenSecret},
	http::HttpTransport,
	obs::{self, OpKind, OpOutcome, OpSpan},
	relay::Relay,
};

const KIND: OpKind = OpKind::Refresh;

/// Observable wave state: `Refreshing` exactly while a leader holds the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No refresh in flight.
	Idle,
	/// A refresh exchange is being performed.
	Refreshing,
}

/// How a settled wave resolved for one waiting request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WaveOutcome {
	/// Fresh credentials are installed; replay with the rotated token.
	Rotated,
	/// The wave failed; the request rejects with its original error.
	Abandoned,
}

impl<T> Relay<T>
where
	T: ?Sized + HttpTransport,
{
	/// Joins (or leads) the refresh wave servicing a 401 observed with `stale`.
	pub(crate) async fn join_refresh_wave(&self, stale: &TokenSecret) -> WaveOutcome {
		let span = OpSpan::new(KIND, "join_refresh_wave");

		span.instrument(async move {
			let _gate = self.refresh_gate.lock().await;

			// A wave that settled while this request queued already decided its fate:
			// rotated credentials mean replay, cleared credentials mean the wave
			// failed and logout has been signaled.
			match self.access_token() {
				Some(current) if current != *stale => {
					self.refresh_metrics.record_coalesced();

					return WaveOutcome::Rotated;
				},
				None => {
					self.refresh_metrics.record_coalesced();

					return WaveOutcome::Abandoned;
				},
				_ => {},
			}

			self.lead_refresh_wave().await
		})
		.await
	}

	/// Performs the single outbound refresh exchange for the current wave.
	async fn lead_refresh_wave(&self) -> WaveOutcome {
		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		// The guard resets the phase on every exit path, so `Refreshing` can never
		// leak past a settled wave.
		let _phase = PhaseGuard::enter(&self.phase);
		let refresh_secret = self.credentials().and_then(|pair| pair.refresh_token);
		let rotation = match &refresh_secret {
			Some(secret) => self.invoke_backend(secret).await,
			None => None,
		};

		match rotation {
			Some(rotation) => {
				let updated = self.rotate_credentials(rotation);

				self.persist_snapshot(Some(updated)).await;
				self.refresh_metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);

				WaveOutcome::Rotated
			},
			None => {
				*self.credentials.lock() = None;

				self.persist_snapshot(None).await;
				self.signal_logout();
				self.refresh_metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				WaveOutcome::Abandoned
			},
		}
	}

	async fn invoke_backend(&self, secret: &TokenSecret) -> Option<RotatedTokens> {
		let backend = self.refresh_backend.read().clone();
		let backend = backend?;

		match backend.refresh(secret).await {
			Ok(rotation) => rotation,
			Err(err) => {
				// A throwing backend is treated exactly like a declined exchange.
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %err, "Refresh backend failed; abandoning the wave.");
				#[cfg(not(feature = "tracing"))]
				let _ = err;

				None
			},
		}
	}

	fn rotate_credentials(&self, rotation: RotatedTokens) -> CredentialPair {
		let mut guard = self.credentials.lock();
		let updated = match guard.as_ref() {
			Some(pair) => pair.rotated(rotation),
			None => CredentialPair {
				access_token: rotation.access_token,
				refresh_token: rotation.refresh_token,
			},
		};

		*guard = Some(updated.clone());

		updated
	}
}

struct PhaseGuard<'a> {
	phase: &'a Mutex<RefreshPhase>,
}
impl<'a> PhaseGuard<'a> {
	fn enter(phase: &'a Mutex<RefreshPhase>) -> Self {
		*phase.lock() = RefreshPhase::Refreshing;

		Self { phase }
	}
}
impl Drop for PhaseGuard<'_> {
	fn drop(&mut self) {
		*self.phase.lock() = RefreshPhase::Idle;
	}
}
