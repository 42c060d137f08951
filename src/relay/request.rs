//! Request dispatch: bearer injection, 401 interception, and transparent replay.

// self
use crate::{
	_prelude::*,
	http::{HttpTransport, RequestSpec, Response, UNAUTHORIZED},
	obs::{self, OpKind, OpOutcome, OpSpan},
	relay::{Relay, wave::WaveOutcome},
};

const KIND: OpKind = OpKind::Request;

/// Explicit marker distinguishing a first dispatch from a post-refresh replay.
///
/// A replayed request that fails with 401 again is terminal: one logical failure wave
/// never triggers a second refresh for the same request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
	/// Initial dispatch; a 401 here enters the refresh interception path.
	First,
	/// Replay after a settled refresh wave; a 401 here propagates unchanged.
	Retry,
}

impl<T> Relay<T>
where
	T: ?Sized + HttpTransport,
{
	/// Dispatches a request with the relay's authentication contract.
	///
	/// On success the caller receives the 2xx response; a 401 caused by an expired
	/// access token is absorbed by a refresh wave and the caller simply resolves late
	/// with the replayed result. Every other failure, including an unrefreshable 401,
	/// propagates unchanged with no retry.
	pub async fn request(&self, spec: RequestSpec) -> Result<Response> {
		let span = OpSpan::new(KIND, "request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(spec)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, spec: RequestSpec) -> Result<Response> {
		let spec = self.decorate(spec);
		let mut attempt = Attempt::First;

		loop {
			let token = self.access_token();
			let outbound = spec.clone().with_bearer(token.as_ref());
			let response = self.transport.execute(outbound).await?;

			if response.status != UNAUTHORIZED || attempt == Attempt::Retry {
				return Self::settle(response);
			}

			// First-attempt 401. Without a held token there is nothing to refresh.
			let Some(stale) = token else {
				self.signal_logout();

				return Err(Error::Unauthenticated {
					status: response.status,
					body: response.text(),
				});
			};
			// Preserved so an unrefreshable wave rejects with the request's own
			// original error, never a wrapped refresh error.
			let denied = Error::Status { status: response.status, body: response.text() };

			match self.join_refresh_wave(&stale).await {
				WaveOutcome::Rotated => attempt = Attempt::Retry,
				WaveOutcome::Abandoned => return Err(denied),
			}
		}
	}

	fn settle(response: Response) -> Result<Response> {
		if response.is_success() {
			Ok(response)
		} else {
			Err(Error::Status { status: response.status, body: response.text() })
		}
	}

	fn decorate(&self, spec: RequestSpec) -> RequestSpec {
		let decorators = self.decorators.read().clone();

		decorators.iter().fold(spec, |spec, decorator| decorator.decorate(spec))
	}
}
