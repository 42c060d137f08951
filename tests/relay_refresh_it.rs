#![cfg(feature = "reqwest")]

// std
use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use httpmock::prelude::*;
use tokio::time::{Duration, sleep};
// self
use bearer_relay::{
	auth::{CredentialPair, RotatedTokens, TokenSecret},
	backend::{BackendError, RefreshFn},
	http::RequestSpec,
	relay::{Relay, RefreshPhase, ReqwestRelay},
	store::MemoryStore,
	url::Url,
};

fn build_relay(access: &str, refresh: &str) -> ReqwestRelay {
	let relay = Relay::new();

	relay.install_credentials(CredentialPair::new(access, Some(refresh)));

	relay
}

fn endpoint(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint URL should parse.")
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh_and_replay_with_the_new_token() {
	let server = MockServer::start_async().await;
	let relay = build_relay("a1", "r1");
	let calls = Arc::new(AtomicU64::new(0));
	let backend_calls = calls.clone();

	relay.register_refresh_backend(RefreshFn::new(move |refresh: TokenSecret| {
		let calls = backend_calls.clone();

		async move {
			assert_eq!(refresh.expose(), "r1");

			calls.fetch_add(1, Ordering::Relaxed);

			// Hold the wave open long enough for concurrent 401s to pile up behind it.
			sleep(Duration::from_millis(100)).await;

			Ok::<_, BackendError>(Some(RotatedTokens::full("a2", "r2")))
		}
	}));

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer a1");
			then.status(401).body("token expired");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer a2");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"balance\":42}");
		})
		.await;
	let spec = || RequestSpec::get(endpoint(&server, "/portfolio"));
	let (first, second, third) =
		tokio::join!(relay.request(spec()), relay.request(spec()), relay.request(spec()));

	for response in [first, second, third] {
		let response = response.expect("Replayed request should succeed after the refresh.");

		assert_eq!(response.status, 200);
		assert_eq!(response.text(), "{\"balance\":42}");
	}

	// One wave serviced all three 401s, and every replay carried the rotated token.
	assert_eq!(calls.load(Ordering::Relaxed), 1);

	stale.assert_calls_async(3).await;
	fresh.assert_calls_async(3).await;

	assert_eq!(relay.refresh_phase(), RefreshPhase::Idle);
	assert_eq!(relay.refresh_metrics.attempts(), 1);
	assert_eq!(relay.refresh_metrics.successes(), 1);
	assert_eq!(relay.refresh_metrics.coalesced(), 2);

	let pair = relay.credentials().expect("Credentials should survive a successful wave.");

	assert_eq!(pair.access_token.expose(), "a2");
	assert_eq!(pair.refresh_token.as_ref().map(TokenSecret::expose), Some("r2"));
}

#[tokio::test]
async fn a_settled_wave_leaves_the_relay_ready_for_the_next_one() {
	let server = MockServer::start_async().await;
	let relay = build_relay("a1", "r1");
	let calls = Arc::new(AtomicU64::new(0));
	let backend_calls = calls.clone();

	relay.register_refresh_backend(RefreshFn::new(move |_refresh: TokenSecret| {
		let access = match backend_calls.fetch_add(1, Ordering::Relaxed) {
			0 => "a2",
			_ => "a3",
		};

		async move { Ok::<_, BackendError>(Some(RotatedTokens::access_only(access))) }
	}));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/one").header("authorization", "Bearer a1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/one").header("authorization", "Bearer a2");
			then.status(200).body("one");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/two").header("authorization", "Bearer a2");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/two").header("authorization", "Bearer a3");
			then.status(200).body("two");
		})
		.await;

	let one = relay
		.request(RequestSpec::get(endpoint(&server, "/one")))
		.await
		.expect("First wave should recover the request.");

	assert_eq!(one.text(), "one");
	assert_eq!(relay.refresh_phase(), RefreshPhase::Idle);

	let two = relay
		.request(RequestSpec::get(endpoint(&server, "/two")))
		.await
		.expect("Second wave should recover the request.");

	assert_eq!(two.text(), "two");
	assert_eq!(calls.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn rotation_without_a_new_refresh_token_keeps_the_previous_one() {
	let server = MockServer::start_async().await;
	let relay = build_relay("a1", "r1");

	relay.register_refresh_backend(RefreshFn::new(|_refresh: TokenSecret| async move {
		Ok::<_, BackendError>(Some(RotatedTokens::access_only("a2")))
	}));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer a1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer a2");
			then.status(200).body("ok");
		})
		.await;

	relay
		.request(RequestSpec::get(endpoint(&server, "/portfolio")))
		.await
		.expect("Request should recover through the wave.");

	let pair = relay.credentials().expect("Credentials should be held after rotation.");

	assert_eq!(pair.access_token.expose(), "a2");
	assert_eq!(pair.refresh_token.as_ref().map(TokenSecret::expose), Some("r1"));
}

#[tokio::test]
async fn successful_waves_push_the_rotated_snapshot_into_the_store() {
	let server = MockServer::start_async().await;
	let relay = build_relay("a1", "r1");
	let store = MemoryStore::default();

	relay.register_store(store.clone());
	relay.register_refresh_backend(RefreshFn::new(|_refresh: TokenSecret| async move {
		Ok::<_, BackendError>(Some(RotatedTokens::full("a2", "r2")))
	}));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer a1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer a2");
			then.status(200).body("ok");
		})
		.await;

	relay
		.request(RequestSpec::get(endpoint(&server, "/portfolio")))
		.await
		.expect("Request should recover through the wave.");

	let snapshot = store.snapshot().expect("Store should hold the rotated snapshot.");

	assert_eq!(snapshot.access_token.expose(), "a2");
	assert_eq!(snapshot.refresh_token.as_ref().map(TokenSecret::expose), Some("r2"));
}
