//! Demonstrates wiring the relay at a composition root: REST refresh backend, in-memory
//! credential store, logout hook, and a transparent refresh-and-replay round trip.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use bearer_relay::{
	auth::CredentialPair,
	backend::RestRefreshBackend,
	ext::StaticHeaders,
	http::RequestSpec,
	relay::Relay,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	// The stale token is rejected once, then the rotated one is accepted.
	server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer demo-stale");
			then.status(401).body("token expired");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolio").header("authorization", "Bearer demo-fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"holdings\":[{\"symbol\":\"BTC\",\"amount\":0.5}]}");
		})
		.await;
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-fresh\",\"refresh_token\":\"demo-refresh-2\"}");
		})
		.await;

	let relay = Arc::new(Relay::new());

	relay.register_store(MemoryStore::default());
	relay.register_refresh_backend(RestRefreshBackend::new(Url::parse(
		&server.url("/auth/refresh"),
	)?));
	relay.register_logout_hook(|| println!("Session ended; redirect to login."));
	relay.add_decorator(StaticHeaders::new([("x-requested-with", "XMLHttpRequest")]));
	relay.install_and_persist(CredentialPair::new("demo-stale", Some("demo-refresh"))).await;

	let response = relay.request(RequestSpec::get(Url::parse(&server.url("/portfolio"))?)).await?;

	println!("Portfolio after transparent refresh: {}.", response.text());
	println!(
		"Waves led: {}, coalesced waiters: {}.",
		relay.refresh_metrics.attempts(),
		relay.refresh_metrics.coalesced(),
	);

	exchange.assert_async().await;

	Ok(())
}
