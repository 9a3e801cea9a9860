mod common;

// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use common::*;
use google_fitness_mcp::{
	auth::{FITNESS_ACTIVITY_READ, ScopeSet, TokenSecret},
	error::Error,
	store::{CredentialStore, FileStore, MemoryStore},
};

const REFRESH_RESPONSE: &str =
	"{\"access_token\":\"ya29.refreshed\",\"token_type\":\"Bearer\",\"expires_in\":3599}";

#[tokio::test]
async fn valid_credential_is_returned_without_refresh_or_write() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500);
		})
		.await;
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.current",
		Some("1//refresh"),
		valid_until(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(
		oauth_client(&server),
		"ya29.consent",
		None,
		valid_until(),
	)));
	let manager = manager(store.clone(), flow.clone());
	let acquired = manager.acquire().await.expect("A valid credential should be reused.");

	assert_eq!(acquired.access_token.expose(), "ya29.current");
	assert_eq!(store.save_count(), 0);
	assert_eq!(flow.calls(), 0);

	token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_credential_is_refreshed_once_and_persisted() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "1//refresh")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").body(REFRESH_RESPONSE);
		})
		.await;
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.stale",
		Some("1//refresh"),
		expired_at(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(
		oauth_client(&server),
		"ya29.consent",
		None,
		valid_until(),
	)));
	let manager = manager(store.clone(), flow.clone());
	let acquired = manager.acquire().await.expect("Refresh should succeed.");

	token_mock.assert_calls_async(1).await;

	assert_eq!(acquired.access_token.expose(), "ya29.refreshed");
	// Google does not rotate refresh tokens on refresh; the old one must survive.
	assert_eq!(acquired.refresh_token.as_ref().map(TokenSecret::expose), Some("1//refresh"));
	assert!(acquired.is_valid());
	assert_eq!(flow.calls(), 0);
	assert_eq!(store.save_count(), 1);
	assert_eq!(
		store.snapshot().map(|stored| stored.access_token.expose().to_owned()),
		Some("ya29.refreshed".into())
	);
	assert_eq!(manager.refresh_metrics.attempts(), 1);
	assert_eq!(manager.refresh_metrics.successes(), 1);

	// The persisted credential is now valid, so a second call performs no grant.
	manager.acquire().await.expect("The refreshed credential should be reused.");

	token_mock.assert_calls_async(1).await;

	assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn credential_inside_the_threshold_is_refreshed() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(REFRESH_RESPONSE);
		})
		.await;
	let almost_expired = time::OffsetDateTime::now_utc() + Duration::seconds(100);
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.almost",
		Some("1//refresh"),
		almost_expired,
	)));
	let flow = Arc::new(CountingFlow::new(credential(
		oauth_client(&server),
		"ya29.consent",
		None,
		valid_until(),
	)));
	let manager = manager(store.clone(), flow);
	let acquired = manager.acquire().await.expect("Refresh should succeed.");

	token_mock.assert_calls_async(1).await;

	assert_eq!(acquired.access_token.expose(), "ya29.refreshed");

	// With a zero threshold the same credential would still have been usable.
	let relaxed_store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.almost",
		Some("1//refresh"),
		almost_expired,
	)));
	let relaxed = common::manager(
		relaxed_store,
		Arc::new(CountingFlow::new(credential(oauth_client(&server), "x", None, valid_until()))),
	)
	.with_refresh_threshold(Duration::ZERO);

	assert_eq!(
		relaxed.acquire().await.expect("Credential should be reused.").access_token.expose(),
		"ya29.almost"
	);

	token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn granted_scopes_from_the_refresh_response_are_recorded() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"ya29.narrow\",\"token_type\":\"Bearer\",\"expires_in\":3599,\"scope\":\"{FITNESS_ACTIVITY_READ}\"}}"
			));
		})
		.await;

	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.stale",
		Some("1//refresh"),
		expired_at(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(oauth_client(&server), "x", None, valid_until())));
	let acquired = manager(store, flow).acquire().await.expect("Refresh should succeed.");

	assert_eq!(
		acquired.scope,
		ScopeSet::new([FITNESS_ACTIVITY_READ]).expect("Scope fixture should build.")
	);
}

#[tokio::test]
async fn expired_credential_without_refresh_token_runs_consent() {
	let server = MockServer::start_async().await;
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.stale",
		None,
		expired_at(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(
		oauth_client(&server),
		"ya29.consent",
		Some("1//fresh"),
		valid_until(),
	)));
	let manager = manager(store.clone(), flow.clone());
	let acquired = manager.acquire().await.expect("Consent should produce a credential.");

	assert_eq!(acquired.access_token.expose(), "ya29.consent");
	assert_eq!(flow.calls(), 1);
	assert_eq!(store.save_count(), 1);
	assert_eq!(manager.refresh_metrics.attempts(), 0);
}

#[tokio::test]
async fn missing_credential_runs_consent_and_persists() {
	let server = MockServer::start_async().await;
	let store = Arc::new(MemoryStore::default());
	let flow = Arc::new(CountingFlow::new(credential(
		oauth_client(&server),
		"ya29.consent",
		Some("1//fresh"),
		valid_until(),
	)));
	let manager = manager(store.clone(), flow.clone());

	manager.acquire().await.expect("Consent should produce a credential.");

	assert_eq!(flow.calls(), 1);
	assert_eq!(store.save_count(), 1);
	assert_eq!(
		store.snapshot().and_then(|stored| stored.refresh_token).map(|t| t.expose().to_owned()),
		Some("1//fresh".into())
	);
}

#[tokio::test]
async fn revoked_refresh_token_propagates_without_fallback() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Token has been expired or revoked.\"}");
		})
		.await;
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(&server),
		"ya29.stale",
		Some("1//revoked"),
		expired_at(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(oauth_client(&server), "x", None, valid_until())));
	let manager = manager(store.clone(), flow.clone());
	let err = manager.acquire().await.expect_err("A revoked refresh token must fail.");

	token_mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::InvalidGrant { .. }), "{err}");
	assert_eq!(flow.calls(), 0);
	assert_eq!(store.save_count(), 0);
	assert_eq!(manager.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn corrupt_token_file_is_a_storage_error() {
	let path = std::env::temp_dir().join(format!(
		"google_fitness_manager_corrupt_{}_{}.json",
		std::process::id(),
		time::OffsetDateTime::now_utc().unix_timestamp_nanos()
	));

	std::fs::write(&path, "not json").expect("Fixture token file should be writable.");

	let server = MockServer::start_async().await;
	let flow = Arc::new(CountingFlow::new(credential(oauth_client(&server), "x", None, valid_until())));
	let store: Arc<dyn CredentialStore> = Arc::new(FileStore::new(&path));
	let manager = google_fitness_mcp::flows::CredentialManager::with_parts(
		http_client(),
		store,
		flow.clone(),
		ScopeSet::fitness_read(),
	);
	let err = manager.acquire().await.expect_err("Corrupt token files must fail.");

	assert!(matches!(err, Error::Storage(_)), "{err}");
	assert_eq!(flow.calls(), 0);

	std::fs::remove_file(&path).expect("Fixture token file should be removable.");
}
