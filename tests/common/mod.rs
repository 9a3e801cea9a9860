//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use httpmock::MockServer;
use time::{Duration, OffsetDateTime};
// self
use google_fitness_mcp::{
	auth::{Credential, OAuthClient, ScopeSet},
	error::Result,
	flows::{AuthorizationFlow, AuthorizationFuture, CredentialManager},
	http::ReqwestHttpClient,
	store::MemoryStore,
	url::Url,
};

pub const CLIENT_ID: &str = "1234.apps.googleusercontent.com";
pub const CLIENT_SECRET: &str = "GOCSPX-test";

pub fn oauth_client(server: &MockServer) -> OAuthClient {
	OAuthClient::new(
		CLIENT_ID,
		Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."),
	)
	.with_client_secret(CLIENT_SECRET)
}

pub fn credential(
	client: OAuthClient,
	access_token: &str,
	refresh_token: Option<&str>,
	expires_at: OffsetDateTime,
) -> Credential {
	let mut builder = Credential::builder(client, ScopeSet::fitness_read())
		.access_token(access_token)
		.expires_at(expires_at);

	if let Some(refresh_token) = refresh_token {
		builder = builder.refresh_token(refresh_token);
	}

	builder.build().expect("Credential fixture should build.")
}

pub fn expired_at() -> OffsetDateTime {
	OffsetDateTime::now_utc() - Duration::hours(1)
}

pub fn valid_until() -> OffsetDateTime {
	OffsetDateTime::now_utc() + Duration::hours(1)
}

/// Consent flow double that hands out a fixed credential and counts invocations.
pub struct CountingFlow {
	issued: Credential,
	calls: AtomicUsize,
}
impl CountingFlow {
	pub fn new(issued: Credential) -> Self {
		Self { issued, calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl AuthorizationFlow for CountingFlow {
	fn obtain<'a>(&'a self, _scope: &'a ScopeSet) -> AuthorizationFuture<'a> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let issued: Result<Credential> = Ok(self.issued.clone());

		Box::pin(async move { issued })
	}
}

pub fn http_client() -> Arc<ReqwestHttpClient> {
	Arc::new(ReqwestHttpClient::new().expect("Reqwest client should build."))
}

pub fn manager(
	store: Arc<MemoryStore>,
	flow: Arc<CountingFlow>,
) -> CredentialManager<ReqwestHttpClient> {
	CredentialManager::with_parts(http_client(), store, flow, ScopeSet::fitness_read())
}

pub use std::sync::Arc;

pub fn fitness_client(server: &MockServer) -> google_fitness_mcp::fitness::FitnessClient {
	let base = Url::parse(&server.url("/fitness/v1/")).expect("Mock API base should parse.");

	google_fitness_mcp::fitness::FitnessClient::new(
		google_fitness_mcp::reqwest::Client::new(),
		&base,
	)
	.expect("Fitness client should build.")
}

/// Service whose stored credential is already valid.
pub fn service_with_valid_credential(
	server: &MockServer,
	access_token: &str,
) -> google_fitness_mcp::fitness::FitnessService<ReqwestHttpClient> {
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(server),
		access_token,
		Some("1//refresh"),
		valid_until(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(oauth_client(server), "x", None, valid_until())));

	google_fitness_mcp::fitness::FitnessService::new(manager(store, flow), fitness_client(server))
}

/// Service whose stored credential is expired and whose refresh token the mock will reject.
pub fn service_with_revoked_refresh_token(
	server: &MockServer,
) -> (google_fitness_mcp::fitness::FitnessService<ReqwestHttpClient>, Arc<CountingFlow>) {
	let store = Arc::new(MemoryStore::with_credential(credential(
		oauth_client(server),
		"ya29.stale",
		Some("1//revoked"),
		expired_at(),
	)));
	let flow = Arc::new(CountingFlow::new(credential(oauth_client(server), "x", None, valid_until())));
	let service = google_fitness_mcp::fitness::FitnessService::new(
		manager(store, flow.clone()),
		fitness_client(server),
	);

	(service, flow)
}

pub const REVOKED_RESPONSE: &str =
	"{\"error\":\"invalid_grant\",\"error_description\":\"Token has been expired or revoked.\"}";
pub const AGGREGATE_PATH: &str = "/fitness/v1/users/me/dataset:aggregate";
