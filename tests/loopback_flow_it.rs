mod common;

// std
use std::{
	collections::HashMap,
	io::{self, Write},
	path::PathBuf,
	sync::{Arc, Mutex},
	time::Duration,
};
// crates.io
use httpmock::prelude::*;
use tokio::{
	io::{AsyncReadExt, AsyncWriteExt},
	net::{TcpListener, TcpStream},
	time::timeout,
};
// self
use common::*;
use google_fitness_mcp::{
	auth::ScopeSet,
	config::FitnessConfig,
	error::{ConfigError, Error},
	flows::{
		AuthorizationFlow, LoopbackFlow, Redirect,
		authorization::callback,
	},
	url::Url,
};

/// Collects formatted log lines so tests can assert on stderr status messages.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);
impl CapturedLogs {
	fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().expect("Log buffer lock should not be poisoned."))
			.into_owned()
	}
}
impl Write for CapturedLogs {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().expect("Log buffer lock should not be poisoned.").extend_from_slice(buf);

		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

fn write_client_secrets(server: &MockServer, tag: &str) -> PathBuf {
	let path = std::env::temp_dir().join(format!(
		"google_fitness_client_secrets_{tag}_{}_{}.json",
		std::process::id(),
		time::OffsetDateTime::now_utc().unix_timestamp_nanos()
	));
	let document = serde_json::json!({
		"installed": {
			"client_id": CLIENT_ID,
			"client_secret": CLIENT_SECRET,
			"auth_uri": "https://accounts.google.com/o/oauth2/auth",
			"token_uri": server.url("/token"),
			"redirect_uris": ["http://localhost"]
		}
	});

	std::fs::write(&path, document.to_string()).expect("Client secrets fixture should be writable.");

	path
}

fn flow_config(credentials_file: PathBuf) -> FitnessConfig {
	FitnessConfig {
		credentials_file,
		callback_host: "127.0.0.1".into(),
		callback_port: 0,
		..Default::default()
	}
}

/// Simulates the browser: opens an idle preconnect socket, probes an unrelated path, then
/// follows the redirect with the query produced by `redirect_query`.
fn browser(
	redirect_query: impl Fn(&HashMap<String, String>) -> String + Send + Sync + 'static,
) -> impl Fn(&Url) + Send + Sync + 'static {
	move |authorize_url: &Url| {
		let params: HashMap<String, String> = authorize_url.query_pairs().into_owned().collect();
		let redirect_uri = params["redirect_uri"].clone();
		let query = redirect_query(&params);

		tokio::spawn(async move {
			let listener_address = Url::parse(&redirect_uri)
				.ok()
				.and_then(|url| url.socket_addrs(|| None).ok())
				.and_then(|addrs| addrs.into_iter().next());
			// Held open without sending anything until the redirect has been followed.
			let _preconnect = match listener_address {
				Some(address) => TcpStream::connect(address).await.ok(),
				None => None,
			};
			let client = google_fitness_mcp::reqwest::Client::new();
			// The listener must keep waiting after an unrelated request.
			let _ = client.get(format!("{redirect_uri}favicon.ico")).send().await;
			let _ = client.get(format!("{redirect_uri}?{query}")).send().await;
		});
	}
}

#[tokio::test]
async fn consent_exchanges_the_code_with_pkce() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "4/0Afresh")
				.form_urlencoded_tuple("client_id", CLIENT_ID);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"ya29.issued\",\"refresh_token\":\"1//issued\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let secrets = write_client_secrets(&server, "ok");
	let flow = LoopbackFlow::new(&flow_config(secrets.clone()), http_client()).with_prompt(browser(
		|params| {
			assert_eq!(params["access_type"], "offline");
			assert_eq!(params["code_challenge_method"], "S256");

			format!("code=4%2F0Afresh&state={}", params["state"])
		},
	));
	let logs = CapturedLogs::default();
	let subscriber = {
		let logs = logs.clone();

		tracing_subscriber::fmt()
			.with_writer(move || logs.clone())
			.with_ansi(false)
			.with_max_level(tracing::Level::INFO)
			.finish()
	};
	let _default = tracing::subscriber::set_default(subscriber);
	let credential =
		flow.obtain(&ScopeSet::fitness_read()).await.expect("Consent should yield a credential.");

	token.assert_calls_async(1).await;

	let logs = logs.contents();

	assert!(logs.contains("Waiting for the user to grant consent."), "{logs}");
	assert!(logs.contains("Authorization complete."), "{logs}");

	assert_eq!(credential.access_token.expose(), "ya29.issued");
	assert_eq!(credential.refresh_token.as_ref().map(|t| t.expose()), Some("1//issued"));
	assert_eq!(credential.client.client_id, CLIENT_ID);
	assert_eq!(credential.scope, ScopeSet::fitness_read());

	std::fs::remove_file(&secrets).expect("Client secrets fixture should be removable.");
}

#[tokio::test]
async fn denied_consent_is_reported() {
	let server = MockServer::start_async().await;
	let secrets = write_client_secrets(&server, "denied");
	let flow = LoopbackFlow::new(&flow_config(secrets.clone()), http_client())
		.with_prompt(browser(|params| format!("error=access_denied&state={}", params["state"])));
	let err = flow.obtain(&ScopeSet::fitness_read()).await.expect_err("Denial must fail.");

	assert!(matches!(&err, Error::AuthorizationDenied { reason } if reason == "access_denied"), "{err}");

	std::fs::remove_file(&secrets).expect("Client secrets fixture should be removable.");
}

#[tokio::test]
async fn mismatched_state_is_rejected_before_exchange() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500);
		})
		.await;
	let secrets = write_client_secrets(&server, "state");
	let flow = LoopbackFlow::new(&flow_config(secrets.clone()), http_client())
		.with_prompt(browser(|_| "code=forged&state=not-the-state".into()));
	let err = flow.obtain(&ScopeSet::fitness_read()).await.expect_err("Forged state must fail.");

	assert!(matches!(err, Error::InvalidGrant { .. }), "{err}");

	token.assert_calls_async(0).await;
	std::fs::remove_file(&secrets).expect("Client secrets fixture should be removable.");
}

#[tokio::test]
async fn missing_client_secrets_is_a_config_error() {
	let flow = LoopbackFlow::new(
		&flow_config(std::env::temp_dir().join("google_fitness_definitely_missing_secrets.json")),
		http_client(),
	)
	.with_prompt(|_: &Url| panic!("Consent must not start without client secrets."));
	let err = flow.obtain(&ScopeSet::fitness_read()).await.expect_err("Missing secrets must fail.");

	assert!(matches!(err, Error::Config(ConfigError::ClientSecretsRead { .. })), "{err}");
}

#[tokio::test]
async fn idle_connection_does_not_block_the_redirect() {
	let listener =
		TcpListener::bind("127.0.0.1:0").await.expect("Loopback listener should bind.");
	let address = listener.local_addr().expect("Listener should report its address.");
	let waiting = tokio::spawn(async move { callback::wait_for_redirect(&listener).await });
	let _idle = TcpStream::connect(address).await.expect("Idle connection should open.");
	let mut browser = TcpStream::connect(address).await.expect("Redirect connection should open.");

	browser
		.write_all(b"GET /?code=abc&state=s HTTP/1.1\r\nHost: localhost\r\n\r\n")
		.await
		.expect("Redirect request should be written.");

	let mut response = String::new();

	timeout(Duration::from_secs(5), browser.read_to_string(&mut response))
		.await
		.expect("Redirect must be answered while another connection stays idle.")
		.expect("Redirect response should be readable.");

	assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");

	let redirect = timeout(Duration::from_secs(5), waiting)
		.await
		.expect("Listener must return once the redirect is served.")
		.expect("Listener task should not panic.")
		.expect("Listener should yield the redirect.");

	assert_eq!(redirect, Redirect::Code { code: "abc".into(), state: Some("s".into()) });
}
