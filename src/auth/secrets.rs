//! Loader for the client secrets document downloaded from the Google Cloud console.
//!
//! The file is supplied out of band and is only read when the interactive consent flow has to
//! run; refreshes use the client identity persisted with the credential instead.

// std
use std::fs;
// self
use crate::{
	_prelude::*,
	auth::{OAuthClient, TokenSecret},
	error::ConfigError,
	provider::{ProviderDescriptor, ProviderQuirks},
};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Deserialize)]
struct ClientSecretsDocument {
	installed: Option<ClientSection>,
	web: Option<ClientSection>,
}

#[derive(Deserialize)]
struct ClientSection {
	client_id: String,
	#[serde(default)]
	client_secret: Option<TokenSecret>,
	#[serde(default)]
	auth_uri: Option<Url>,
	#[serde(default)]
	token_uri: Option<Url>,
}

/// OAuth client configuration for the installed-app (or web) client type.
#[derive(Clone)]
pub struct ClientSecrets {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret; Google issues one even for desktop clients.
	pub client_secret: Option<TokenSecret>,
	/// Consent page URL.
	pub auth_uri: Url,
	/// Token endpoint URL.
	pub token_uri: Url,
}
impl ClientSecrets {
	/// Reads and parses a client secrets file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let bytes = fs::read(path)
			.map_err(|source| ConfigError::ClientSecretsRead { path: path.to_owned(), source })?;

		Self::from_slice(path, &bytes)
	}

	/// Parses a client secrets document; `path` is only used in error messages.
	pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let document: ClientSecretsDocument = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::ClientSecretsParse { path: path.to_owned(), source })?;

		let section = document
			.installed
			.or(document.web)
			.ok_or_else(|| ConfigError::ClientSecretsMissingClient { path: path.to_owned() })?;
		let auth_uri = match section.auth_uri {
			Some(uri) => uri,
			None => default_endpoint(GOOGLE_AUTH_URI)?,
		};
		let token_uri = match section.token_uri {
			Some(uri) => uri,
			None => default_endpoint(GOOGLE_TOKEN_URI)?,
		};

		Ok(Self {
			client_id: section.client_id,
			client_secret: section.client_secret,
			auth_uri,
			token_uri,
		})
	}

	/// Builds the provider descriptor for these endpoints with Google's quirks.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		Ok(ProviderDescriptor::builder()
			.authorization_endpoint(self.auth_uri.clone())
			.token_endpoint(self.token_uri.clone())
			.quirks(ProviderQuirks::google())
			.build()?)
	}

	/// Client identity persisted alongside credentials issued to this client.
	pub fn oauth_client(&self) -> OAuthClient {
		OAuthClient {
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			token_uri: self.token_uri.clone(),
		}
	}
}
impl Debug for ClientSecrets {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientSecrets")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("auth_uri", &self.auth_uri)
			.field("token_uri", &self.token_uri)
			.finish()
	}
}

fn default_endpoint(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidDescriptor { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const INSTALLED: &str = r#"{
		"installed": {
			"client_id": "1234.apps.googleusercontent.com",
			"project_id": "fitness-demo",
			"auth_uri": "https://accounts.google.com/o/oauth2/auth",
			"token_uri": "https://oauth2.googleapis.com/token",
			"auth_provider_x509_cert_url": "https://www.googleapis.com/oauth2/v1/certs",
			"client_secret": "GOCSPX-secret",
			"redirect_uris": ["http://localhost"]
		}
	}"#;

	#[test]
	fn parses_installed_client() {
		let secrets = ClientSecrets::from_slice(Path::new("credentials.json"), INSTALLED.as_bytes())
			.expect("Installed client secrets should parse.");

		assert_eq!(secrets.client_id, "1234.apps.googleusercontent.com");
		assert_eq!(secrets.client_secret.as_ref().map(TokenSecret::expose), Some("GOCSPX-secret"));
		assert_eq!(secrets.token_uri.as_str(), GOOGLE_TOKEN_URI);

		let descriptor = secrets.descriptor().expect("Google endpoints should validate.");

		assert!(descriptor.quirks.offline_access);
		assert_eq!(secrets.oauth_client().client_id, secrets.client_id);
		assert!(!format!("{secrets:?}").contains("GOCSPX-secret"));
	}

	#[test]
	fn web_client_falls_back_to_default_endpoints() {
		let secrets = ClientSecrets::from_slice(
			Path::new("credentials.json"),
			br#"{"web":{"client_id":"web-client","client_secret":"s"}}"#,
		)
		.expect("Web client secrets should parse.");

		assert_eq!(secrets.auth_uri.as_str(), GOOGLE_AUTH_URI);
	}

	#[test]
	fn missing_client_section_is_reported() {
		let err = ClientSecrets::from_slice(Path::new("credentials.json"), br#"{"other":{}}"#)
			.expect_err("Documents without a client section must fail.");

		assert!(matches!(err, ConfigError::ClientSecretsMissingClient { .. }));

		let err = ClientSecrets::from_slice(
			Path::new("credentials.json"),
			br#"{"installed":{"client_secret":"s"}}"#,
		)
		.expect_err("Missing client_id must fail.");

		assert!(matches!(err, ConfigError::ClientSecretsParse { .. }));
		assert!(
			StdError::source(&err)
				.expect("Parse errors should carry a source.")
				.to_string()
				.contains("installed")
		);
	}
}
