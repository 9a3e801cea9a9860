//! Runtime configuration: file locations, API base, consent listener, and refresh threshold.
//!
//! Every field is a CLI flag; file locations, the API base, and the listener address also read
//! environment variables so an MCP host's launch configuration can set them directly.

// crates.io
use clap::Args;
// self
use crate::{
	_prelude::*,
	auth::{
		DEFAULT_REFRESH_THRESHOLD, FITNESS_ACTIVITY_READ, FITNESS_BODY_READ, FITNESS_HEART_RATE_READ,
		ScopeSet,
	},
	error::ConfigError,
};

/// Default Google Fitness REST API base.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/fitness/v1/";

/// Explicit configuration passed to the credential manager, consent flow, and Fitness client.
#[derive(Clone, Debug, Args)]
pub struct FitnessConfig {
	/// Where the authorized-user credential is persisted.
	#[arg(long, env = "GOOGLE_FITNESS_TOKEN_FILE", default_value = "token.json")]
	pub token_file: PathBuf,
	/// OAuth client secrets downloaded from the Google Cloud console.
	#[arg(long, env = "GOOGLE_FITNESS_CREDENTIALS_FILE", default_value = "credentials.json")]
	pub credentials_file: PathBuf,
	/// Google Fitness REST API base URL.
	#[arg(long, env = "GOOGLE_FITNESS_API_BASE", default_value = DEFAULT_API_BASE)]
	pub api_base: String,
	/// Host the consent redirect listener binds to.
	#[arg(long, env = "GOOGLE_FITNESS_CALLBACK_HOST", default_value = "localhost")]
	pub callback_host: String,
	/// Port the consent redirect listener binds to; `0` lets the OS pick one.
	#[arg(long, env = "GOOGLE_FITNESS_CALLBACK_PORT", default_value_t = 0)]
	pub callback_port: u16,
	/// OAuth scope to request; repeat the flag to request several.
	#[arg(
		long = "scope",
		value_name = "SCOPE",
		default_values_t = default_scopes()
	)]
	pub scopes: Vec<String>,
	/// Seconds before expiry at which a credential is already treated as expired.
	#[arg(long, default_value_t = DEFAULT_REFRESH_THRESHOLD.whole_seconds())]
	pub refresh_threshold_secs: i64,
}
impl FitnessConfig {
	/// Normalized scopes requested during consent.
	pub fn scope_set(&self) -> Result<ScopeSet, ConfigError> {
		Ok(ScopeSet::new(self.scopes.iter().cloned())?)
	}

	/// Refresh threshold as a duration; negative values are clamped to zero.
	pub fn refresh_threshold(&self) -> Duration {
		Duration::seconds(self.refresh_threshold_secs.max(0))
	}

	/// Parsed API base, always ending in `/` so relative joins keep the version segment.
	pub fn api_base_url(&self) -> Result<Url, ConfigError> {
		let mut raw = self.api_base.clone();

		if !raw.ends_with('/') {
			raw.push('/');
		}

		Url::parse(&raw).map_err(|source| ConfigError::InvalidApiBase { url: raw, source })
	}
}
impl Default for FitnessConfig {
	fn default() -> Self {
		Self {
			token_file: PathBuf::from("token.json"),
			credentials_file: PathBuf::from("credentials.json"),
			api_base: DEFAULT_API_BASE.into(),
			callback_host: "localhost".into(),
			callback_port: 0,
			scopes: default_scopes(),
			refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD.whole_seconds(),
		}
	}
}

fn default_scopes() -> Vec<String> {
	[FITNESS_ACTIVITY_READ, FITNESS_HEART_RATE_READ, FITNESS_BODY_READ]
		.into_iter()
		.map(String::from)
		.collect()
}
