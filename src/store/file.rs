//! File-backed [`CredentialStore`] using Google's "authorized user" JSON layout.
//!
//! The document looks like the one Google's client libraries write:
//!
//! ```json
//! {
//!   "token": "ya29...",
//!   "refresh_token": "1//...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "1234.apps.googleusercontent.com",
//!   "client_secret": "GOCSPX-...",
//!   "scopes": ["https://www.googleapis.com/auth/fitness.activity.read"],
//!   "expiry": "2025-01-01T00:00:00Z"
//! }
//! ```
//!
//! A document without `expiry` is loaded as already expired, so it is refreshed (or re-issued)
//! before its access token is ever sent.

// std
use std::{
	fs::{self, OpenOptions},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, OAuthClient, ScopeSet, TokenSecret},
	store::{CredentialStore, StoreError, StoreFuture},
};

/// On-disk representation of a [`Credential`].
#[derive(Serialize, Deserialize)]
struct AuthorizedUser {
	token: TokenSecret,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<TokenSecret>,
	token_uri: Url,
	client_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	client_secret: Option<TokenSecret>,
	#[serde(default)]
	scopes: ScopeSet,
	#[serde(default, with = "time::serde::rfc3339::option")]
	expiry: Option<OffsetDateTime>,
}
impl From<&Credential> for AuthorizedUser {
	fn from(credential: &Credential) -> Self {
		Self {
			token: credential.access_token.clone(),
			refresh_token: credential.refresh_token.clone(),
			token_uri: credential.client.token_uri.clone(),
			client_id: credential.client.client_id.clone(),
			client_secret: credential.client.client_secret.clone(),
			scopes: credential.scope.clone(),
			expiry: Some(credential.expires_at),
		}
	}
}
impl From<AuthorizedUser> for Credential {
	fn from(user: AuthorizedUser) -> Self {
		Credential {
			client: OAuthClient {
				client_id: user.client_id,
				client_secret: user.client_secret,
				token_uri: user.token_uri,
			},
			scope: user.scopes,
			access_token: user.token,
			refresh_token: user.refresh_token,
			expires_at: user.expiry.unwrap_or(OffsetDateTime::UNIX_EPOCH),
		}
	}
}

/// Reads the token file on every load and rewrites it atomically on every save.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
}
impl FileStore {
	/// Creates a store for the provided path; the file does not need to exist yet.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Path of the token file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_now(&self) -> Result<Option<Credential>, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		let mut de = serde_json::Deserializer::from_slice(&bytes);
		let user: AuthorizedUser =
			serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", self.path.display()),
			})?;

		Ok(Some(user.into()))
	}

	fn save_now(&self, credential: &Credential) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create token directory {}: {e}", parent.display()),
			})?;
		}

		let serialized = serde_json::to_vec_pretty(&AuthorizedUser::from(credential)).map_err(
			|e| StoreError::Serialization { message: format!("Failed to serialize credential: {e}") },
		)?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut options = OpenOptions::new();

			options.write(true).create(true).truncate(true);

			#[cfg(unix)]
			{
				use std::os::unix::fs::OpenOptionsExt;

				options.mode(0o600);
			}

			let mut file = options.open(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl CredentialStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		Box::pin(async move { self.load_now() })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.save_now(&credential) })
	}
}
