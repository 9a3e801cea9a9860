//! Scopes, credentials, and client secrets for the Google OAuth 2.0 installed-app flow.

pub mod scope;
pub mod secrets;
pub mod token;

pub use scope::*;
pub use secrets::*;
pub use token::{credential::*, secret::*};
