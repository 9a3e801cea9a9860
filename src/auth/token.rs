//! Credential records and the secret wrapper that keeps token material out of logs.

pub mod credential;
pub mod secret;
