//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` holds the validated authorization/token endpoints and the quirks Google's
//! installed-app flow needs (`access_type=offline`, space-delimited scopes). `strategy`
//! classifies token endpoint failures into the crate's error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
