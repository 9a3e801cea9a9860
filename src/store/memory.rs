//! In-process [`CredentialStore`] for tests and embedding hosts that manage persistence.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreFuture},
};

/// Keeps the credential in memory and counts writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	slot: Arc<RwLock<Option<Credential>>>,
	saves: Arc<AtomicUsize>,
}
impl MemoryStore {
	/// Creates a store pre-seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		Self { slot: Arc::new(RwLock::new(Some(credential))), saves: Default::default() }
	}

	/// Returns a clone of the current credential without going through the async contract.
	pub fn snapshot(&self) -> Option<Credential> {
		self.slot.read().clone()
	}

	/// Number of [`CredentialStore::save`] calls observed so far.
	pub fn save_count(&self) -> usize {
		self.saves.load(Ordering::Relaxed)
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		let credential = self.snapshot();

		Box::pin(async move { Ok(credential) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		*self.slot.write() = Some(credential);
		self.saves.fetch_add(1, Ordering::Relaxed);

		Box::pin(async move { Ok(()) })
	}
}
