//! Process-wide note store.
//!
//! Lifecycle: [`init`] once at startup, [`reload`] to swap in a fresh corpus,
//! [`teardown`] to drop it. Readers call [`current`] and hold the returned
//! `Arc` for as long as they need a consistent view.

use crate::config::Config;
use crate::error::{MnemoError, Result};
use crate::store::{Corpus, DocumentStore};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

static STORE: RwLock<Option<Arc<DocumentStore>>> = parking_lot::const_rwlock(None);

/// Load notes under `root` and install them as the process-wide store,
/// replacing any previous one.
pub fn init(root: &Path) -> Result<Arc<DocumentStore>> {
    install(DocumentStore::load(root)?)
}

pub fn init_with(root: &Path, config: Config) -> Result<Arc<DocumentStore>> {
    install(DocumentStore::load_with(root, config)?)
}

fn install(store: DocumentStore) -> Result<Arc<DocumentStore>> {
    let store = Arc::new(store);
    let previous = STORE.write().replace(Arc::clone(&store));
    if previous.is_some() {
        tracing::debug!(root = %store.root().display(), "replaced global note store");
    }
    Ok(store)
}

pub fn store() -> Result<Arc<DocumentStore>> {
    STORE.read().clone().ok_or(MnemoError::NotInitialized)
}

pub fn current() -> Result<Arc<Corpus>> {
    Ok(store()?.snapshot())
}

pub fn reload() -> Result<Arc<Corpus>> {
    store()?.reload()
}

/// Drop the global store. Returns whether one was installed. Outstanding
/// `Arc<Corpus>` handles stay valid.
pub fn teardown() -> bool {
    STORE.write().take().is_some()
}
