pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod global;
pub mod index;
pub mod io;
pub mod marketplace;
pub mod paths;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod validate;

pub use document::{DocPath, Header, ParseWarning, SkillDocument, WarningKind};
pub use error::{MnemoError, Result};
pub use query::{SearchFilters, SearchHit};
pub use store::{CancelToken, Corpus, DocumentStore};
