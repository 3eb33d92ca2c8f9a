//! Record store integration
//!
//! Entity resolution, filter translation and the operation dispatcher, plus
//! the `RecordStore` adapter trait and its implementations.

pub mod dispatcher;
pub mod entity_resolver;
pub mod filter_translator;
pub mod memory_store;
#[cfg(feature = "database")]
pub mod pg_store;
pub mod store;

pub use dispatcher::{Action, DispatchOutcome, OperationDispatcher, DEFAULT_PAGE_SIZE};
pub use entity_resolver::{is_wildcard, normalize, EntityScope};
pub use filter_translator::{
    DateRelativeRule, FilterClause, FilterTranslator, FilterValue, FilterVocabulary, RangeBound,
};
pub use memory_store::MemoryStore;
#[cfg(feature = "database")]
pub use pg_store::{PgRecordStore, PgStoreConfig};
pub use store::RecordStore;
