//! Intent Router - natural-language queries to structured operations
//!
//! One free-text query flows through a fixed pipeline:
//! Query -> Provider Cascade -> Instruction Extractor -> Dispatcher | Weather -> Response
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use intent_router::{IntentRouter, RouterConfig};
//!
//! # async fn run() -> Result<(), intent_router::RouterError> {
//! let config = RouterConfig::from_env()?;
//! let router = IntentRouter::builder(config).build()?;
//! let response = router.handle("How many products are there?").await?;
//! println!("{}", response.response_text);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Injected, read-only configuration
pub mod config;

// Completion provider cascade, extraction and the router facade
pub mod agentic;

// Entity resolution, filter translation, dispatch and record stores
pub mod database;

// Weather collaborator
pub mod weather;

// REST API (when enabled)
#[cfg(feature = "server")]
pub mod api;

pub use agentic::{
    extract, CompletionProvider, GeminiProvider, IntentRouter, IntentRouterBuilder,
    ProviderCascade, RouterResponse,
};
pub use config::{CredentialSet, RouterConfig};
pub use database::{MemoryStore, OperationDispatcher, RecordStore};
pub use error::{
    ConfigError, DispatchError, ExtractError, ProviderError, RouterError, StoreError, WeatherError,
};
pub use intent_types::{
    FieldMap, FilterOp, InstructionParameters, Predicate, Record, RoutingInstruction, Tool,
};
pub use weather::{OpenWeatherClient, WeatherLookup, WeatherReport};
