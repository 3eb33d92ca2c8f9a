//! Operation Dispatcher - bridge from routing instructions to the record store
//!
//! - Normalizes the action verb to one of create/read/update/delete/count
//! - Resolves entity scope and translates filters to predicates
//! - Must NOT embed storage details; it orchestrates the `RecordStore`
//! - Turns outcomes into human-readable messages
//!
//! Update and delete honor only the first non-entity predicate, in filter
//! mapping order. Callers that need precise targeting must put a selective key
//! (such as a unique identifier) first.

use intent_types::{FieldMap, Predicate, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entity_resolver::EntityScope;
use super::filter_translator::FilterTranslator;
use super::store::{sanitize_fields, RecordStore};
use crate::error::DispatchError;

/// Default maximum records returned by a read
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Normalized dispatch action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Count,
}

impl Action {
    /// Normalize a free-form verb; unrecognised verbs read
    pub fn from_verb(verb: &str) -> Self {
        match verb.trim().to_lowercase().as_str() {
            "add" | "create" | "insert" | "new" => Action::Create,
            "modify" | "update" | "edit" | "change" | "set" => Action::Update,
            "delete" | "remove" | "erase" => Action::Delete,
            "count" | "total" | "how many" => Action::Count,
            _ => Action::Read,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Count => "count",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub message: String,
    pub data: Option<Vec<Record>>,
}

impl DispatchOutcome {
    fn message(message: String) -> Self {
        Self {
            message,
            data: None,
        }
    }

    fn with_data(message: String, data: Vec<Record>) -> Self {
        Self {
            message,
            data: Some(data),
        }
    }
}

/// Composes entity resolution, filter translation and the record store
pub struct OperationDispatcher {
    store: Arc<dyn RecordStore>,
    translator: FilterTranslator,
    page_size: usize,
}

impl OperationDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            translator: FilterTranslator::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_translator(mut self, translator: FilterTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Execute one operation against the store
    pub async fn dispatch(
        &self,
        action: &str,
        entity: Option<&str>,
        filters: &FieldMap,
        data: &FieldMap,
    ) -> Result<DispatchOutcome, DispatchError> {
        let action = Action::from_verb(action);
        let scope = EntityScope::resolve(entity);
        let predicates = self.translator.translate(entity, filters);

        info!(
            action = %action,
            entity = scope.label(),
            predicates = predicates.len(),
            store = self.store.store_name(),
            "Dispatching operation"
        );

        match action {
            Action::Create => self.execute_create(&scope, data).await,
            Action::Read => self.execute_read(&scope, &predicates).await,
            Action::Update => self.execute_update(&scope, &predicates, data).await,
            Action::Delete => self.execute_delete(&scope, &predicates).await,
            Action::Count => self.execute_count(&scope, &predicates).await,
        }
    }

    async fn execute_create(
        &self,
        scope: &EntityScope,
        data: &FieldMap,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(tag) = scope.tag() else {
            warn!("Create requested without a concrete entity");
            return Err(DispatchError::InsufficientData {
                entity: scope.singular_label(),
            });
        };
        let fields = sanitize_fields(data.clone());
        if fields.is_empty() {
            return Err(DispatchError::InsufficientData {
                entity: scope.singular_label(),
            });
        }

        let record = self
            .store
            .create(tag, fields)
            .await
            .map_err(|e| DispatchError::from_store("create", e))?;

        Ok(DispatchOutcome::with_data(
            format!("Successfully added a new {}.", tag),
            vec![record],
        ))
    }

    async fn execute_read(
        &self,
        scope: &EntityScope,
        predicates: &[Predicate],
    ) -> Result<DispatchOutcome, DispatchError> {
        let records = self
            .store
            .read(scope.tag(), predicates, self.page_size)
            .await
            .map_err(|e| DispatchError::from_store("read", e))?;

        let message = if records.is_empty() {
            format!("No {} found.", scope.label())
        } else {
            format!("Found {} {}.", records.len(), scope.label())
        };
        Ok(DispatchOutcome::with_data(message, records))
    }

    async fn execute_update(
        &self,
        scope: &EntityScope,
        predicates: &[Predicate],
        data: &FieldMap,
    ) -> Result<DispatchOutcome, DispatchError> {
        let targeting = mutation_predicates(predicates);
        debug!(honored = targeting.len(), supplied = predicates.len(), "Update targeting");

        let updated = self
            .store
            .update(scope.tag(), targeting, data.clone())
            .await
            .map_err(|e| DispatchError::from_store("update", e))?;

        Ok(match updated {
            Some(record) => DispatchOutcome::with_data(
                format!("Successfully updated the {}.", scope.label()),
                vec![record],
            ),
            None => DispatchOutcome::message(not_found_message(scope)),
        })
    }

    async fn execute_delete(
        &self,
        scope: &EntityScope,
        predicates: &[Predicate],
    ) -> Result<DispatchOutcome, DispatchError> {
        let targeting = mutation_predicates(predicates);
        debug!(honored = targeting.len(), supplied = predicates.len(), "Delete targeting");

        let deleted = self
            .store
            .delete(scope.tag(), targeting)
            .await
            .map_err(|e| DispatchError::from_store("delete", e))?;

        Ok(match deleted {
            Some(_) => {
                DispatchOutcome::message(format!("Successfully deleted the {}.", scope.label()))
            }
            None => DispatchOutcome::message(not_found_message(scope)),
        })
    }

    async fn execute_count(
        &self,
        scope: &EntityScope,
        predicates: &[Predicate],
    ) -> Result<DispatchOutcome, DispatchError> {
        let count = self
            .store
            .count(scope.tag(), predicates)
            .await
            .map_err(|e| DispatchError::from_store("count", e))?;

        let message = if count == 1 {
            format!("There is 1 {}.", scope.singular_label())
        } else {
            format!("There are {} {}.", count, scope.label())
        };
        Ok(DispatchOutcome::message(message))
    }
}

/// Update/delete honor at most the first predicate
fn mutation_predicates(predicates: &[Predicate]) -> &[Predicate] {
    &predicates[..predicates.len().min(1)]
}

fn not_found_message(scope: &EntityScope) -> String {
    format!("No {} found matching criteria.", scope.label())
}
