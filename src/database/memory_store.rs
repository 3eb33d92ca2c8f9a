//! In-memory record store
//!
//! Keeps records in creation order behind a `tokio::sync::RwLock`. Optionally
//! emulates document-store composite index rules: a query mixing a range
//! predicate with any other field (the entity tag included) fails with
//! `IndexRequired` unless that field combination was registered.

use async_trait::async_trait;
use chrono::Utc;
use intent_types::{FieldMap, FilterOp, Predicate, Record};
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::store::{record_matches, sanitize_fields, RecordStore};
use crate::error::StoreError;

/// In-memory `RecordStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
    enforce_composite_index: bool,
    composite_indexes: Vec<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject range queries over unindexed field combinations
    pub fn with_index_enforcement(mut self) -> Self {
        self.enforce_composite_index = true;
        self
    }

    /// Register a composite index over `fields` (use `entity` for the tag)
    pub fn with_composite_index(mut self, fields: &[&str]) -> Self {
        self.composite_indexes
            .push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Number of stored records across all entities
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_index(&self, tag: Option<&str>, predicates: &[Predicate]) -> Result<(), StoreError> {
        if !self.enforce_composite_index {
            return Ok(());
        }
        let has_range = predicates.iter().any(|p| p.op != FilterOp::Eq);
        let mut fields: BTreeSet<String> = predicates.iter().map(|p| p.field.clone()).collect();
        if tag.is_some() {
            fields.insert("entity".to_string());
        }
        if !has_range || fields.len() < 2 || self.composite_indexes.contains(&fields) {
            return Ok(());
        }
        Err(StoreError::IndexRequired(format!(
            "create a composite index on ({})",
            fields.into_iter().collect::<Vec<_>>().join(", ")
        )))
    }

    fn matches(record: &Record, tag: Option<&str>, predicates: &[Predicate]) -> bool {
        tag.map_or(true, |t| record.entity == t)
            && predicates.iter().all(|p| record_matches(record, p))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, tag: &str, fields: FieldMap) -> Result<Record, StoreError> {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4().to_string(),
            entity: tag.to_string(),
            fields: sanitize_fields(fields),
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.push(record.clone());
        info!(id = %record.id, entity = %record.entity, "Created record");
        Ok(record)
    }

    async fn read(
        &self,
        tag: Option<&str>,
        predicates: &[Predicate],
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.check_index(tag, predicates)?;
        let records = self.records.read().await;
        let found: Vec<Record> = records
            .iter()
            .filter(|r| Self::matches(r, tag, predicates))
            .take(limit)
            .cloned()
            .collect();
        debug!(count = found.len(), "Read records");
        Ok(found)
    }

    async fn update(
        &self,
        tag: Option<&str>,
        predicates: &[Predicate],
        fields: FieldMap,
    ) -> Result<Option<Record>, StoreError> {
        self.check_index(tag, predicates)?;
        let mut records = self.records.write().await;
        let Some(record) = records
            .iter_mut()
            .find(|r| Self::matches(r, tag, predicates))
        else {
            return Ok(None);
        };

        for (key, value) in sanitize_fields(fields) {
            record.fields.insert(key, value);
        }
        record.updated_at = Utc::now();
        info!(id = %record.id, entity = %record.entity, "Updated record");
        Ok(Some(record.clone()))
    }

    async fn delete(
        &self,
        tag: Option<&str>,
        predicates: &[Predicate],
    ) -> Result<Option<Record>, StoreError> {
        self.check_index(tag, predicates)?;
        let mut records = self.records.write().await;
        let Some(position) = records
            .iter()
            .position(|r| Self::matches(r, tag, predicates))
        else {
            return Ok(None);
        };
        let removed = records.remove(position);
        info!(id = %removed.id, entity = %removed.entity, "Deleted record");
        Ok(Some(removed))
    }

    async fn count(&self, tag: Option<&str>, predicates: &[Predicate]) -> Result<u64, StoreError> {
        self.check_index(tag, predicates)?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| Self::matches(r, tag, predicates))
            .count() as u64)
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
