//! Record Store Adapter
//!
//! Abstract create/read/update/delete/count over a single flat record
//! collection tagged by entity. `tag = None` means unscoped (every entity).
//! Update and delete act on the first record matching the predicates.

use async_trait::async_trait;
use intent_types::{FieldMap, FilterOp, Predicate, Record};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::StoreError;

/// Store adapter consumed by the operation dispatcher
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record under `tag`
    async fn create(&self, tag: &str, fields: FieldMap) -> Result<Record, StoreError>;

    /// Up to `limit` records matching every predicate
    async fn read(
        &self,
        tag: Option<&str>,
        predicates: &[Predicate],
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    /// Merge `fields` into the first matching record; `None` when nothing matches
    async fn update(
        &self,
        tag: Option<&str>,
        predicates: &[Predicate],
        fields: FieldMap,
    ) -> Result<Option<Record>, StoreError>;

    /// Permanently remove the first matching record; `None` when nothing matches
    async fn delete(
        &self,
        tag: Option<&str>,
        predicates: &[Predicate],
    ) -> Result<Option<Record>, StoreError>;

    /// Number of records matching every predicate
    async fn count(&self, tag: Option<&str>, predicates: &[Predicate]) -> Result<u64, StoreError>;

    /// Name for logging
    fn store_name(&self) -> &str;
}

/// Drop the fields a payload is not allowed to set
pub fn sanitize_fields(mut fields: FieldMap) -> FieldMap {
    for reserved in Record::RESERVED_FIELDS {
        fields.remove(reserved);
    }
    fields
}

/// Order two JSON values of the same kind; numbers compare numerically
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// True when `record` satisfies `predicate`
pub fn record_matches(record: &Record, predicate: &Predicate) -> bool {
    let actual = match predicate.field.as_str() {
        "id" => Value::String(record.id.clone()),
        "entity" => Value::String(record.entity.clone()),
        field => match record.get(field) {
            Some(value) => value.clone(),
            None => return false,
        },
    };

    match predicate.op {
        FilterOp::Eq => {
            actual == predicate.value
                || compare_values(&actual, &predicate.value) == Some(Ordering::Equal)
        }
        FilterOp::Gte => matches!(
            compare_values(&actual, &predicate.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lte => matches!(
            compare_values(&actual, &predicate.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        Record {
            id: "r1".to_string(),
            entity: "products".to_string(),
            fields: fields.as_object().cloned().unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_numeric_comparison_ignores_representation() {
        let r = record(json!({"price": 1500}));
        assert!(record_matches(&r, &Predicate::eq("price", json!(1500.0))));
        assert!(record_matches(
            &r,
            &Predicate::new("price", FilterOp::Gte, json!(100))
        ));
        assert!(!record_matches(
            &r,
            &Predicate::new("price", FilterOp::Lte, json!(100))
        ));
    }

    #[test]
    fn test_missing_field_and_mixed_types_never_match() {
        let r = record(json!({"price": "cheap"}));
        assert!(!record_matches(&r, &Predicate::eq("name", json!("x"))));
        assert!(!record_matches(
            &r,
            &Predicate::new("price", FilterOp::Gte, json!(1))
        ));
    }

    #[test]
    fn test_reserved_fields_match_and_are_sanitized() {
        let r = record(json!({}));
        assert!(record_matches(&r, &Predicate::eq("id", json!("r1"))));

        let cleaned = sanitize_fields(
            json!({"id": "x", "entity": "y", "createdAt": 1, "name": "ok"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(cleaned.len(), 1);
        assert!(cleaned.contains_key("name"));
    }
}
