//! FilterSpec Translator
//!
//! Turns the flat filter bag of a routing instruction into an ordered list of
//! typed predicates. Never fails: keys it does not recognise become equality
//! predicates.
//!
//! Translation rules, per key in mapping order:
//! - `entity` is skipped (entity scoping is the resolver's job)
//! - a date-relative sentinel (`joinedLastMonth`) becomes `joinDate >= now - 1 month`
//! - a key containing `min` / `max` becomes a `>=` / `<=` range on the remaining name
//! - anything else is an equality

use chrono::{DateTime, Months, SecondsFormat, Utc};
use intent_types::{FieldMap, FilterOp, Predicate};
use serde::Deserialize;
use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::debug;

use super::entity_resolver;

/// Key that never becomes a predicate
const ENTITY_KEY: &str = "entity";

/// Direction of a range bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Min,
    Max,
}

/// Typed filter value produced by the translator
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Eq(Value),
    Range(RangeBound, Value),
    /// `field >= now - months`
    DateRelative { months: u32 },
}

/// One translated filter, before resolution against a clock
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub value: FilterValue,
}

impl FilterClause {
    /// Resolve to a store predicate at instant `now`
    pub fn to_predicate(&self, now: DateTime<Utc>) -> Predicate {
        match &self.value {
            FilterValue::Eq(v) => Predicate::new(&self.field, FilterOp::Eq, v.clone()),
            FilterValue::Range(RangeBound::Min, v) => {
                Predicate::new(&self.field, FilterOp::Gte, v.clone())
            }
            FilterValue::Range(RangeBound::Max, v) => {
                Predicate::new(&self.field, FilterOp::Lte, v.clone())
            }
            FilterValue::DateRelative { months } => {
                let since = now.checked_sub_months(Months::new(*months)).unwrap_or(now);
                Predicate::new(
                    &self.field,
                    FilterOp::Gte,
                    Value::String(since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                )
            }
        }
    }
}

/// Date-relative sentinel definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateRelativeRule {
    pub field: String,
    pub months: u32,
}

/// Filter-key vocabulary for range and date special-casing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterVocabulary {
    pub min_marker: String,
    pub max_marker: String,
    /// Sentinel key → date rule
    pub date_relative: HashMap<String, DateRelativeRule>,
    /// Entity tag → (filter key or derived field → stored field)
    pub entity_overrides: HashMap<String, HashMap<String, String>>,
}

impl Default for FilterVocabulary {
    fn default() -> Self {
        let mut date_relative = HashMap::new();
        date_relative.insert(
            "joinedLastMonth".to_string(),
            DateRelativeRule {
                field: "joinDate".to_string(),
                months: 1,
            },
        );
        Self {
            min_marker: "min".to_string(),
            max_marker: "max".to_string(),
            date_relative,
            entity_overrides: HashMap::new(),
        }
    }
}

/// Filter translator over a vocabulary
#[derive(Debug, Clone, Default)]
pub struct FilterTranslator {
    vocabulary: FilterVocabulary,
}

impl FilterTranslator {
    pub fn new(vocabulary: FilterVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Translate to predicates resolved against the current time
    pub fn translate(&self, entity: Option<&str>, filters: &FieldMap) -> Vec<Predicate> {
        self.translate_at(entity, filters, Utc::now())
    }

    /// Translate to predicates resolved against `now`
    pub fn translate_at(
        &self,
        entity: Option<&str>,
        filters: &FieldMap,
        now: DateTime<Utc>,
    ) -> Vec<Predicate> {
        self.clauses(entity, filters)
            .iter()
            .map(|clause| clause.to_predicate(now))
            .collect()
    }

    /// Translate to typed clauses, in mapping order
    pub fn clauses(&self, entity: Option<&str>, filters: &FieldMap) -> Vec<FilterClause> {
        let overrides = entity_resolver::normalize(entity)
            .and_then(|tag| self.vocabulary.entity_overrides.get(&tag));

        filters
            .iter()
            .filter(|(key, _)| !key.eq_ignore_ascii_case(ENTITY_KEY))
            .map(|(key, value)| {
                let mut clause = self.clause_for(key, value);
                let renamed = overrides.and_then(|o| o.get(key).or_else(|| o.get(&clause.field)));
                if let Some(renamed) = renamed {
                    clause.field = renamed.clone();
                }
                debug!(key = %key, field = %clause.field, "Translated filter key");
                clause
            })
            .collect()
    }

    fn clause_for(&self, key: &str, value: &Value) -> FilterClause {
        if let Some(rule) = self.vocabulary.date_relative.get(key) {
            return FilterClause {
                field: rule.field.clone(),
                value: FilterValue::DateRelative {
                    months: rule.months,
                },
            };
        }

        let bounds = [
            (self.vocabulary.min_marker.as_str(), RangeBound::Min),
            (self.vocabulary.max_marker.as_str(), RangeBound::Max),
        ];
        for (marker, bound) in bounds {
            if let Some(field) = strip_marker(key, marker) {
                return FilterClause {
                    field,
                    value: FilterValue::Range(bound, numeric_bound(value)),
                };
            }
        }

        FilterClause {
            field: key.to_string(),
            value: FilterValue::Eq(value.clone()),
        }
    }
}

/// Remove the first case-insensitive occurrence of `marker` and clean up the rest
///
/// `minPrice` → `price`, `salary_max` → `salary`. Returns `None` when the key
/// does not contain the marker or nothing usable remains.
fn strip_marker(key: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    let position = key
        .to_ascii_lowercase()
        .find(&marker.to_ascii_lowercase())?;
    let remainder = format!("{}{}", &key[..position], &key[position + marker.len()..]);
    let trimmed = remainder.trim_matches(|c: char| c == '_' || c == '-' || c.is_whitespace());

    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Range bounds compare numerically; coerce numeric strings
fn numeric_bound(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::Number(i.into())
            } else if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
                Value::Number(n)
            } else {
                value.clone()
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn map(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_min_price_becomes_gte() {
        let translator = FilterTranslator::default();
        let predicates = translator.translate(Some("products"), &map(json!({"minPrice": 100})));
        assert_eq!(predicates, vec![Predicate::new("price", FilterOp::Gte, json!(100))]);
    }

    #[test]
    fn test_max_suffix_and_numeric_string() {
        let translator = FilterTranslator::default();
        let predicates = translator.translate(None, &map(json!({"salary_max": "5000.5"})));
        assert_eq!(
            predicates,
            vec![Predicate::new("salary", FilterOp::Lte, json!(5000.5))]
        );
    }

    #[test]
    fn test_joined_last_month_ignores_value() {
        let translator = FilterTranslator::default();
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let predicates =
            translator.translate_at(Some("employee"), &map(json!({"joinedLastMonth": false})), now);
        // Calendar month arithmetic clamps to the end of February
        assert_eq!(
            predicates,
            vec![Predicate::new(
                "joinDate",
                FilterOp::Gte,
                json!("2024-02-29T12:00:00Z")
            )]
        );
    }

    #[test]
    fn test_entity_key_excluded_and_order_kept() {
        let translator = FilterTranslator::default();
        let predicates = translator.translate(
            Some("employees"),
            &map(json!({"department": "Sales", "entity": "employee", "minAge": 30})),
        );
        assert_eq!(
            predicates,
            vec![
                Predicate::eq("department", json!("Sales")),
                Predicate::new("age", FilterOp::Gte, json!(30)),
            ]
        );
    }

    #[test]
    fn test_entity_specific_override() {
        let mut vocabulary = FilterVocabulary::default();
        vocabulary.entity_overrides.insert(
            "products".to_string(),
            HashMap::from([("cost".to_string(), "price".to_string())]),
        );
        let translator = FilterTranslator::new(vocabulary);

        let predicates = translator.translate(
            Some("product"),
            &map(json!({"cost": 10, "maxCost": 20})),
        );
        assert_eq!(
            predicates,
            vec![
                Predicate::eq("price", json!(10)),
                Predicate::new("price", FilterOp::Lte, json!(20)),
            ]
        );

        // Other entities are unaffected
        let predicates = translator.translate(Some("orders"), &map(json!({"cost": 10})));
        assert_eq!(predicates, vec![Predicate::eq("cost", json!(10))]);
    }

    #[test]
    fn test_bare_marker_degrades_to_equality() {
        let translator = FilterTranslator::default();
        let clauses = translator.clauses(None, &map(json!({"max": 3})));
        assert_eq!(
            clauses,
            vec![FilterClause {
                field: "max".to_string(),
                value: FilterValue::Eq(json!(3)),
            }]
        );
    }

    proptest! {
        #[test]
        fn predicate_count_matches_key_count(
            keys in proptest::collection::btree_set("[a-zA-Z]{1,10}", 0..8),
            with_entity in proptest::bool::ANY,
        ) {
            let mut filters = FieldMap::new();
            for key in &keys {
                if !key.eq_ignore_ascii_case("entity") {
                    filters.insert(key.clone(), json!(1));
                }
            }
            let expected = filters.len();
            if with_entity {
                filters.insert("entity".to_string(), json!("products"));
            }

            let translator = FilterTranslator::default();
            prop_assert_eq!(translator.translate(None, &filters).len(), expected);
        }
    }
}
