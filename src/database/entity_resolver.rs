//! Entity Resolver
//!
//! Canonicalizes a caller-facing entity noun ("employee", "Category") to the
//! plural lower-case tag records are stored under, and recognizes the fixed
//! vocabulary of wildcard tokens meaning "no entity scoping".

use once_cell::sync::Lazy;
use std::collections::HashSet;

static WILDCARD_TOKENS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "record",
        "records",
        "database",
        "databases",
        "all",
        "everything",
        "data",
    ]
    .into_iter()
    .collect()
});

/// Tag used in messages when no entity scoping applies
pub const UNSCOPED_LABEL: &str = "records";

/// Canonical plural tag for an entity noun; `None` for absent or blank input
pub fn normalize(entity: Option<&str>) -> Option<String> {
    let lowered = entity?.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if let Some(stem) = lowered.strip_suffix('y') {
        Some(format!("{}ies", stem))
    } else if lowered.ends_with('s') {
        Some(lowered)
    } else {
        Some(format!("{}s", lowered))
    }
}

/// True when the noun (raw or normalized) means "apply to every entity"
pub fn is_wildcard(entity: &str) -> bool {
    let lowered = entity.trim().to_lowercase();
    if WILDCARD_TOKENS.contains(lowered.as_str()) {
        return true;
    }
    normalize(Some(&lowered))
        .map(|tag| WILDCARD_TOKENS.contains(tag.as_str()))
        .unwrap_or(false)
}

/// Entity scope of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityScope {
    /// Restrict to one canonical tag
    Tagged(String),
    /// No entity predicate (absent entity or wildcard token)
    Unscoped,
}

impl EntityScope {
    /// Resolve a caller-supplied noun
    pub fn resolve(entity: Option<&str>) -> Self {
        match entity {
            Some(raw) if is_wildcard(raw) => EntityScope::Unscoped,
            other => match normalize(other) {
                Some(tag) => EntityScope::Tagged(tag),
                None => EntityScope::Unscoped,
            },
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            EntityScope::Tagged(tag) => Some(tag),
            EntityScope::Unscoped => None,
        }
    }

    /// Plural label for messages
    pub fn label(&self) -> &str {
        self.tag().unwrap_or(UNSCOPED_LABEL)
    }

    /// Singular label for messages
    pub fn singular_label(&self) -> String {
        singular(self.label())
    }
}

/// Best-effort singular of a canonical tag (`categories` → `category`)
pub fn singular(tag: &str) -> String {
    if let Some(stem) = tag.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = tag.strip_suffix('s') {
        stem.to_string()
    } else {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_rules() {
        assert_eq!(normalize(Some("Product")), Some("products".to_string()));
        assert_eq!(normalize(Some("  category ")), Some("categories".to_string()));
        assert_eq!(normalize(Some("employees")), Some("employees".to_string()));
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn test_wildcards() {
        assert!(is_wildcard("record"));
        assert!(is_wildcard("RECORDS"));
        assert!(is_wildcard(" Everything "));
        assert!(is_wildcard("Database"));
        assert!(is_wildcard("all"));
        assert!(!is_wildcard("employee"));
    }

    #[test]
    fn test_wildcard_matches_normalized_form() {
        // "datum" is not a token but neither is its plural; "database" pluralizes to a token
        assert!(!is_wildcard("datum"));
        assert!(is_wildcard("Databases"));
        assert!(is_wildcard("RECORD"));
    }

    #[test]
    fn test_scope_resolution() {
        assert_eq!(
            EntityScope::resolve(Some("employee")),
            EntityScope::Tagged("employees".to_string())
        );
        assert_eq!(EntityScope::resolve(Some("record")), EntityScope::Unscoped);
        assert_eq!(EntityScope::resolve(None), EntityScope::Unscoped);
        assert_eq!(EntityScope::resolve(Some("")), EntityScope::Unscoped);
        assert_eq!(EntityScope::Unscoped.label(), "records");
    }

    #[test]
    fn test_singular() {
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("products"), "product");
        assert_eq!(singular("staff"), "staff");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(entity in "[A-Za-z ]{1,16}") {
            let once = normalize(Some(&entity));
            let twice = normalize(once.as_deref());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn wildcard_detection_ignores_case(upper in proptest::bool::ANY, idx in 0usize..7) {
            let tokens = [
                "record",
                "records",
                "database",
                "databases",
                "all",
                "everything",
                "data",
            ];
            let token = if upper { tokens[idx].to_uppercase() } else { tokens[idx].to_string() };
            prop_assert!(is_wildcard(&token));
        }
    }
}
