//! Intent Types - Foundation Types (No Workspace Dependencies)
//!
//! Pure data structures shared by every layer of the router:
//! - `RoutingInstruction`: the structured operation recovered from model output
//! - `Record`: a persisted entity instance
//! - `Predicate`: one `(field, operator, value)` filter condition
//!
//! ## Rules
//!
//! 1. **NO BUSINESS LOGIC** - validation, normalization and matching live in `intent-router`
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - wire names follow the camelCase instruction format

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordered field-name → value mapping used for filters, payloads and record fields
pub type FieldMap = serde_json::Map<String, Value>;

// ============================================================================
// ROUTING INSTRUCTION
// ============================================================================

/// External capability domain an instruction targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Weather,
    Database,
    #[default]
    None,
}

impl Tool {
    /// Parse a provider-supplied tool name; anything unrecognised is `None`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "weather" => Tool::Weather,
            "database" => Tool::Database,
            _ => Tool::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Weather => "weather",
            Tool::Database => "database",
            Tool::None => "none",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters block of a routing instruction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionParameters {
    /// Weather location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Entity noun; `None` means no entity scoping
    #[serde(default)]
    pub entity: Option<String>,
    /// Filter bag, in provider order
    #[serde(default)]
    pub filters: FieldMap,
    /// Create/update payload, in provider order
    #[serde(default)]
    pub data: FieldMap,
}

/// Structured operation produced by the router and consumed by the dispatcher
///
/// Once `insufficient_info` is false, `tool` is `Weather` or `Database` and
/// `action` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingInstruction {
    /// Advisory description of what the user wants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default)]
    pub tool: Tool,
    /// Free-form verb, normalized by the dispatcher
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub parameters: InstructionParameters,
    #[serde(default)]
    pub insufficient_info: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guided_response: Option<String>,
}

impl RoutingInstruction {
    /// An instruction that must not be dispatched
    pub fn insufficient(tool: Tool, missing_info: impl Into<String>) -> Self {
        Self {
            tool,
            insufficient_info: true,
            missing_info: Some(missing_info.into()),
            ..Default::default()
        }
    }

    /// Attach a guidance message
    pub fn with_guidance(mut self, guided_response: impl Into<String>) -> Self {
        self.guided_response = Some(guided_response.into());
        self
    }

    /// True when the instruction may drive side effects
    pub fn is_dispatchable(&self) -> bool {
        !self.insufficient_info && self.tool != Tool::None && !self.action.trim().is_empty()
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A persisted entity instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Store-assigned, stable for the record's lifetime
    pub id: String,
    /// Canonical plural lower-case tag, immutable after creation
    pub entity: String,
    /// Free-form fields
    #[serde(flatten)]
    pub fields: FieldMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Field names the store owns; payloads cannot set them
    pub const RESERVED_FIELDS: [&'static str; 4] = ["id", "entity", "createdAt", "updatedAt"];

    /// Get a free-form field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Comparison operator understood by every store adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `(field, operator, value)` filter condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}
