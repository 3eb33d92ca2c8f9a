//! Instruction Extractor
//!
//! Recovers a `RoutingInstruction` from free-form completion text and decides
//! whether it is complete enough to drive side effects.
//!
//! Two failure tiers:
//! - output with no JSON object, or an unparseable one, is an `ExtractError`
//! - a parseable but incomplete instruction comes back with
//!   `insufficient_info = true` and guidance; it is never dispatched

use intent_types::{FieldMap, InstructionParameters, RoutingInstruction, Tool};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::guidance::{GENERIC_GUIDANCE, WEATHER_LOCATION_GUIDANCE};
use crate::error::ExtractError;

/// Markdown code fence marker, language tag optional
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*").expect("valid fence regex"));

/// Extract and validate an instruction from raw completion text
pub fn extract(raw: &str) -> Result<RoutingInstruction, ExtractError> {
    let span = json_span(raw).ok_or(ExtractError::InvalidResponseFormat)?;

    let value: Value = serde_json::from_str(&span).map_err(|e| {
        warn!(error = %e, "Completion contained malformed JSON");
        ExtractError::MalformedInstruction {
            message: e.to_string(),
        }
    })?;
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(ExtractError::MalformedInstruction {
                message: format!("expected a JSON object, got {}", json_type(&other)),
            })
        }
    };

    let instruction = validate(read_instruction(&object));
    debug!(
        tool = %instruction.tool,
        action = %instruction.action,
        insufficient_info = instruction.insufficient_info,
        "Extracted instruction"
    );
    Ok(instruction)
}

/// Greedy `{ ... }` span once fence markers are removed
fn json_span(raw: &str) -> Option<String> {
    let text = CODE_FENCE.replace_all(raw, "");
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].to_string())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn map_field(object: &Map<String, Value>, key: &str) -> FieldMap {
    object
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Lenient read: wrong-typed fields fall back to their defaults
fn read_instruction(object: &Map<String, Value>) -> RoutingInstruction {
    let parameters = object
        .get("parameters")
        .and_then(Value::as_object)
        .map(|p| InstructionParameters {
            location: string_field(p, "location").or_else(|| string_field(p, "city")),
            entity: string_field(p, "entity"),
            filters: map_field(p, "filters"),
            data: map_field(p, "data"),
        })
        .unwrap_or_default();

    RoutingInstruction {
        intent: string_field(object, "intent"),
        tool: object
            .get("tool")
            .and_then(Value::as_str)
            .map(Tool::from_name)
            .unwrap_or_default(),
        action: string_field(object, "action").unwrap_or_default(),
        parameters,
        insufficient_info: object.get("insufficientInfo") == Some(&Value::Bool(true)),
        missing_info: string_field(object, "missingInfo"),
        guided_response: string_field(object, "guidedResponse"),
    }
}

fn validate(mut instruction: RoutingInstruction) -> RoutingInstruction {
    if instruction.insufficient_info {
        return instruction;
    }

    if instruction.tool == Tool::None {
        return mark_insufficient(instruction, "tool", GENERIC_GUIDANCE);
    }
    if instruction.action.is_empty() {
        return mark_insufficient(instruction, "action", GENERIC_GUIDANCE);
    }

    match instruction.tool {
        Tool::Weather if instruction.parameters.location.is_none() => {
            mark_insufficient(instruction, "location", WEATHER_LOCATION_GUIDANCE)
        }
        Tool::Database => {
            // location only means something for weather
            instruction.parameters.location = None;
            instruction
        }
        _ => instruction,
    }
}

fn mark_insufficient(
    mut instruction: RoutingInstruction,
    missing: &str,
    guidance: &str,
) -> RoutingInstruction {
    instruction.insufficient_info = true;
    instruction.missing_info = Some(missing.to_string());
    instruction.guided_response = Some(guidance.to_string());
    instruction
}
