//! Guidance texts for incomplete requests
//!
//! Shown when an instruction comes back with `insufficientInfo` and the
//! provider did not write its own `guidedResponse`.

use intent_types::{RoutingInstruction, Tool};

/// Used when neither the tool nor the action could be determined
pub const GENERIC_GUIDANCE: &str = "I'm unable to determine what you need. \
You can ask me about the current weather in a city, or to add, list, update, \
delete or count records (for example: \"Show me all products under 200\").";

/// Used when a weather request names no place
pub const WEATHER_LOCATION_GUIDANCE: &str =
    "Which city or location would you like the weather for?";

const DATABASE_GUIDANCE: &str = "Please tell me which records you mean and what to do with them, \
for example: \"Add a new product: Gaming Laptop, price: 1500\" or \
\"How many employees joined last month?\"";

/// Supplies the response text for a non-dispatchable instruction
pub trait GuidanceSource: Send + Sync {
    fn guidance(&self, instruction: &RoutingInstruction) -> String;
}

/// Built-in per-tool help text
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGuidance;

impl StaticGuidance {
    /// Help text for a tool
    pub fn for_tool(tool: Tool) -> &'static str {
        match tool {
            Tool::Weather => WEATHER_LOCATION_GUIDANCE,
            Tool::Database => DATABASE_GUIDANCE,
            Tool::None => GENERIC_GUIDANCE,
        }
    }
}

impl GuidanceSource for StaticGuidance {
    fn guidance(&self, instruction: &RoutingInstruction) -> String {
        match instruction.guided_response.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => Self::for_tool(instruction.tool).to_string(),
        }
    }
}
