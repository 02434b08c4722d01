//! Agent output extraction
//!
//! A finished execution hands back its output in one of several shapes
//! depending on how the upstream model step was configured. Each shape is
//! classified once into [`OutputShape`] and then unpacked into an
//! [`ItineraryPayload`].

use serde_json::{Map, Value};

use crate::FoodieTourError;
use crate::models::ItineraryPayload;

/// The shapes an execution's output can take
#[derive(Debug, Clone, PartialEq)]
pub enum OutputShape<'a> {
    /// Role-tagged chat messages, the assistant's reply holds the JSON text
    Messages(&'a [Value]),
    /// The itinerary object itself
    Direct(&'a Map<String, Value>),
    /// OpenAI-style completion with a `choices` array
    Choices(&'a Map<String, Value>),
    /// JSON text
    Text(&'a str),
    /// Anything else
    Unrecognized(&'a Value),
}

impl<'a> OutputShape<'a> {
    #[must_use]
    pub fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::Array(messages) => OutputShape::Messages(messages),
            Value::Object(map) if map.contains_key("dining") => OutputShape::Direct(map),
            Value::Object(map) if map.contains_key("choices") => OutputShape::Choices(map),
            Value::String(text) => OutputShape::Text(text),
            other => OutputShape::Unrecognized(other),
        }
    }
}

/// Turns raw execution output into a validated itinerary payload.
///
/// Every failure is a [`FoodieTourError::Parse`] carrying the raw output.
pub fn parse_output(raw: &Value) -> Result<ItineraryPayload, FoodieTourError> {
    let fail = |message: String| FoodieTourError::parse(message, raw_text(raw));

    let value = match OutputShape::classify(raw) {
        OutputShape::Messages(messages) => {
            let content = assistant_content(messages).map_err(fail)?;
            parse_json_text(content).map_err(fail)?
        }
        OutputShape::Direct(map) => Value::Object(map.clone()),
        OutputShape::Choices(map) => {
            let content = choice_content(map).map_err(fail)?;
            parse_json_text(content).map_err(fail)?
        }
        OutputShape::Text(text) => parse_json_text(text).map_err(fail)?,
        OutputShape::Unrecognized(Value::Object(_)) => {
            return Err(fail("Unexpected dict structure".to_string()));
        }
        OutputShape::Unrecognized(other) => {
            return Err(fail(format!("Unrecognized type: {}", type_name(other))));
        }
    };

    serde_json::from_value(value).map_err(|e| fail(format!("Invalid itinerary: {e}")))
}

fn assistant_content(messages: &[Value]) -> Result<&str, String> {
    let message = messages
        .iter()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("assistant"))
        .ok_or_else(|| "No assistant message found".to_string())?;

    message
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| "Assistant message has no text content".to_string())
}

fn choice_content(map: &Map<String, Value>) -> Result<&str, String> {
    let choice = map
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| "No choices in completion".to_string())?;

    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| "Choice has no message content".to_string())
}

/// Parses model text as JSON, tolerating code fences and chatter around the object.
fn parse_json_text(text: &str) -> Result<Value, String> {
    let trimmed = strip_code_fence(text.trim());
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(first_err) => outermost_object(trimmed)
            .and_then(|candidate| serde_json::from_str(candidate).ok())
            .ok_or_else(|| format!("Invalid JSON: {first_err}")),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
