use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fields::{ControlType, FormField};

/// The mock data record: a flat mapping of human-meaningful keys to scalar
/// values, loaded once at startup and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockData(pub BTreeMap<String, Value>);

impl MockData {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::StartupError(format!("cannot read data file {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::StartupError(format!("data file is not valid JSON: {e}")))?;
        let Value::Object(map) = value else {
            return Err(Error::StartupError(
                "data file must be a JSON object of field keys to scalar values".into(),
            ));
        };
        let mut out = BTreeMap::new();
        for (key, val) in map {
            match val {
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    out.insert(key, val);
                }
                _ => {
                    return Err(Error::StartupError(format!(
                        "data file key {key:?} holds a non-scalar value"
                    )));
                }
            }
        }
        Ok(Self(out))
    }
}

/// Mapping from a field's selector to the scalar value to enter. Map
/// semantics guarantee at most one value per field; fields the model left
/// out are simply absent.
pub type ResolvedValues = BTreeMap<String, Value>;

/// Chooses a value for each form field from the mock data record.
#[async_trait]
pub trait ValueResolver {
    async fn resolve(&self, fields: &[FormField], data: &MockData) -> Result<ResolvedValues>;
}

// ── Chat-completions backend ────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Resolver backed by an OpenAI-compatible chat-completions endpoint.
/// One request covers every field; there is no retry policy, a failed or
/// unparseable call aborts the run.
pub struct ChatResolver {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatResolver {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::StartupError(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ValueResolver for ChatResolver {
    async fn resolve(&self, fields: &[FormField], data: &MockData) -> Result<ResolvedValues> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "You fill web forms. Respond with ONLY valid JSON, no explanation."
                        .into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: build_prompt(fields, data),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ResolutionError(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ResolutionError(format!(
                "completion endpoint returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ResolutionError(format!("unreadable completion reply: {e}")))?;
        let content = reply
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::ResolutionError("completion reply has no choices".into()))?;

        parse_resolved(content)
    }
}

/// Build the single prompt embedding every field description and the mock
/// data record.
fn build_prompt(fields: &[FormField], data: &MockData) -> String {
    let mut field_lines = String::new();
    for field in fields {
        field_lines.push_str(&format!(
            "- selector: {} | type: {} | label: {:?}",
            field.selector,
            control_name(field.control),
            field.label,
        ));
        if !field.placeholder.is_empty() {
            field_lines.push_str(&format!(" | placeholder: {:?}", field.placeholder));
        }
        if !field.options.is_empty() {
            let options = field
                .options
                .iter()
                .map(|o| format!("{:?} (value {:?})", o.text, o.value))
                .collect::<Vec<_>>()
                .join(", ");
            field_lines.push_str(&format!(" | options: {options}"));
        }
        field_lines.push('\n');
    }

    let data_json =
        serde_json::to_string_pretty(&data.0).unwrap_or_else(|_| "{}".into());

    format!(
        r#"Given these form fields:
{field_lines}
Choose the correct value for each field from this mock data:
{data_json}

Respond with ONLY a JSON object mapping each field selector to the value to
enter. Use true or false for checkboxes. For select and radio fields, answer
with the visible text of the option to pick. Use "SKIP" for any field with no
matching data."#
    )
}

fn control_name(control: ControlType) -> &'static str {
    match control {
        ControlType::Text => "text",
        ControlType::Email => "email",
        ControlType::Number => "number",
        ControlType::Checkbox => "checkbox",
        ControlType::Radio => "radio",
        ControlType::Select => "select",
    }
}

/// Parse the model's reply into the resolved-value map. Anything that is
/// not a JSON object (after unwrapping an optional Markdown fence) is a
/// resolution error. Null values, "SKIP" markers and nested structures are
/// dropped; unknown selectors are kept and discarded by the filler.
fn parse_resolved(content: &str) -> Result<ResolvedValues> {
    let text = strip_code_fence(content);
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::ResolutionError(format!("model reply is not valid JSON: {e}")))?;
    let Value::Object(map) = value else {
        return Err(Error::ResolutionError(
            "model reply is not a JSON object".into(),
        ));
    };

    let mut out = ResolvedValues::new();
    for (key, val) in map {
        let skip = match &val {
            Value::Null => true,
            Value::String(s) => s.eq_ignore_ascii_case("skip"),
            _ => false,
        };
        if skip {
            continue;
        }
        if matches!(val, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            out.insert(key, val);
        }
    }
    Ok(out)
}

fn strip_code_fence(s: &str) -> &str {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
    }
    s
}
