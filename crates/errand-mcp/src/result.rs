use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// Uniform `{success, payload | error}` envelope returned by envelope-style tools.
///
/// Fields are private so the two invariants hold for every value:
/// a success never carries an error and a failure never carries a payload.
/// On the wire the payload's entries sit next to `success`, and unset
/// `error`/`detail` keys are left out entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    success: bool,
    payload: Option<Map<String, JsonValue>>,
    error: Option<String>,
    detail: Option<String>,
}

impl ToolResult {
    pub fn ok(payload: Map<String, JsonValue>) -> Self {
        Self { success: true, payload: Some(payload), error: None, detail: None }
    }

    /// Success with a single payload entry, e.g. `{"task": {...}}`.
    pub fn ok_with(key: impl Into<String>, value: JsonValue) -> Self {
        let mut payload = Map::new();
        payload.insert(key.into(), value);
        Self::ok(payload)
    }

    /// Short failure with no diagnostic trace.
    pub fn fail(error: impl Into<String>) -> Self {
        Self { success: false, payload: None, error: Some(error.into()), detail: None }
    }

    /// Failure caused by an error raised while talking to the backend.
    /// `detail` carries the full error chain prefixed with `context`.
    pub fn fault(error: &anyhow::Error, context: &str) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(format!("{:#}", error)),
            detail: Some(format!("{}: {:#}\n{:?}", context, error, error)),
        }
    }

    pub fn is_success(&self) -> bool { self.success }
    pub fn payload(&self) -> Option<&Map<String, JsonValue>> { self.payload.as_ref() }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn detail(&self) -> Option<&str> { self.detail.as_deref() }

    pub fn to_json(&self) -> JsonValue {
        let mut out = Map::new();
        out.insert("success".into(), JsonValue::Bool(self.success));
        if let Some(payload) = &self.payload {
            for (k, v) in payload {
                out.insert(k.clone(), v.clone());
            }
        }
        if let Some(error) = &self.error {
            out.insert("error".into(), JsonValue::String(error.clone()));
        }
        if let Some(detail) = &self.detail {
            out.insert("detail".into(), JsonValue::String(detail.clone()));
        }
        JsonValue::Object(out)
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<ToolResult> for JsonValue {
    fn from(result: ToolResult) -> Self { result.to_json() }
}
