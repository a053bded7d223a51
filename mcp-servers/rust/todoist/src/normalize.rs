//! Backend task/project objects → stable tool payloads.

use anyhow::{anyhow, Result};
use serde_json::{Map, Value as JsonValue};

/// Task fields copied when the backend object carries them. `due` is handled
/// separately because it is always present in the output.
const TASK_FIELDS: [&str; 5] = ["id", "content", "description", "priority", "project_id"];

const PROJECT_FIELDS: [&str; 4] = ["id", "name", "color", "is_favorite"];

/// Shape of a raw "list tasks" result.
///
/// Depending on API version and pagination mode the backend hands back either
/// the tasks directly or a single page wrapped in an outer list.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskListShape {
    Empty,
    Nested(Vec<JsonValue>),
    Flat(Vec<JsonValue>),
}

impl TaskListShape {
    /// Classifies by the first element only.
    pub fn detect(raw: Vec<JsonValue>) -> Self {
        match raw.first() {
            None => TaskListShape::Empty,
            Some(JsonValue::Array(_)) => match raw.into_iter().next() {
                Some(JsonValue::Array(inner)) => TaskListShape::Nested(inner),
                _ => TaskListShape::Empty,
            },
            Some(_) => TaskListShape::Flat(raw),
        }
    }

    pub fn into_tasks(self) -> Vec<JsonValue> {
        match self {
            TaskListShape::Empty => Vec::new(),
            TaskListShape::Nested(tasks) | TaskListShape::Flat(tasks) => tasks,
        }
    }
}

/// Copies the known task fields that are present and always sets `due`.
/// Never fails: a field the backend left out is simply not in the output.
pub fn normalize_task(task: &JsonValue) -> JsonValue {
    let mut out = Map::new();
    for field in TASK_FIELDS {
        if let Some(v) = task.get(field) {
            out.insert(field.to_string(), v.clone());
        }
    }
    out.insert("due".into(), due_text(task.get("due")));
    JsonValue::Object(out)
}

pub fn normalize_tasks(raw: Vec<JsonValue>) -> Vec<JsonValue> {
    TaskListShape::detect(raw).into_tasks().iter().map(normalize_task).collect()
}

/// Human-readable due text: the due object's `string` when it has one,
/// otherwise the due value rendered as text; `null` when there is no due.
fn due_text(due: Option<&JsonValue>) -> JsonValue {
    match due {
        None | Some(JsonValue::Null) => JsonValue::Null,
        Some(due) => match due.get("string") {
            Some(JsonValue::String(s)) => JsonValue::String(s.clone()),
            Some(JsonValue::Null) => JsonValue::Null,
            Some(other) => JsonValue::String(render(other)),
            None => JsonValue::String(render(due)),
        },
    }
}

fn render(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Projects always carry all four fields; a missing one is an error.
pub fn normalize_project(project: &JsonValue) -> Result<JsonValue> {
    let mut out = Map::new();
    for field in PROJECT_FIELDS {
        let v = project
            .get(field)
            .ok_or_else(|| anyhow!("project object is missing required field `{}`", field))?;
        out.insert(field.to_string(), v.clone());
    }
    Ok(JsonValue::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn t(id: &str) -> JsonValue {
        json!({"id": id, "content": format!("task {}", id), "priority": 1, "project_id": "p1", "description": "", "due": null})
    }

    #[test]
    fn detect_empty() {
        assert_eq!(TaskListShape::detect(vec![]), TaskListShape::Empty);
    }

    #[test]
    fn detect_nested_takes_first_inner_list() {
        let shape = TaskListShape::detect(vec![json!([t("1"), t("2")])]);
        assert_eq!(shape, TaskListShape::Nested(vec![t("1"), t("2")]));
    }

    #[test]
    fn detect_flat() {
        let shape = TaskListShape::detect(vec![t("1"), t("2")]);
        assert_eq!(shape, TaskListShape::Flat(vec![t("1"), t("2")]));
    }

    #[test]
    fn nested_and_flat_normalize_identically() {
        let nested = normalize_tasks(vec![json!([t("1"), t("2")])]);
        let flat = normalize_tasks(vec![t("1"), t("2")]);
        assert_eq!(nested, flat);
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn nested_empty_page_is_empty() {
        assert!(normalize_tasks(vec![json!([])]).is_empty());
    }

    #[test]
    fn missing_fields_are_absent_not_null() {
        let v = normalize_task(&json!({"id": "7", "content": "Buy milk"}));
        assert_eq!(v, json!({"id": "7", "content": "Buy milk", "due": null}));
        assert!(v.get("description").is_none());
    }

    #[test]
    fn due_prefers_human_string() {
        let v = normalize_task(&json!({"id": "1", "content": "x", "due": {"date": "2026-10-19", "string": "tomorrow"}}));
        assert_eq!(v["due"], "tomorrow");
    }

    #[test]
    fn due_without_string_is_rendered() {
        let v = normalize_task(&json!({"id": "1", "content": "x", "due": {"date": "2026-10-19"}}));
        assert_eq!(v["due"], r#"{"date":"2026-10-19"}"#);
        let v = normalize_task(&json!({"id": "1", "content": "x", "due": "2026-10-19"}));
        assert_eq!(v["due"], "2026-10-19");
    }

    #[test]
    fn due_with_null_string_is_null() {
        let v = normalize_task(&json!({"id": "1", "content": "x", "due": {"date": "2026-10-19", "string": null}}));
        assert_eq!(v["due"], JsonValue::Null);
    }

    #[test]
    fn project_requires_all_fields() {
        let ok = normalize_project(&json!({"id": "p1", "name": "Inbox", "color": "grey", "is_favorite": false, "order": 0})).unwrap();
        assert_eq!(ok, json!({"id": "p1", "name": "Inbox", "color": "grey", "is_favorite": false}));

        let err = normalize_project(&json!({"id": "p1", "name": "Inbox", "is_favorite": false})).unwrap_err();
        assert!(err.to_string().contains("`color`"));
    }
}
