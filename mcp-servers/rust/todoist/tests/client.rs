use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use mcp_todoist::client::TodoistClient;
use mcp_todoist::{AddTask, CompleteTask, GetTasks, TodoistTools};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Seen {
    bodies: Arc<Mutex<Vec<JsonValue>>>,
    auth: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

async fn create_task(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<JsonValue>) -> Json<JsonValue> {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
    seen.auth.lock().unwrap().push(auth);
    seen.bodies.lock().unwrap().push(body.clone());
    Json(json!({
        "id": "2995104339",
        "content": body["content"],
        "description": "",
        "priority": body.get("priority").cloned().unwrap_or(json!(1)),
        "project_id": "220474322",
        "due": null,
        "url": "https://todoist.com/showTask?id=2995104339"
    }))
}

/// Cursor-style page, the shape newer API versions return.
async fn list_tasks(Query(q): Query<HashMap<String, String>>) -> Json<JsonValue> {
    let project = q.get("project_id").cloned().unwrap_or_else(|| "220474322".into());
    Json(json!({
        "results": [
            {"id": "1", "content": "Buy milk", "project_id": project, "priority": 1, "description": "", "due": {"date": "2026-10-19", "string": "tomorrow"}},
            {"id": "2", "content": "Pay rent", "project_id": project, "priority": 4, "description": "", "due": null}
        ],
        "next_cursor": null
    }))
}

async fn update_task(State(seen): State<Seen>, Path(id): Path<String>) -> Json<JsonValue> {
    seen.calls.lock().unwrap().push(format!("update {}", id));
    Json(json!({"id": id, "content": "updated"}))
}

async fn close_task(State(seen): State<Seen>, Path(id): Path<String>) -> (StatusCode, &'static str) {
    seen.calls.lock().unwrap().push(format!("close {}", id));
    match id.as_str() {
        "missing" => (StatusCode::NOT_FOUND, "Task not found"),
        "flaky" => (StatusCode::INTERNAL_SERVER_ERROR, "db down"),
        "revoked" => (StatusCode::UNAUTHORIZED, "Forbidden"),
        _ => (StatusCode::NO_CONTENT, ""),
    }
}

async fn list_projects() -> Json<JsonValue> {
    Json(json!([{"id": "220474322", "name": "Inbox", "color": "grey", "is_favorite": false, "order": 0}]))
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn todoist() -> (TodoistTools, Seen) {
    let seen = Seen::default();
    let router = Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/:id", post(update_task))
        .route("/tasks/:id/close", post(close_task))
        .route("/projects", get(list_projects))
        .with_state(seen.clone());
    let base = spawn(router).await;
    let client = TodoistClient::new(&base, "secret-token", None).unwrap();
    (TodoistTools::new(Arc::new(client)), seen)
}

#[tokio::test]
async fn add_task_sends_only_set_fields_with_bearer_token() {
    let (tools, seen) = todoist().await;
    let mut params = AddTask::new("Buy milk");
    params.priority = Some(0);

    let res = tools.add_task(params).await.to_json();

    assert_eq!(seen.bodies.lock().unwrap().as_slice(), [json!({"content": "Buy milk"})]);
    assert_eq!(seen.auth.lock().unwrap().as_slice(), ["Bearer secret-token".to_string()]);
    assert_eq!(
        res,
        json!({"success": true, "task": {"id": "2995104339", "content": "Buy milk", "description": "", "priority": 1, "project_id": "220474322", "due": null}})
    );
}

#[tokio::test]
async fn cursor_page_is_unwrapped() {
    let (tools, _) = todoist().await;
    let res = tools.get_tasks(GetTasks { project_id: Some("99".into()) }).await.to_json();
    let tasks = res["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["due"], "tomorrow");
    assert_eq!(tasks[0]["project_id"], "99");
    assert_eq!(tasks[1]["due"], JsonValue::Null);
}

#[tokio::test]
async fn close_status_maps_to_refusal() {
    let (tools, _) = todoist().await;
    let done = tools.complete_task(CompleteTask { task_id: "2995104339".into() }).await;
    assert!(done.is_success());

    let refused = tools.complete_task(CompleteTask { task_id: "missing".into() }).await;
    assert_eq!(refused.error(), Some("Unable to complete task"));
    assert!(refused.detail().is_none());
}

#[tokio::test]
async fn projects_round_trip() {
    let (tools, _) = todoist().await;
    let res = tools.get_projects().await.to_json();
    assert_eq!(res, json!({"success": true, "projects": [{"id": "220474322", "name": "Inbox", "color": "grey", "is_favorite": false}]}));
}

#[tokio::test]
async fn unreachable_backend_becomes_fault() {
    let client = TodoistClient::new("http://127.0.0.1:1", "secret-token", None).unwrap();
    let tools = TodoistTools::new(Arc::new(client));
    let res = tools.get_tasks(GetTasks::default()).await;
    assert!(!res.is_success());
    assert!(res.detail().is_some());

    let res = tools.complete_task(CompleteTask { task_id: "1".into() }).await;
    assert!(!res.is_success());
    assert_ne!(res.error(), Some("Unable to complete task"));
    assert!(res.detail().is_some());
}

#[tokio::test]
async fn task_ids_are_sent_as_a_single_path_segment() {
    let (tools, seen) = todoist().await;
    for id in ["42#x", "42?a=", "7/close"] {
        let res = tools.complete_task(CompleteTask { task_id: id.into() }).await;
        assert!(res.is_success(), "completing {:?}", id);
    }
    assert_eq!(
        seen.calls.lock().unwrap().as_slice(),
        ["close 42#x".to_string(), "close 42?a=".to_string(), "close 7/close".to_string()]
    );
}

#[tokio::test]
async fn blank_task_id_is_rejected_before_any_request() {
    let (tools, seen) = todoist().await;
    for id in ["", "  ", ".."] {
        let res = tools.complete_task(CompleteTask { task_id: id.into() }).await;
        assert!(!res.is_success());
        assert!(res.detail().is_none());
    }
    assert!(seen.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn close_server_errors_are_faults_not_refusals() {
    let (tools, _) = todoist().await;

    let res = tools.complete_task(CompleteTask { task_id: "flaky".into() }).await;
    assert!(!res.is_success());
    assert_ne!(res.error(), Some("Unable to complete task"));
    let detail = res.detail().unwrap();
    assert!(detail.contains("500"), "{}", detail);
    assert!(detail.contains("db down"), "{}", detail);

    let res = tools.complete_task(CompleteTask { task_id: "revoked".into() }).await;
    assert!(res.error().unwrap().contains("401"));
    assert!(res.detail().is_some());
}
