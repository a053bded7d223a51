use errand_mcp::{ToolDescriptor, ToolRequest, ToolResponse, ToolResult, LIST_TOOLS};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{error, info};

pub mod client;
pub mod normalize;

use client::{NewTask, TaskBackend, TodoistClient};

pub const NOT_INITIALIZED: &str = "Todoist API not initialized";

// --- Tool parameters ---

#[derive(Debug, Clone, Deserialize)]
pub struct AddTask {
    pub content: String,
    #[serde(default)]
    pub description: String,
    /// Natural language due date, e.g. "tomorrow at 3pm".
    #[serde(default)]
    pub due_string: String,
    #[serde(default)]
    pub project_id: Option<String>,
    /// 1..=4, 4 is highest. Anything else is dropped, not rejected.
    #[serde(default = "default_priority")]
    pub priority: Option<i64>,
}

fn default_priority() -> Option<i64> { Some(1) }

impl AddTask {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), description: String::new(), due_string: String::new(), project_id: None, priority: default_priority() }
    }

    /// Backend parameter set: `content` always, the rest only when set.
    pub fn task_args(&self) -> NewTask {
        NewTask {
            content: self.content.clone(),
            description: non_empty(&self.description),
            due_string: non_empty(&self.due_string),
            project_id: self.project_id.as_deref().and_then(non_empty),
            priority: self.priority.filter(|p| (1..=4).contains(p)).map(|p| p as u8),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetTasks {
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteTask {
    pub task_id: String,
}

// --- Tools ---

/// Task and project tools over one shared backend handle.
///
/// Built without a backend when no token is configured; every tool then
/// answers with [`NOT_INITIALIZED`] and makes no call.
#[derive(Clone)]
pub struct TodoistTools {
    backend: Option<Arc<dyn TaskBackend>>,
}

impl TodoistTools {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self { Self { backend: Some(backend) } }

    pub fn uninitialized() -> Self { Self { backend: None } }

    pub fn from_config(cfg: &errand_config::TodoistConfig) -> Self {
        match TodoistClient::from_config(cfg) {
            Ok(Some(client)) => {
                info!(base = %cfg.base_url, "Todoist API initialized");
                Self::new(Arc::new(client))
            }
            Ok(None) => {
                error!("Todoist API token not found; set TODOIST_API_TOKEN or todoist.api_token");
                Self::uninitialized()
            }
            Err(e) => {
                error!(error = %e, "Todoist client setup failed");
                Self::uninitialized()
            }
        }
    }

    pub fn is_initialized(&self) -> bool { self.backend.is_some() }

    pub async fn add_task(&self, params: AddTask) -> ToolResult {
        let Some(api) = &self.backend else { return ToolResult::fail(NOT_INITIALIZED) };
        if params.content.trim().is_empty() {
            return ToolResult::fail("Task content must not be empty");
        }
        let args = params.task_args();
        info!(?args, "adding task");
        match api.add_task(&args).await {
            Ok(task) => {
                info!(content = %params.content, "task added");
                ToolResult::ok_with("task", normalize::normalize_task(&task))
            }
            Err(e) => {
                error!(error = ?e, "error adding task");
                ToolResult::fault(&e, "Error adding task")
            }
        }
    }

    pub async fn get_tasks(&self, params: GetTasks) -> ToolResult {
        let Some(api) = &self.backend else { return ToolResult::fail(NOT_INITIALIZED) };
        let project_id = params.project_id.as_deref().filter(|p| !p.is_empty());
        match api.get_tasks(project_id).await {
            Ok(raw) => {
                let tasks = normalize::normalize_tasks(raw);
                info!(count = tasks.len(), "tasks retrieved");
                ToolResult::ok_with("tasks", JsonValue::Array(tasks))
            }
            Err(e) => {
                error!(error = ?e, "error getting tasks");
                ToolResult::fault(&e, "Error getting tasks")
            }
        }
    }

    /// A `false` from the backend is a refusal and carries no `detail`;
    /// an error while asking does.
    pub async fn complete_task(&self, params: CompleteTask) -> ToolResult {
        let Some(api) = &self.backend else { return ToolResult::fail(NOT_INITIALIZED) };
        match params.task_id.trim() {
            "" => return ToolResult::fail("Task id must not be empty"),
            "." | ".." => return ToolResult::fail(format!("Invalid task id: {}", params.task_id)),
            _ => {}
        }
        match api.complete_task(&params.task_id).await {
            Ok(true) => {
                info!(task_id = %params.task_id, "task completed");
                ToolResult::ok_with("message", json!(format!("Task {} has been marked as completed", params.task_id)))
            }
            Ok(false) => {
                error!(task_id = %params.task_id, "unable to complete task");
                ToolResult::fail("Unable to complete task")
            }
            Err(e) => {
                error!(error = ?e, "error completing task");
                ToolResult::fault(&e, "Error completing task")
            }
        }
    }

    /// Failures here carry only `error`, never `detail`.
    pub async fn get_projects(&self) -> ToolResult {
        let Some(api) = &self.backend else { return ToolResult::fail(NOT_INITIALIZED) };
        let res = async {
            let projects = api.get_projects().await?;
            projects.iter().map(normalize::normalize_project).collect::<anyhow::Result<Vec<_>>>()
        }
        .await;
        match res {
            Ok(projects) => {
                info!(count = projects.len(), "projects retrieved");
                ToolResult::ok_with("projects", JsonValue::Array(projects))
            }
            Err(e) => {
                error!(error = %e, "error getting projects");
                ToolResult::fail(format!("{:#}", e))
            }
        }
    }

    /// Routes one protocol request. Only protocol problems (unknown tool,
    /// undecodable params) come back as `ok: false`.
    pub async fn call(&self, req: ToolRequest) -> ToolResponse {
        let res: anyhow::Result<JsonValue> = match req.tool.as_str() {
            "add_task" => match req.decode::<AddTask>() {
                Ok(p) => Ok(self.add_task(p).await.into()),
                Err(e) => Err(e),
            },
            "get_tasks" => match req.decode::<GetTasks>() {
                Ok(p) => Ok(self.get_tasks(p).await.into()),
                Err(e) => Err(e),
            },
            "complete_task" => match req.decode::<CompleteTask>() {
                Ok(p) => Ok(self.complete_task(p).await.into()),
                Err(e) => Err(e),
            },
            "get_projects" => Ok(self.get_projects().await.into()),
            LIST_TOOLS => Ok(errand_mcp::list_tools(&tool_descriptors())),
            _ => Err(anyhow::anyhow!("unknown tool")),
        };
        res.into()
    }
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "add_task",
            description: "Add a new task to Todoist. Returns the created task.",
            params_schema: json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string", "description": "Task content"},
                    "description": {"type": "string", "description": "Task description"},
                    "due_string": {"type": "string", "description": "Due date in natural language, e.g. \"tomorrow at 3pm\", \"next Monday\""},
                    "project_id": {"type": "string", "description": "Project ID (optional)"},
                    "priority": {"type": "integer", "description": "Priority 1-4, 4 is highest", "default": 1}
                },
                "required": ["content"]
            }),
        },
        ToolDescriptor {
            name: "get_tasks",
            description: "List Todoist tasks, optionally limited to one project.",
            params_schema: json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string", "description": "Project ID; all tasks when omitted"}
                }
            }),
        },
        ToolDescriptor {
            name: "complete_task",
            description: "Mark a Todoist task as completed.",
            params_schema: json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "ID of the task to complete"}
                },
                "required": ["task_id"]
            }),
        },
        ToolDescriptor {
            name: "get_projects",
            description: "List Todoist projects.",
            params_schema: json!({"type": "object", "properties": {}}),
        },
    ]
}
