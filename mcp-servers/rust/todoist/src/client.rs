use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use errand_config::TodoistConfig;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Parameter set for a new task. Unset fields are left out of the request
/// body entirely; the backend never sees an empty string or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewTask {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

/// The task-management backend as the tools see it.
///
/// Tasks and projects come back as raw JSON objects: the tools only ever ask
/// whether a field is there and copy it.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn add_task(&self, task: &NewTask) -> Result<JsonValue>;
    /// Either a flat list of tasks or a list holding one page of tasks.
    async fn get_tasks(&self, project_id: Option<&str>) -> Result<Vec<JsonValue>>;
    async fn complete_task(&self, task_id: &str) -> Result<bool>;
    async fn get_projects(&self) -> Result<Vec<JsonValue>>;
}

#[derive(Clone)]
pub struct TodoistClient {
    http: Client,
    base: Url,
    token: String,
}

impl TodoistClient {
    pub fn new(base: &str, token: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("errand-mcp-todoist/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().context("building HTTP client")?;
        let base = Url::parse(base).with_context(|| format!("invalid Todoist base URL `{}`", base))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("invalid Todoist base URL `{}`", base));
        }
        Ok(Self { http, base, token: token.to_string() })
    }

    /// `None` when no token is configured.
    pub fn from_config(cfg: &TodoistConfig) -> Result<Option<Self>> {
        match cfg.token() {
            Some(token) => Self::new(&cfg.base_url, token, cfg.timeout_secs.map(Duration::from_secs)).map(Some),
            None => Ok(None),
        }
    }

    /// Base URL plus `segments`, each pushed as one percent-encoded path
    /// segment so caller ids cannot add a query, fragment or extra level.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn http_error(what: &str, resp: Response) -> anyhow::Error {
        let status = resp.status();
        let snip = resp.text().await.unwrap_or_default();
        let mut preview = snip.trim().to_string();
        if preview.len() > 200 {
            let cut = (0..=200).rev().find(|i| preview.is_char_boundary(*i)).unwrap_or(0);
            preview.truncate(cut);
            preview.push('…');
        }
        anyhow!("Todoist {} failed: HTTP {} body: {}", what, status, preview)
    }

    async fn json_body(what: &str, resp: Response) -> Result<JsonValue> {
        if !resp.status().is_success() {
            return Err(Self::http_error(what, resp).await);
        }
        resp.json::<JsonValue>().await.with_context(|| format!("decoding Todoist {} response", what))
    }
}

/// Plain arrays come back element by element; a cursor page
/// (`{"results": [...]}`) comes back as one nested list.
fn listing(body: JsonValue) -> Result<Vec<JsonValue>> {
    match body {
        JsonValue::Array(items) => Ok(items),
        JsonValue::Object(mut obj) => match obj.remove("results") {
            Some(page @ JsonValue::Array(_)) => Ok(vec![page]),
            _ => Err(anyhow!("unexpected listing shape: object without `results` array")),
        },
        other => Err(anyhow!("unexpected listing shape: {}", other)),
    }
}

/// Same as [`listing`] but with pages already opened up.
fn flat_listing(body: JsonValue) -> Result<Vec<JsonValue>> {
    Ok(listing(body)?
        .into_iter()
        .flat_map(|item| match item {
            JsonValue::Array(inner) => inner,
            other => vec![other],
        })
        .collect())
}

#[async_trait]
impl TaskBackend for TodoistClient {
    async fn add_task(&self, task: &NewTask) -> Result<JsonValue> {
        let resp = self.http.post(self.url(&["tasks"])).bearer_auth(&self.token).json(task).send().await?;
        Self::json_body("add task", resp).await
    }

    async fn get_tasks(&self, project_id: Option<&str>) -> Result<Vec<JsonValue>> {
        let mut req = self.http.get(self.url(&["tasks"])).bearer_auth(&self.token);
        if let Some(pid) = project_id {
            req = req.query(&[("project_id", pid)]);
        }
        let body = Self::json_body("list tasks", req.send().await?).await?;
        listing(body)
    }

    /// 2xx closes the task. 404 is the backend declining (no such open
    /// task); every other status is an error carrying status and body.
    async fn complete_task(&self, task_id: &str) -> Result<bool> {
        let resp = self
            .http
            .post(self.url(&["tasks", task_id, "close"]))
            .bearer_auth(&self.token)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::http_error("close task", resp).await),
        }
    }

    async fn get_projects(&self) -> Result<Vec<JsonValue>> {
        let resp = self.http.get(self.url(&["projects"])).bearer_auth(&self.token).send().await?;
        flat_listing(Self::json_body("list projects", resp).await?)
    }
}
