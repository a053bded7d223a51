use serde::{Deserialize, Serialize};
use std::{env, fs, io, path::PathBuf};

pub const DEFAULT_TODOIST_BASE: &str = "https://api.todoist.com/rest/v2";
pub const DEFAULT_AMAP_BASE: &str = "https://restapi.amap.com/v3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoistConfig {
    /// Bearer token. Leaving it unset disables the task tools.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_todoist_base")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self { api_token: None, base_url: default_todoist_base(), timeout_secs: None }
    }
}

impl TodoistConfig {
    /// Token if one is configured and not blank.
    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmapConfig {
    /// Sent as-is; an empty key surfaces as a backend authentication failure.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_amap_base")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AmapConfig {
    fn default() -> Self {
        Self { api_key: String::new(), base_url: default_amap_base(), timeout_secs: None }
    }
}

fn default_todoist_base() -> String { DEFAULT_TODOIST_BASE.to_string() }
fn default_amap_base() -> String { DEFAULT_AMAP_BASE.to_string() }

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub todoist: TodoistConfig,
    #[serde(default)]
    pub amap: AmapConfig,
}

impl Config {
    /// Loads `ERRAND_CONFIG` (or `config/errand.toml`) and applies env overrides.
    ///
    /// A missing file is not an error: defaults plus environment are enough to
    /// run. Returns the path that was actually read, if any.
    pub fn load() -> anyhow::Result<(Self, Option<PathBuf>)> {
        let cfg_path = env::var("ERRAND_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/errand.toml"));
        let (mut cfg, read_from) = match fs::read_to_string(&cfg_path) {
            Ok(text) => (Self::from_toml_str(&text)?, Some(cfg_path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (Config::default(), None),
            Err(e) => return Err(e.into()),
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        Ok((cfg, read_from))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Env overrides: TODOIST_API_TOKEN, TODOIST_BASE_URL, AMAP_API_KEY, AMAP_BASE_URL.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("TODOIST_API_TOKEN") {
            self.todoist.api_token = Some(token);
        }
        if let Some(base) = lookup("TODOIST_BASE_URL") {
            self.todoist.base_url = base;
        }
        if let Some(key) = lookup("AMAP_API_KEY") {
            self.amap.api_key = key;
        }
        if let Some(base) = lookup("AMAP_BASE_URL") {
            self.amap.base_url = base;
        }
    }
}
