//! Geocoding, weather and driving-route tools over the Amap web service API.
//!
//! Responses are handed back exactly as Amap sent them. Amap reports success
//! or failure in its own `status` field ("1" / "0"), so these tools do not
//! wrap anything in the task tools' envelope; transport failures become a
//! synthetic `{"status": "0", "info": ...}` record so callers can always
//! branch on `status`.

use anyhow::{Context, Result};
use errand_config::AmapConfig;
use errand_mcp::{ToolDescriptor, ToolRequest, ToolResponse, LIST_TOOLS};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::{info, warn};

pub type Query = Vec<(&'static str, String)>;

#[derive(Debug, Clone, Deserialize)]
pub struct Geocode {
    pub address: String,
    #[serde(default)]
    pub city: String,
}

impl Geocode {
    pub fn query(&self) -> Query {
        let mut q: Query = vec![("address", self.address.clone())];
        if !self.city.is_empty() {
            q.push(("city", self.city.clone()));
        }
        q
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Weather {
    pub city: String,
}

impl Weather {
    pub fn query(&self) -> Query {
        vec![("city", self.city.clone())]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrivingRoute {
    /// "longitude,latitude"
    pub origin: String,
    pub destination: String,
    /// "lng1,lat1;lng2,lat2"
    #[serde(default)]
    pub waypoints: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// "base" or "all"
    #[serde(default = "default_extensions")]
    pub extensions: String,
    #[serde(default)]
    pub avoid_road: String,
}

fn default_strategy() -> String { "0".into() }
fn default_extensions() -> String { "base".into() }

impl DrivingRoute {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            waypoints: String::new(),
            strategy: default_strategy(),
            extensions: default_extensions(),
            avoid_road: String::new(),
        }
    }

    pub fn query(&self) -> Query {
        let mut q: Query = vec![
            ("origin", self.origin.clone()),
            ("destination", self.destination.clone()),
            ("strategy", self.strategy.clone()),
            ("extensions", self.extensions.clone()),
        ];
        if !self.waypoints.is_empty() {
            q.push(("waypoints", self.waypoints.clone()));
        }
        if !self.avoid_road.is_empty() {
            q.push(("avoidroad", self.avoid_road.clone()));
        }
        q
    }
}

#[derive(Clone)]
pub struct AmapClient {
    http: Client,
    base: String,
    key: String,
}

impl AmapClient {
    pub fn new(base: &str, key: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("errand-mcp-amap/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().context("building HTTP client")?;
        Ok(Self { http, base: base.trim_end_matches('/').to_string(), key: key.to_string() })
    }

    pub fn from_config(cfg: &AmapConfig) -> Result<Self> {
        Self::new(&cfg.base_url, &cfg.api_key, cfg.timeout_secs.map(Duration::from_secs))
    }

    pub async fn geocode(&self, params: &Geocode) -> JsonValue {
        self.get("geocode/geo", params.query(), "geocode").await
    }

    pub async fn weather(&self, params: &Weather) -> JsonValue {
        self.get("weather/weatherInfo", params.query(), "weather").await
    }

    pub async fn driving_route(&self, params: &DrivingRoute) -> JsonValue {
        self.get("direction/driving", params.query(), "driving route").await
    }

    async fn get(&self, path: &str, mut query: Query, api: &str) -> JsonValue {
        query.push(("key", self.key.clone()));
        query.push(("output", "json".into()));
        match self.fetch(path, &query).await {
            Ok(data) => {
                info!(api, status = ?data.get("status"), "amap call finished");
                data
            }
            Err(e) => {
                warn!(api, error = %e, "amap call failed");
                json!({"status": "0", "info": format!("{:#}", e)})
            }
        }
    }

    async fn fetch(&self, path: &str, query: &Query) -> Result<JsonValue> {
        let url = format!("{}/{}", self.base, path);
        let resp = self.http.get(&url).query(query).send().await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).context("decoding amap response")
    }

    /// Routes one protocol request; known tools always answer `ok: true`.
    pub async fn call(&self, req: ToolRequest) -> ToolResponse {
        let res: Result<JsonValue> = match req.tool.as_str() {
            "geocode" => match req.decode::<Geocode>() {
                Ok(p) => Ok(self.geocode(&p).await),
                Err(e) => Err(e),
            },
            "get_weather" => match req.decode::<Weather>() {
                Ok(p) => Ok(self.weather(&p).await),
                Err(e) => Err(e),
            },
            "plan_driving_route" => match req.decode::<DrivingRoute>() {
                Ok(p) => Ok(self.driving_route(&p).await),
                Err(e) => Err(e),
            },
            LIST_TOOLS => Ok(errand_mcp::list_tools(&tool_descriptors())),
            _ => Err(anyhow::anyhow!("unknown tool")),
        };
        res.into()
    }
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "geocode",
            description: "Convert an address to geographic coordinates.",
            params_schema: json!({
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "Structured address"},
                    "city": {"type": "string", "description": "City name, pinyin, citycode or adcode"}
                },
                "required": ["address"]
            }),
        },
        ToolDescriptor {
            name: "get_weather",
            description: "Get live weather for a city.",
            params_schema: json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City adcode"}
                },
                "required": ["city"]
            }),
        },
        ToolDescriptor {
            name: "plan_driving_route",
            description: "Plan a driving route between two points, including distance, time and route segments.",
            params_schema: json!({
                "type": "object",
                "properties": {
                    "origin": {"type": "string", "description": "Start as \"longitude,latitude\", e.g. \"116.481028,39.989643\""},
                    "destination": {"type": "string", "description": "End as \"longitude,latitude\", e.g. \"116.434446,39.90816\""},
                    "waypoints": {"type": "string", "description": "\"lng1,lat1;lng2,lat2\""},
                    "strategy": {"type": "string", "description": "Route strategy, \"0\" is speed first", "default": "0"},
                    "extensions": {"type": "string", "enum": ["base", "all"], "default": "base"},
                    "avoid_road": {"type": "string", "description": "Road name to avoid"}
                },
                "required": ["origin", "destination"]
            }),
        },
    ]
}
