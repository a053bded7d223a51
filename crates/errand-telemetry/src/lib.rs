use tracing_subscriber::{fmt, EnvFilter};

/// Set to `1` (or `json`) for one JSON object per log line.
pub const LOG_JSON_ENV: &str = "ERRAND_LOG_JSON";

fn wants_json(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1" | "json" | "true"))
}

/// Installs the global subscriber for a tool server.
///
/// Stdout belongs to the tool protocol, so log lines always go to stderr.
/// Targets are left off: each server binary logs from its own crate, so the
/// target repeats on every line without telling the reader anything.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);
    if wants_json(std::env::var(LOG_JSON_ENV).ok().as_deref()) {
        fmt.json().init();
    } else {
        fmt.init();
    }
}
