//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL holds the filter directives; invalid or missing directives fall
//!   back to `DEFAULT_FILTER` (runs and transport at debug, the rest at info).
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets, files and line numbers are always included. Tower HTTP's
//! TraceLayer adds the per-request spans on top of this.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,assessment=debug,modlrn_backend=debug,tower_http=info,axum=info";

#[derive(Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn build_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok();
    let format = std::env::var("LOG_FORMAT").ok();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level.as_deref()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two builders are different types, so init in each arm.
    match LogFormat::from_env_value(format.as_deref()) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
