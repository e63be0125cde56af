//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; those records are bridged into
//! the tracing subscriber installed here, next to the server's own events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use ct_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // `init` also installs the `log` bridge for the engine's records
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a lifecycle transition of a registration, round or match
///
/// # Arguments
///
/// * `entity` - Kind of entity (`registration`, `round`, `match`)
/// * `id` - Entity ID
/// * `to` - New state
/// * `actor` - Authenticated user that requested the transition
///
/// # Example
///
/// ```
/// use ct_server::logging::log_state_transition;
///
/// log_state_transition("round", 12, "active", Some(7));
/// ```
pub fn log_state_transition(entity: &str, id: i64, to: &str, actor: Option<i64>) {
    tracing::info!(
        entity = entity,
        entity_id = id,
        state = to,
        actor = actor,
        "State transition"
    );
}

/// Log performance metric
///
/// Operations slower than a second are logged as warnings.
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

/// Log API request/response
///
/// # Arguments
///
/// * `request_id` - Correlation ID from `x-request-id`
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    if status_code >= 500 {
        tracing::error!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}
