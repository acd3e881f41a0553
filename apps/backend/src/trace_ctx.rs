//! Task-local trace id for the request currently being served.
//!
//! `RequestTrace` opens the scope; error rendering reads it so the
//! `trace_id` in a Problem Details body matches the `x-trace-id` header.

use tokio::task_local;

const UNKNOWN: &str = "unknown";

task_local! {
    static TRACE_ID: String;
}

/// Trace id of the current task, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| UNKNOWN.to_string())
}

/// Run `future` with `trace_id` visible to [`trace_id`].
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
