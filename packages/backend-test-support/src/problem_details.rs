//! Assertions for the two error shapes the API emits: RFC 7807 problem
//! documents and in-band `{"status": "error"}` replies.

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use actix_web::http::StatusCode;
use actix_web::test;
use serde::Deserialize;
use serde_json::Value;

/// Mirror of the backend's problem document, kept independent of its types.
#[derive(Debug, Deserialize)]
pub struct ProblemDetailsLike {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

/// Check status, content type, the trace header/body parity and the
/// `WWW-Authenticate` challenge on 401s; returns the parsed document.
pub async fn assert_problem_details(
    resp: ServiceResponse<BoxBody>,
    expected_status: StatusCode,
    expected_code: &str,
    expected_detail_contains: Option<&str>,
) -> ProblemDetailsLike {
    assert_eq!(resp.status(), expected_status);

    let headers = resp.headers().clone();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("application/problem+json"),
        "Content-Type must be application/problem+json (got {content_type})"
    );

    let challenge = headers.get(WWW_AUTHENTICATE);
    if expected_status == StatusCode::UNAUTHORIZED {
        assert_eq!(
            challenge.and_then(|v| v.to_str().ok()),
            Some("Bearer"),
            "401 responses must carry WWW-Authenticate: Bearer"
        );
    } else {
        assert!(challenge.is_none(), "{expected_status} must not challenge");
    }

    let trace_header = headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-trace-id header should be present")
        .to_string();

    let bytes = test::read_body(resp).await;
    let problem: ProblemDetailsLike = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        panic!(
            "body should be a problem document: {}",
            String::from_utf8_lossy(&bytes)
        )
    });

    assert_eq!(problem.code, expected_code);
    assert_eq!(problem.status, expected_status.as_u16());
    assert_eq!(problem.trace_id, trace_header, "trace_id must match x-trace-id");
    assert!(problem.type_.ends_with(expected_code));
    if let Some(expected) = expected_detail_contains {
        assert!(
            problem.detail.contains(expected),
            "expected detail to contain '{expected}', got '{}'",
            problem.detail
        );
    }
    problem
}

/// Check for an HTTP 200 `{"status": "error", "message": ...}` reply and
/// return the message.
pub async fn assert_error_reply(resp: ServiceResponse<BoxBody>, message_contains: &str) -> String {
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = test::read_body(resp).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        panic!("body should be JSON: {}", String::from_utf8_lossy(&bytes))
    });

    assert_eq!(body["status"], "error", "unexpected body {body}");
    let message = body["message"]
        .as_str()
        .expect("error reply should carry a message")
        .to_string();
    assert!(
        message.contains(message_contains),
        "expected message to contain '{message_contains}', got '{message}'"
    );
    message
}
