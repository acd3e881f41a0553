//! Shared helpers for the backend's unit and integration tests: one-time
//! logging setup, unique identities and response-shape assertions.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
