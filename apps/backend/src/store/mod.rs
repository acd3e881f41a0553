//! Document store abstraction.
//!
//! Collections are addressed by slash-separated paths (`receipts`,
//! `receipts/{id}/items`) and documents carry plain JSON fields. The
//! production backend is Firestore; an in-memory backend serves local runs
//! and tests.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::AppError;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unavailable(String),
    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected store response: {0}")]
    Decode(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::storage(err.to_string())
    }
}

/// A stored document: its id within the collection and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter on one field, optionally ordered by another.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub field: String,
    pub equals: Value,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn where_eq(field: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
            order_by: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }
}

/// Minimal document-store surface the receipt repository needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend(&self) -> &'static str;

    /// Create a document with a store-generated id. When `server_timestamp`
    /// names a field, the store sets it to its own commit time.
    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        server_timestamp: Option<&str>,
    ) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Every document of a collection, in store order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
}

const AUTO_ID_LEN: usize = 20;

/// Firestore-style 20-character alphanumeric document id.
pub fn generate_document_id() -> String {
    use rand::distr::Alphanumeric;
    use rand::Rng;

    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}
