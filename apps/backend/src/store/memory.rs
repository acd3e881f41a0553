use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use time::macros::format_description;
use time::OffsetDateTime;

use super::{generate_document_id, Direction, Document, DocumentStore, Fields, Query, StoreError};

/// Process-local document store. Documents live until the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    rejected: Mutex<HashSet<String>>,
    unreadable: Mutex<HashSet<String>>,
}

/// Fixed-width UTC timestamp so string order matches time order.
fn now_timestamp() -> String {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Last path segment of a collection path (`receipts/abc/items` → `items`).
fn collection_id(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write into collections named `collection_id` fail, to
    /// exercise partial-write behaviour.
    pub fn reject_writes_to(&self, collection_id: &str) {
        self.rejected.lock().insert(collection_id.to_string());
    }

    /// Make every read from collections named `collection_id` fail.
    pub fn reject_reads_from(&self, collection_id: &str) {
        self.unreadable.lock().insert(collection_id.to_string());
    }

    fn check_readable(&self, collection: &str) -> Result<(), StoreError> {
        if self.unreadable.lock().contains(collection_id(collection)) {
            return Err(StoreError::Rejected {
                status: 503,
                body: format!("reads from {collection} are rejected"),
            });
        }
        Ok(())
    }

    /// Insert a document with explicit fields, bypassing id generation and
    /// timestamps. Used to seed documents in older shapes.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.to_string(),
                fields,
            });
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(
        &self,
        collection: &str,
        mut fields: Fields,
        server_timestamp: Option<&str>,
    ) -> Result<String, StoreError> {
        if self.rejected.lock().contains(collection_id(collection)) {
            return Err(StoreError::Rejected {
                status: 503,
                body: format!("writes to {collection} are rejected"),
            });
        }

        if let Some(field) = server_timestamp {
            fields.insert(field.to_string(), Value::String(now_timestamp()));
        }

        let id = generate_document_id();
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_readable(collection)?;
        Ok(self
            .collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.check_readable(collection)?;
        Ok(self
            .collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut matches: Vec<Document> = self
            .list(collection)
            .await?
            .into_iter()
            .filter(|doc| doc.fields.get(&query.field) == Some(&query.equals))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            match direction {
                Direction::Ascending => matches.sort_by(|a, b| {
                    compare_values(a.fields.get(field), b.fields.get(field))
                }),
                Direction::Descending => {
                    // Later inserts first among equal keys.
                    matches.reverse();
                    matches.sort_by(|a, b| {
                        compare_values(b.fields.get(field), a.fields.get(field))
                    });
                }
            }
        }

        Ok(matches)
    }
}
