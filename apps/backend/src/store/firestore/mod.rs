//! Firestore backend over the v1 REST API.

pub mod value;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::{generate_document_id, Direction, Document, DocumentStore, Fields, Query, StoreError};
use crate::google::{ServiceAccount, ServiceAccountError};

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

impl From<ServiceAccountError> for StoreError {
    fn from(err: ServiceAccountError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl WireDocument {
    fn into_document(self) -> Document {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Document {
            id,
            fields: value::decode_fields(&self.fields),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    #[serde(default)]
    document: Option<WireDocument>,
}

/// Firestore `(default)` database of one project, authenticated with a
/// service account.
pub struct FirestoreStore {
    http: reqwest::Client,
    account: ServiceAccount,
    documents_root: String,
}

impl FirestoreStore {
    pub fn new(http: reqwest::Client, account: ServiceAccount, project_id: &str) -> Self {
        Self {
            http,
            account,
            documents_root: format!("projects/{project_id}/databases/(default)/documents"),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{FIRESTORE_API}/{}", self.documents_root)
        } else {
            format!("{FIRESTORE_API}/{}/{path}", self.documents_root)
        }
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_root)
    }

    async fn token(&self) -> Result<String, StoreError> {
        Ok(self.account.access_token(&self.http, DATASTORE_SCOPE).await?)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let token = self.token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "firestore request rejected");
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Split `receipts/abc/items` into (`receipts/abc`, `items`).
fn split_collection(collection: &str) -> (&str, &str) {
    match collection.rsplit_once('/') {
        Some((parent, id)) => (parent, id),
        None => ("", collection),
    }
}

fn structured_query(collection_id: &str, query: &Query) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": collection_id }],
        "where": {
            "fieldFilter": {
                "field": { "fieldPath": query.field },
                "op": "EQUAL",
                "value": value::encode_value(&query.equals),
            }
        }
    });

    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": field },
            "direction": direction,
        }]);
    }

    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend(&self) -> &'static str {
        "firestore"
    }

    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        server_timestamp: Option<&str>,
    ) -> Result<String, StoreError> {
        let id = generate_document_id();
        let mut write = json!({
            "update": {
                "name": self.document_name(collection, &id),
                "fields": value::encode_fields(&fields),
            },
            "currentDocument": { "exists": false },
        });
        if let Some(field) = server_timestamp {
            write["updateTransforms"] = json!([{
                "fieldPath": field,
                "setToServerValue": "REQUEST_TIME",
            }]);
        }

        let url = format!("{FIRESTORE_API}/{}:commit", self.documents_root);
        let response = self
            .send(self.http.post(url).json(&json!({ "writes": [write] })))
            .await?;
        Self::expect_success(response).await?;

        debug!(collection, id = %id, "firestore document created");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let response = self
            .send(self.http.get(self.url(&format!("{collection}/{id}"))))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response).await?;
        let doc: WireDocument = Self::decode(response).await?;
        Ok(Some(doc.into_document()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.url(collection))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = Self::expect_success(self.send(request).await?).await?;
            let page: ListPage = Self::decode(response).await?;
            documents.extend(page.documents.into_iter().map(WireDocument::into_document));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let (parent, collection_id) = split_collection(collection);
        let url = format!("{}:runQuery", self.url(parent));

        let response = self
            .send(
                self.http
                    .post(url)
                    .json(&structured_query(collection_id, query)),
            )
            .await?;
        let response = Self::expect_success(response).await?;
        let entries: Vec<RunQueryEntry> = Self::decode(response).await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.document)
            .map(WireDocument::into_document)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_collections_split_at_last_segment() {
        assert_eq!(split_collection("receipts"), ("", "receipts"));
        assert_eq!(split_collection("receipts/abc/items"), ("receipts/abc", "items"));
    }

    #[test]
    fn owner_query_is_filtered_and_ordered() {
        let query = Query::where_eq("user_sub", "u1").order_by("created_at", Direction::Descending);
        let body = structured_query("receipts", &query);

        let sq = &body["structuredQuery"];
        assert_eq!(sq["from"][0]["collectionId"], "receipts");
        assert_eq!(sq["where"]["fieldFilter"]["field"]["fieldPath"], "user_sub");
        assert_eq!(sq["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(
            sq["where"]["fieldFilter"]["value"],
            json!({ "stringValue": "u1" })
        );
        assert_eq!(sq["orderBy"][0]["direction"], "DESCENDING");
    }

    #[test]
    fn wire_document_id_is_last_path_segment() {
        let doc = WireDocument {
            name: "projects/p/databases/(default)/documents/receipts/abc123".to_string(),
            fields: json!({ "total": { "doubleValue": 4.5 } })
                .as_object()
                .cloned()
                .unwrap(),
        };

        let doc = doc.into_document();
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.fields["total"], 4.5);
    }

    #[test]
    fn run_query_entries_without_documents_are_skipped() {
        let raw = json!([
            { "readTime": "2025-01-01T00:00:00Z" },
            { "document": { "name": "x/receipts/r1", "fields": {} } }
        ]);
        let entries: Vec<RunQueryEntry> = serde_json::from_value(raw).unwrap();
        let docs: Vec<_> = entries.into_iter().filter_map(|e| e.document).collect();
        assert_eq!(docs.len(), 1);
    }
}
