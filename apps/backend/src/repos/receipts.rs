//! Per-user receipt repository.
//!
//! Every record written here is tagged with the owner's subject id and every
//! read filters on it. A receipt owned by someone else is reported exactly
//! like a missing one.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::domain::{normalize, Item, RawRecord, Receipt};
use crate::error::AppError;
use crate::store::{Direction, Document, DocumentStore, Fields, Query};

pub const RECEIPTS: &str = "receipts";
pub const ITEMS: &str = "items";
pub const OWNER_FIELD: &str = "user_sub";
pub const CREATED_AT_FIELD: &str = "created_at";

fn items_collection(receipt_id: &str) -> String {
    format!("{RECEIPTS}/{receipt_id}/{ITEMS}")
}

/// Receipt ids are store-generated; anything outside `[A-Za-z0-9_-]` can
/// only be a crafted path segment.
fn is_receipt_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn receipt_fields(receipt: &Receipt, owner: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(OWNER_FIELD.to_string(), json!(owner));
    fields.insert(
        "type_of_purchase".to_string(),
        json!(receipt.type_of_purchase.as_str()),
    );
    fields.insert(
        "establishment_name".to_string(),
        json!(receipt.establishment_name),
    );
    fields.insert("date".to_string(), json!(receipt.date));
    fields.insert("total".to_string(), json!(receipt.total));
    fields
}

fn item_fields(item: &Item) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), json!(item.name));
    fields.insert("price".to_string(), json!(item.price));
    fields.insert("quantity".to_string(), json!(item.quantity));
    fields
}

#[derive(Clone)]
pub struct ReceiptRepo {
    store: Arc<dyn DocumentStore>,
}

impl ReceiptRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Normalize `raw` and store it for `owner`, then store its items.
    ///
    /// The receipt and its items are separate writes. If an item write fails
    /// the receipt document stays behind without the remaining items.
    pub async fn save(&self, raw: &RawRecord, owner: &str) -> Result<String, AppError> {
        let receipt = normalize(raw);

        let id = self
            .store
            .insert(
                RECEIPTS,
                receipt_fields(&receipt, owner),
                Some(CREATED_AT_FIELD),
            )
            .await?;

        let items_path = items_collection(&id);
        for (written, item) in receipt.items.iter().enumerate() {
            if let Err(e) = self.store.insert(&items_path, item_fields(item), None).await {
                warn!(
                    receipt_id = %id,
                    written,
                    total_items = receipt.items.len(),
                    error = %e,
                    "item write failed after receipt was stored"
                );
                return Err(e.into());
            }
        }

        info!(receipt_id = %id, items = receipt.items.len(), "receipt saved");
        Ok(id)
    }

    /// The owner's receipts, newest first, with items attached.
    pub async fn list(&self, owner: &str) -> Result<Vec<Receipt>, AppError> {
        let query = Query::where_eq(OWNER_FIELD, owner)
            .order_by(CREATED_AT_FIELD, Direction::Descending);
        let documents = self.store.query(RECEIPTS, &query).await?;

        let mut receipts = Vec::with_capacity(documents.len());
        for document in documents {
            receipts.push(self.hydrate(document).await?);
        }

        debug!(count = receipts.len(), "listed receipts");
        Ok(receipts)
    }

    /// Load one receipt for `owner`. Missing and foreign receipts are both
    /// `NotFound`.
    pub async fn get_for_wallet(&self, id: &str, owner: &str) -> Result<Receipt, AppError> {
        if !is_receipt_id(id) {
            return Err(AppError::receipt_not_found());
        }

        let document = self
            .store
            .get(RECEIPTS, id)
            .await?
            .ok_or_else(AppError::receipt_not_found)?;

        let owned = document.fields.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner);
        if !owned {
            debug!(receipt_id = %id, "receipt not owned by caller");
            return Err(AppError::receipt_not_found());
        }

        self.hydrate(document).await
    }

    async fn hydrate(&self, document: Document) -> Result<Receipt, AppError> {
        let items: Vec<Value> = self
            .store
            .list(&items_collection(&document.id))
            .await?
            .into_iter()
            .map(|item| Value::Object(item.fields))
            .collect();

        let mut fields = document.fields;
        fields.insert("id".to_string(), Value::String(document.id));
        fields.insert("items".to_string(), Value::Array(items));

        Ok(normalize(&RawRecord(fields)))
    }
}
