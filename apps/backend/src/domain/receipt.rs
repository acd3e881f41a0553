use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category of a purchase. Anything unrecognized is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PurchaseType {
    Restaurant,
    #[default]
    Retail,
    Other,
}

impl PurchaseType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PurchaseType::Restaurant => "Restaurant",
            PurchaseType::Retail => "Retail",
            PurchaseType::Other => "Other",
        }
    }

    /// Case-insensitive parse; unknown labels fall into `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "restaurant" => PurchaseType::Restaurant,
            "retail" => PurchaseType::Retail,
            _ => PurchaseType::Other,
        }
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

/// Canonical receipt shape returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub type_of_purchase: PurchaseType,
    pub establishment_name: String,
    pub date: String,
    pub total: f64,
    /// Owning subject id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_sub: Option<String>,
    /// Server-assigned creation time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Loosely-shaped receipt as it arrives from a client, the model or an
/// older stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        RawRecord(map)
    }
}

impl From<&Receipt> for RawRecord {
    fn from(receipt: &Receipt) -> Self {
        match serde_json::to_value(receipt) {
            Ok(Value::Object(map)) => RawRecord(map),
            _ => RawRecord::default(),
        }
    }
}
