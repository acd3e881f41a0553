//! Projection of a receipt into the Wallet `genericObject` schema.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::Receipt;

pub const DEFAULT_CLASS_SUFFIX: &str = "receiptClass";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
const BACKGROUND_COLOR: &str = "#4285f4";
const LOGO_URI: &str =
    "https://storage.googleapis.com/wallet-lab-tools-codelab-artifacts-public/pass_google_logo.jpg";
const LOGO_DESCRIPTION: &str = "Raseed receipt";
const LANGUAGE: &str = "en-US";

/// Issuer-side settings that shape every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSettings {
    pub issuer_id: String,
    pub class_suffix: String,
    pub currency_symbol: String,
}

impl WalletSettings {
    pub fn new(issuer_id: impl Into<String>) -> Self {
        Self {
            issuer_id: issuer_id.into(),
            class_suffix: DEFAULT_CLASS_SUFFIX.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn class_id(&self) -> String {
        format!("{}.{}", self.issuer_id, self.class_suffix)
    }

    /// Object ids only allow `[A-Za-z0-9._-]` after the issuer prefix.
    pub fn object_id(&self, receipt_id: &str) -> String {
        let suffix: String = receipt_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.receipt_{suffix}", self.issuer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericObject {
    pub id: String,
    pub class_id: String,
    pub state: String,
    pub card_title: LocalizedString,
    pub header: LocalizedString,
    pub subheader: LocalizedString,
    pub hex_background_color: String,
    pub logo: Image,
    pub text_modules_data: Vec<TextModule>,
    pub barcode: Barcode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedString {
    pub default_value: TranslatedString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedString {
    pub language: String,
    pub value: String,
}

impl LocalizedString {
    fn en(value: impl Into<String>) -> Self {
        Self {
            default_value: TranslatedString {
                language: LANGUAGE.to_string(),
                value: value.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub source_uri: ImageUri,
    pub content_description: LocalizedString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUri {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextModule {
    pub id: String,
    pub header: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barcode {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

fn items_text(receipt: &Receipt, currency: &str) -> String {
    receipt
        .items
        .iter()
        .map(|item| format!("{}: {currency}{} x {}", item.name, item.price, item.quantity))
        .collect::<Vec<_>>()
        .join("\n")
}

/// QR payload: the receipt summary as compact JSON.
fn barcode_value(receipt: &Receipt) -> String {
    json!({
        "establishment": receipt.establishment_name,
        "date": receipt.date,
        "type": receipt.type_of_purchase.as_str(),
        "total": receipt.total,
        "items": receipt.items,
    })
    .to_string()
}

pub fn build_generic_object(
    receipt: &Receipt,
    receipt_id: &str,
    settings: &WalletSettings,
) -> GenericObject {
    let currency = settings.currency_symbol.as_str();

    GenericObject {
        id: settings.object_id(receipt_id),
        class_id: settings.class_id(),
        state: "ACTIVE".to_string(),
        card_title: LocalizedString::en(receipt.establishment_name.clone()),
        header: LocalizedString::en(format!("{} Receipt", receipt.type_of_purchase)),
        subheader: LocalizedString::en(receipt.date.clone()),
        hex_background_color: BACKGROUND_COLOR.to_string(),
        logo: Image {
            source_uri: ImageUri {
                uri: LOGO_URI.to_string(),
            },
            content_description: LocalizedString::en(LOGO_DESCRIPTION),
        },
        text_modules_data: vec![
            TextModule {
                id: "items".to_string(),
                header: "Items Purchased".to_string(),
                body: items_text(receipt, currency),
            },
            TextModule {
                id: "total".to_string(),
                header: "Total Amount".to_string(),
                body: format!("{currency}{}", receipt.total),
            },
        ],
        barcode: Barcode {
            kind: "QR_CODE".to_string(),
            value: barcode_value(receipt),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::domain::{Item, PurchaseType};

    fn receipt() -> Receipt {
        Receipt {
            id: Some("abc123".to_string()),
            type_of_purchase: PurchaseType::Restaurant,
            establishment_name: "Cafe".to_string(),
            date: "2025-03-01".to_string(),
            total: 19.5,
            user_sub: Some("u1".to_string()),
            created_at: None,
            items: vec![
                Item {
                    name: "Tea".to_string(),
                    price: 9.5,
                    quantity: 1,
                },
                Item {
                    name: "Bun".to_string(),
                    price: 5.0,
                    quantity: 2,
                },
            ],
        }
    }

    #[test]
    fn descriptor_carries_receipt_fields() {
        let settings = WalletSettings::new("3388000000012345678");
        let object = build_generic_object(&receipt(), "abc123", &settings);

        assert_eq!(object.id, "3388000000012345678.receipt_abc123");
        assert_eq!(object.class_id, "3388000000012345678.receiptClass");
        assert_eq!(object.state, "ACTIVE");
        assert_eq!(object.card_title.default_value.value, "Cafe");
        assert_eq!(object.header.default_value.value, "Restaurant Receipt");
        assert_eq!(object.subheader.default_value.value, "2025-03-01");
        assert_eq!(object.text_modules_data[0].body, "Tea: ₹9.5 x 1\nBun: ₹5 x 2");
        assert_eq!(object.text_modules_data[1].body, "₹19.5");
    }

    #[test]
    fn barcode_holds_receipt_summary() {
        let object = build_generic_object(&receipt(), "abc123", &WalletSettings::new("1"));
        let qr: Value = serde_json::from_str(&object.barcode.value).unwrap();

        assert_eq!(object.barcode.kind, "QR_CODE");
        assert_eq!(qr["establishment"], "Cafe");
        assert_eq!(qr["type"], "Restaurant");
        assert_eq!(qr["total"], 19.5);
        assert_eq!(qr["items"][1]["quantity"], 2);
    }

    #[test]
    fn serialized_field_names_match_wallet_api() {
        let object = build_generic_object(&receipt(), "abc123", &WalletSettings::new("1"));
        let wire = serde_json::to_value(&object).unwrap();

        assert_eq!(wire["classId"], "1.receiptClass");
        assert_eq!(wire["hexBackgroundColor"], "#4285f4");
        assert_eq!(wire["cardTitle"]["defaultValue"]["language"], "en-US");
        assert!(wire["logo"]["sourceUri"]["uri"].is_string());
        assert_eq!(wire["textModulesData"][0]["header"], "Items Purchased");
        assert_eq!(wire["barcode"]["type"], "QR_CODE");
    }

    #[test]
    fn object_id_suffix_is_sanitized() {
        let settings = WalletSettings::new("1");
        assert_eq!(settings.object_id("a b/c"), "1.receipt_a_b_c");
    }
}
