//! Field-by-field mapping of raw records onto [`Receipt`].
//!
//! Each field is resolved independently and falls back to its default when
//! absent or `null`:
//!
//! | field                | default           |
//! |----------------------|-------------------|
//! | `type_of_purchase`   | `Retail`          |
//! | `establishment_name` | `"Unknown Store"` |
//! | `date`               | `""`              |
//! | `total`              | `0`               |
//! | item `name`          | `"Unknown"` (from `item_name`, then `name`) |
//! | item `price`         | `0`               |
//! | item `quantity`      | `1`               |
//!
//! Normalizing a normalized record is a no-op.

use serde_json::{Map, Value};

use super::receipt::{Item, PurchaseType, RawRecord, Receipt};

pub const DEFAULT_ESTABLISHMENT: &str = "Unknown Store";
pub const DEFAULT_ITEM_NAME: &str = "Unknown";

fn non_null<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    non_null(map, key).and_then(as_text)
}

/// Normalize one item map. The legacy `item_name` key wins when it holds a
/// non-empty string.
pub fn normalize_item(raw: &Map<String, Value>) -> Item {
    let legacy = text_field(raw, "item_name").filter(|n| !n.is_empty());
    let name = legacy
        .or_else(|| text_field(raw, "name"))
        .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string());

    Item {
        name,
        price: non_null(raw, "price").and_then(as_number).unwrap_or(0.0),
        quantity: non_null(raw, "quantity").and_then(as_integer).unwrap_or(1),
    }
}

/// Map a raw record onto the canonical receipt shape.
pub fn normalize(raw: &RawRecord) -> Receipt {
    let map = &raw.0;

    let type_of_purchase = text_field(map, "type_of_purchase")
        .map(|label| PurchaseType::from_label(&label))
        .unwrap_or_default();

    let items = match non_null(map, "items") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_object)
            .map(normalize_item)
            .collect(),
        _ => Vec::new(),
    };

    Receipt {
        id: text_field(map, "id"),
        type_of_purchase,
        establishment_name: text_field(map, "establishment_name")
            .unwrap_or_else(|| DEFAULT_ESTABLISHMENT.to_string()),
        date: text_field(map, "date").unwrap_or_default(),
        total: non_null(map, "total").and_then(as_number).unwrap_or(0.0),
        user_sub: text_field(map, "user_sub"),
        created_at: text_field(map, "created_at"),
        items,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => RawRecord(map),
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn empty_record_gets_all_defaults() {
        let receipt = normalize(&RawRecord::default());

        assert_eq!(receipt.type_of_purchase, PurchaseType::Retail);
        assert_eq!(receipt.establishment_name, "Unknown Store");
        assert_eq!(receipt.date, "");
        assert_eq!(receipt.total, 0.0);
        assert!(receipt.items.is_empty());
        assert_eq!(receipt.user_sub, None);
    }

    #[test]
    fn legacy_item_name_is_mapped() {
        let receipt = normalize(&raw(json!({
            "establishment_name": "Cafe",
            "total": 9.5,
            "items": [{ "item_name": "Tea", "price": 9.5 }]
        })));

        assert_eq!(
            receipt.items,
            vec![Item {
                name: "Tea".to_string(),
                price: 9.5,
                quantity: 1
            }]
        );
    }

    #[test]
    fn item_defaults_and_name_precedence() {
        let items = [
            json!({}),
            json!({ "name": "Bread" }),
            json!({ "item_name": "", "name": "Milk" }),
            json!({ "item_name": "Eggs", "name": "ignored", "quantity": 12, "price": "3.25" }),
        ];
        let names: Vec<Item> = items
            .iter()
            .map(|v| normalize_item(v.as_object().unwrap()))
            .collect();

        assert_eq!(names[0].name, "Unknown");
        assert_eq!(names[0].price, 0.0);
        assert_eq!(names[0].quantity, 1);
        assert_eq!(names[1].name, "Bread");
        assert_eq!(names[2].name, "Milk");
        assert_eq!(names[3].name, "Eggs");
        assert_eq!(names[3].price, 3.25);
        assert_eq!(names[3].quantity, 12);
    }

    #[test]
    fn nulls_count_as_absent() {
        let receipt = normalize(&raw(json!({
            "type_of_purchase": null,
            "establishment_name": null,
            "total": null,
            "items": null
        })));

        assert_eq!(receipt.type_of_purchase, PurchaseType::Retail);
        assert_eq!(receipt.establishment_name, "Unknown Store");
        assert_eq!(receipt.total, 0.0);
    }

    #[test]
    fn unknown_purchase_type_is_other() {
        let receipt = normalize(&raw(json!({ "type_of_purchase": "Groceries" })));
        assert_eq!(receipt.type_of_purchase, PurchaseType::Other);

        let receipt = normalize(&raw(json!({ "type_of_purchase": "restaurant" })));
        assert_eq!(receipt.type_of_purchase, PurchaseType::Restaurant);
    }

    #[test]
    fn stored_metadata_survives() {
        let receipt = normalize(&raw(json!({
            "id": "abc",
            "user_sub": "u1",
            "created_at": "2025-01-01T00:00:00Z"
        })));

        assert_eq!(receipt.id.as_deref(), Some("abc"));
        assert_eq!(receipt.user_sub.as_deref(), Some("u1"));
        assert_eq!(receipt.created_at.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-1_000i64..1_000).prop_map(|n| json!(n)),
            (-1_000.0f64..1_000.0).prop_map(|n| json!(n)),
            "[a-zA-Z ]{0,12}".prop_map(Value::String),
        ]
    }

    fn arb_item() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            prop_oneof![
                Just("name".to_string()),
                Just("item_name".to_string()),
                Just("price".to_string()),
                Just("quantity".to_string()),
            ],
            arb_scalar(),
            0..4,
        )
        .prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    fn arb_record() -> impl Strategy<Value = RawRecord> {
        (
            prop::option::of(arb_scalar()),
            prop::option::of(arb_scalar()),
            prop::option::of(arb_scalar()),
            prop::option::of(arb_scalar()),
            prop::collection::vec(arb_item(), 0..5),
        )
            .prop_map(|(kind, name, date, total, items)| {
                let mut map = Map::new();
                let fields = [
                    ("type_of_purchase", kind),
                    ("establishment_name", name),
                    ("date", date),
                    ("total", total),
                ];
                for (key, value) in fields {
                    if let Some(value) = value {
                        map.insert(key.to_string(), value);
                    }
                }
                map.insert("items".to_string(), Value::Array(items));
                RawRecord(map)
            })
    }

    proptest! {
        #[test]
        fn normalize_is_a_fixed_point(record in arb_record()) {
            let once = normalize(&record);
            let twice = normalize(&RawRecord::from(&once));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn item_count_is_preserved(record in arb_record()) {
            let expected = record.get("items").and_then(Value::as_array).map_or(0, Vec::len);
            prop_assert_eq!(normalize(&record).items.len(), expected);
        }
    }
}
