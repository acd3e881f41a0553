//! Conversion between plain JSON and Firestore's typed REST values.
//!
//! Integers travel as decimal strings (`integerValue`), timestamps and
//! references decode to their string form.

use serde_json::{json, Map, Number, Value};

use crate::store::Fields;

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .unwrap_or(Value::Null),
            Value::Number(n) => Value::Number(n.clone()),
            _ => Value::Null,
        },
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_receipt_shaped_fields() {
        let fields = json!({
            "user_sub": "u1",
            "total": 9.5,
            "quantity": 2,
            "tags": ["a"],
            "meta": { "ok": true, "none": null }
        });

        let encoded = encode_fields(fields.as_object().unwrap());

        assert_eq!(encoded["user_sub"], json!({ "stringValue": "u1" }));
        assert_eq!(encoded["total"], json!({ "doubleValue": 9.5 }));
        assert_eq!(encoded["quantity"], json!({ "integerValue": "2" }));
        assert_eq!(
            encoded["tags"],
            json!({ "arrayValue": { "values": [{ "stringValue": "a" }] } })
        );
        assert_eq!(
            encoded["meta"]["mapValue"]["fields"]["none"],
            json!({ "nullValue": null })
        );
    }

    #[test]
    fn decodes_firestore_document_fields() {
        let wire = json!({
            "created_at": { "timestampValue": "2025-02-01T10:00:00.123456Z" },
            "total": { "integerValue": "12" },
            "price": { "doubleValue": 3.5 },
            "items": { "arrayValue": {} },
            "unknown": { "somethingNew": 1 }
        });

        let decoded = decode_fields(wire.as_object().unwrap());

        assert_eq!(decoded["created_at"], "2025-02-01T10:00:00.123456Z");
        assert_eq!(decoded["total"], 12);
        assert_eq!(decoded["price"], 3.5);
        assert_eq!(decoded["items"], json!([]));
        assert_eq!(decoded["unknown"], Value::Null);
    }

    #[test]
    fn nested_values_survive_encoding() {
        let original = json!({ "a": [1, 2.5, "x", { "b": false }] });
        let fields = original.as_object().unwrap();

        let round = decode_fields(encode_fields(fields).as_object().unwrap());

        assert_eq!(Value::Object(round), original);
    }
}
