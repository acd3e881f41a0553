//! Prompts and the structured-output schema for receipt extraction.

use serde_json::{json, Value};

use crate::domain::Receipt;

/// Response schema in the model's OpenAPI subset.
pub fn receipt_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type_of_purchase": {
                "type": "STRING",
                "enum": ["Restaurant", "Retail", "Other"]
            },
            "date": { "type": "STRING" },
            "establishment_name": { "type": "STRING" },
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "price": { "type": "NUMBER" },
                        "quantity": { "type": "INTEGER" }
                    },
                    "required": ["name", "price", "quantity"]
                }
            },
            "total": { "type": "NUMBER" }
        },
        "required": ["type_of_purchase", "date", "establishment_name", "items", "total"]
    })
}

pub fn extraction_prompt() -> String {
    format!(
        r#"You are a receipt text extractor assistant.
You are given a user-uploaded receipt image.
Extract all important information and return it strictly as JSON matching this schema:

{schema}

IMPORTANT:
- Return raw JSON only (no markdown, no code fences).
- type_of_purchase must be one of "Restaurant", "Retail" or "Other".
- quantity is a whole number; price and total are numbers without currency symbols.
- Do NOT include any text outside the JSON."#,
        schema = receipt_schema()
    )
}

/// Conversational prompt with the caller's receipts as context.
pub fn chat_prompt(user_prompt: &str, receipts: &[Receipt]) -> String {
    let receipts_json = serde_json::to_string_pretty(receipts).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are an intelligent financial assistant with access to the user's past receipts.

User prompt:
{user_prompt}

The user's receipts, most recent first:
{receipts_json}

Your job:
- Understand the user's request.
- Analyze the receipts to provide insights or summaries.
- Keep your response clear and factual.
- Do NOT output any JSON unless explicitly asked."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{normalize, RawRecord};

    #[test]
    fn schema_requires_every_field() {
        let schema = receipt_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required.len(), 5);
        assert!(extraction_prompt().contains("\"establishment_name\""));
    }

    #[test]
    fn chat_prompt_embeds_question_and_receipts() {
        let receipt = normalize(&RawRecord::from(
            json!({ "establishment_name": "Cafe Mocha", "total": 120 })
                .as_object()
                .cloned()
                .unwrap(),
        ));

        let prompt = chat_prompt("How much did I spend?", &[receipt]);

        assert!(prompt.contains("How much did I spend?"));
        assert!(prompt.contains("Cafe Mocha"));
    }
}
