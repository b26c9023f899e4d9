//! Defensive parsing of provider responses.
//!
//! The provider's API has shipped several response envelopes over time.
//! [`extract_payload`] walks the known shapes to locate the structured
//! JSON document; [`validate_payload`] then checks it field by field
//! against the receipt schema, collecting every violation instead of
//! stopping at the first.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::error::ExtractionError;
use super::types::{ExtractedItem, ExtractedReceipt};

/// Locates the structured JSON payload inside a provider response.
///
/// Tries, in order:
/// 1. `choices[0].message.content` (chat-completions envelope)
/// 2. `content[0].text` (messages envelope)
/// 3. `output[0].content[0].text` (responses envelope)
/// 4. the response itself, when it already looks like a receipt object
///
/// String payloads may be wrapped in Markdown code fences, which are
/// stripped before parsing.
///
/// # Errors
///
/// Returns `ExtractionError::Parse` when no known envelope matches or the
/// located payload is not valid JSON.
pub fn extract_payload(response: &Value) -> Result<Value, ExtractionError> {
    let candidates = [
        response.pointer("/choices/0/message/content"),
        response.pointer("/content/0/text"),
        response.pointer("/output/0/content/0/text"),
    ];

    for candidate in candidates.into_iter().flatten() {
        match candidate {
            Value::String(text) => {
                let trimmed = strip_code_fences(text);
                return serde_json::from_str(trimmed).map_err(|e| {
                    ExtractionError::Parse(format!("payload is not valid JSON: {e}"))
                });
            }
            Value::Object(_) => return Ok(candidate.clone()),
            _ => {}
        }
    }

    // Some envelopes return the structured document directly.
    if looks_like_receipt(response) {
        return Ok(response.clone());
    }

    Err(ExtractionError::Parse(
        "no structured payload found in any known response envelope".to_string(),
    ))
}

fn looks_like_receipt(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("total") || obj.contains_key("items"))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Validates a payload against the receipt schema.
///
/// `total` must be present (null allowed); `items` must be an array.
/// Field-level violations are collected and returned together.
///
/// # Errors
///
/// Returns `ExtractionError::Validation` with every violation found.
pub fn validate_payload(payload: &Value) -> Result<ExtractedReceipt, ExtractionError> {
    let Some(obj) = payload.as_object() else {
        return Err(ExtractionError::Validation(vec![
            "payload: expected a JSON object".to_string(),
        ]));
    };

    let mut violations = Vec::new();

    if !obj.contains_key("total") {
        violations.push("total: missing required field".to_string());
    }
    let total = decimal_field(obj.get("total"), "total", &mut violations);
    let subtotal = decimal_field(obj.get("subtotal"), "subtotal", &mut violations);
    let tax = decimal_field(obj.get("tax"), "tax", &mut violations);
    let merchant = string_field(obj.get("merchant"), "merchant", &mut violations);
    let purchase_date = date_field(obj.get("purchase_date"), &mut violations);

    let items = match obj.get("items") {
        Some(Value::Array(raw_items)) => raw_items
            .iter()
            .enumerate()
            .filter_map(|(idx, raw)| validate_item(raw, idx, &mut violations))
            .collect(),
        Some(_) => {
            violations.push("items: expected an array".to_string());
            Vec::new()
        }
        None => {
            violations.push("items: missing required field".to_string());
            Vec::new()
        }
    };

    if violations.is_empty() {
        Ok(ExtractedReceipt {
            merchant,
            purchase_date,
            subtotal,
            tax,
            total,
            items,
        })
    } else {
        Err(ExtractionError::Validation(violations))
    }
}

fn validate_item(
    raw: &Value,
    idx: usize,
    violations: &mut Vec<String>,
) -> Option<ExtractedItem> {
    let Some(obj) = raw.as_object() else {
        violations.push(format!("items[{idx}]: expected an object"));
        return None;
    };

    let name = match obj.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => {
            violations.push(format!("items[{idx}].name: expected a non-empty string"));
            return None;
        }
    };

    Some(ExtractedItem {
        name,
        category: string_field(obj.get("category"), &format!("items[{idx}].category"), violations),
        quantity: decimal_field(obj.get("quantity"), &format!("items[{idx}].quantity"), violations),
        unit_price: decimal_field(
            obj.get("unit_price"),
            &format!("items[{idx}].unit_price"),
            violations,
        ),
        line_total: decimal_field(
            obj.get("line_total"),
            &format!("items[{idx}].line_total"),
            violations,
        ),
    })
}

/// Accepts JSON numbers and numeric strings; parses via the decimal text
/// representation to avoid binary-float rounding.
fn decimal_field(
    value: Option<&Value>,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<Decimal> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match Decimal::from_str(&n.to_string()) {
            Ok(d) => Some(d),
            Err(_) => {
                violations.push(format!("{field}: number out of range"));
                None
            }
        },
        Some(Value::String(s)) => match Decimal::from_str(s.trim()) {
            Ok(d) => Some(d),
            Err(_) => {
                violations.push(format!("{field}: expected a number, got {s:?}"));
                None
            }
        },
        Some(other) => {
            violations.push(format!("{field}: expected a number, got {other}"));
            None
        }
    }
}

fn string_field(
    value: Option<&Value>,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            violations.push(format!("{field}: expected a string, got {other}"));
            None
        }
    }
}

fn date_field(value: Option<&Value>, violations: &mut Vec<String>) -> Option<NaiveDate> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                violations.push(format!("purchase_date: expected YYYY-MM-DD, got {s:?}"));
                None
            }
        },
        Some(other) => {
            violations.push(format!("purchase_date: expected a string, got {other}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn receipt_json() -> Value {
        json!({
            "merchant": "Dank Burgers",
            "purchase_date": "2026-03-14",
            "subtotal": 42.50,
            "tax": 2.50,
            "total": 45.00,
            "items": [
                { "name": "Burger", "category": "food", "quantity": 2,
                  "unit_price": 15.00, "line_total": 30.00 },
                { "name": "Fries", "line_total": 12.50 }
            ]
        })
    }

    #[test]
    fn test_chat_completions_envelope() {
        let response = json!({
            "choices": [
                { "message": { "content": receipt_json().to_string() } }
            ]
        });
        let payload = extract_payload(&response).unwrap();
        assert_eq!(payload, receipt_json());
    }

    #[test]
    fn test_messages_envelope() {
        let response = json!({
            "content": [ { "type": "text", "text": receipt_json().to_string() } ]
        });
        let payload = extract_payload(&response).unwrap();
        assert_eq!(payload, receipt_json());
    }

    #[test]
    fn test_responses_envelope() {
        let response = json!({
            "output": [
                { "content": [ { "text": receipt_json().to_string() } ] }
            ]
        });
        let payload = extract_payload(&response).unwrap();
        assert_eq!(payload, receipt_json());
    }

    #[test]
    fn test_bare_object_envelope() {
        let payload = extract_payload(&receipt_json()).unwrap();
        assert_eq!(payload, receipt_json());
    }

    #[test]
    fn test_code_fenced_payload() {
        let fenced = format!("```json\n{}\n```", receipt_json());
        let response = json!({
            "choices": [ { "message": { "content": fenced } } ]
        });
        let payload = extract_payload(&response).unwrap();
        assert_eq!(payload, receipt_json());
    }

    #[test]
    fn test_unknown_envelope_is_parse_error() {
        let response = json!({ "result": "ok" });
        assert!(matches!(
            extract_payload(&response),
            Err(ExtractionError::Parse(_))
        ));
    }

    #[test]
    fn test_non_json_payload_is_parse_error() {
        let response = json!({
            "choices": [ { "message": { "content": "I could not read the image, sorry!" } } ]
        });
        assert!(matches!(
            extract_payload(&response),
            Err(ExtractionError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_full_receipt() {
        let receipt = validate_payload(&receipt_json()).unwrap();
        assert_eq!(receipt.merchant.as_deref(), Some("Dank Burgers"));
        assert_eq!(receipt.total, Some(dec!(45.00)));
        assert_eq!(receipt.subtotal, Some(dec!(42.50)));
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[1].line_total, Some(dec!(12.50)));
        assert_eq!(receipt.items[1].quantity, None);
    }

    #[test]
    fn test_validate_null_fields_stay_null() {
        let payload = json!({
            "merchant": null,
            "purchase_date": null,
            "subtotal": null,
            "tax": null,
            "total": null,
            "items": []
        });
        let receipt = validate_payload(&payload).unwrap();
        assert_eq!(receipt.merchant, None);
        assert_eq!(receipt.total, None);
        assert!(receipt.items.is_empty());
    }

    #[test]
    fn test_validate_numeric_strings_accepted() {
        let payload = json!({ "total": "45.00", "items": [] });
        let receipt = validate_payload(&payload).unwrap();
        assert_eq!(receipt.total, Some(dec!(45.00)));
    }

    #[test]
    fn test_validate_missing_total_and_items() {
        let payload = json!({ "merchant": "x" });
        let Err(ExtractionError::Validation(violations)) = validate_payload(&payload) else {
            panic!("expected validation error");
        };
        assert!(violations.iter().any(|v| v.starts_with("total:")));
        assert!(violations.iter().any(|v| v.starts_with("items:")));
    }

    #[test]
    fn test_validate_collects_all_violations() {
        let payload = json!({
            "total": "not-a-number",
            "purchase_date": "14/03/2026",
            "items": [ { "name": "" }, 42 ]
        });
        let Err(ExtractionError::Validation(violations)) = validate_payload(&payload) else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_validate_non_object_payload() {
        let payload = json!([1, 2, 3]);
        assert!(matches!(
            validate_payload(&payload),
            Err(ExtractionError::Validation(_))
        ));
    }
}
