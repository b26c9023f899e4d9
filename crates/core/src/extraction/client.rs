//! HTTP client for the vision extraction provider.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;

use super::error::ExtractionError;
use super::parse::{extract_payload, validate_payload};
use super::types::ExtractedReceipt;

/// Instruction sent with every extraction request.
///
/// The model must leave unreadable fields null rather than guess; a
/// fabricated total would poison the points pipeline downstream.
const EXTRACTION_PROMPT: &str = "Extract the structured fields from this purchase receipt image. \
Respond with JSON only, matching the provided schema exactly. \
Never infer or guess missing values: if a field is absent or illegible, use null. \
Dates must be formatted YYYY-MM-DD. Amounts are plain decimal numbers without currency symbols.";

/// Configuration for the extraction client.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Provider endpoint URL.
    pub endpoint: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
    /// Request timeout in seconds; a slow provider is treated as failed,
    /// not hung.
    pub timeout_secs: u64,
}

/// Client for the external vision extraction provider.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: reqwest::Client,
    config: ExtractionConfig,
}

impl ExtractionClient {
    /// Creates a new extraction client.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Service` if the HTTP client cannot be
    /// constructed.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ExtractionError::Service(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Extracts structured receipt fields from an image reference.
    ///
    /// The request carries a strict JSON schema; the response is parsed
    /// defensively across the provider's known envelopes and validated
    /// field by field. This call is never retried here; retry policy
    /// belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Service` for transport failures (these
    /// are retryable), `Parse` for unusable envelopes, and `Validation`
    /// for schema violations (neither is retryable).
    pub async fn extract(&self, image_url: &str) -> Result<ExtractedReceipt, ExtractionError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&self.request_body(image_url))
            .send()
            .await
            .map_err(|e| ExtractionError::Service(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Service(format!(
                "provider returned status {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExtractionError::Parse(format!("response body is not JSON: {e}")))?;

        let payload = extract_payload(&body)?;
        validate_payload(&payload)
    }

    /// Downloads image bytes from blob storage for fingerprinting.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Service` if the image cannot be fetched.
    pub async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, ExtractionError> {
        let response = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(|e| ExtractionError::Service(format!("image fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Service(format!(
                "image fetch returned status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Service(format!("image read failed: {e}")))?;

        Ok(bytes.to_vec())
    }

    fn request_body(&self, image_url: &str) -> Value {
        json!({
            "model": self.config.model,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "extracted_receipt",
                    "strict": true,
                    "schema": receipt_schema(),
                }
            },
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": EXTRACTION_PROMPT },
                        { "type": "image_url", "image_url": { "url": image_url } }
                    ]
                }
            ]
        })
    }
}

/// The strict JSON schema constraining the model's output.
///
/// `total` and `items` are required (`total` nullable, `items` possibly
/// empty); everything else is optional/nullable.
fn receipt_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["total", "items"],
        "properties": {
            "merchant": { "type": ["string", "null"] },
            "purchase_date": { "type": ["string", "null"], "description": "YYYY-MM-DD" },
            "subtotal": { "type": ["number", "null"] },
            "tax": { "type": ["number", "null"] },
            "total": { "type": ["number", "null"] },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "category": { "type": ["string", "null"] },
                        "quantity": { "type": ["number", "null"] },
                        "unit_price": { "type": ["number", "null"] },
                        "line_total": { "type": ["number", "null"] }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ExtractionClient {
        ExtractionClient::new(ExtractionConfig {
            endpoint: "https://provider.invalid/v1/chat/completions".to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_schema_requires_total_and_items() {
        let schema = receipt_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "total"));
        assert!(required.iter().any(|v| v == "items"));
    }

    #[test]
    fn test_request_body_shape() {
        let client = test_client();
        let body = client.request_body("https://blobs.example/receipt.jpg");

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["messages"][0]["content"][1]["image_url"]["url"],
            "https://blobs.example/receipt.jpg"
        );
        let prompt = body["messages"][0]["content"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("use null"));
    }
}
