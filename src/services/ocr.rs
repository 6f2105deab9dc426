use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::label::{BeverageType, ExtractedFields, EXTRACTED_FIELD_NAMES};

const BASE_INSTRUCTION: &str = concat!(
    "Extract required TTB label fields from these product label images. ",
    "Return strict JSON only with keys: beverage_type, brand_name, class_type, alcohol_content, ",
    "net_contents, name_address, government_warning, unreadable_fields (array of keys). ",
    "For each field you read, set <key>_image_idx to the zero-based index of the image it was found on. ",
    "Set beverage_type to one of: spirits, beer, wine."
);

const RETRY_INSTRUCTION: &str =
    " Focus on noisy, low-contrast text and infer layout context where possible.";

/// Label image bytes loaded from storage, ready to send to the provider.
#[derive(Debug, Clone)]
pub struct LabelImage {
    pub bytes: Vec<u8>,
    /// Lower-cased extension including the dot, e.g. ".png"
    pub extension: String,
    pub filename: String,
}

impl LabelImage {
    pub fn mime_type(&self) -> &'static str {
        if self.extension.eq_ignore_ascii_case(".png") {
            "image/png"
        } else {
            "image/jpeg"
        }
    }

    fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Vision extraction provider seam.
///
/// One call is one multi-image request. `retry_mode` asks the provider to
/// work harder on low-contrast or noisy text; the caller decides when.
#[async_trait]
pub trait LabelExtractor: Send + Sync {
    async fn extract(
        &self,
        images: &[LabelImage],
        beverage_type: BeverageType,
        retry_mode: bool,
    ) -> Result<ExtractedFields, ExtractionError>;

    /// Whether the provider has the credentials it needs.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Client for the OpenAI Responses API with structured JSON output.
pub struct OpenAiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: Option<&str>,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Failed(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.map(str::to_string),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request_body(&self, images: &[LabelImage], retry_mode: bool) -> Value {
        let mut instruction = BASE_INSTRUCTION.to_string();
        if retry_mode {
            instruction.push_str(RETRY_INSTRUCTION);
        }

        let mut content = vec![json!({ "type": "input_text", "text": instruction })];
        for image in images {
            content.push(json!({ "type": "input_image", "image_url": image.data_url() }));
        }

        json!({
            "model": self.model,
            "input": [{ "role": "user", "content": content }],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "label_fields",
                    "strict": true,
                    "schema": extraction_schema(),
                }
            }
        })
    }
}

#[async_trait]
impl LabelExtractor for OpenAiClient {
    async fn extract(
        &self,
        images: &[LabelImage],
        beverage_type: BeverageType,
        retry_mode: bool,
    ) -> Result<ExtractedFields, ExtractionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!(
                beverage_type = %beverage_type,
                retry = retry_mode,
                "OpenAI key missing; failing extraction"
            );
            return Err(ExtractionError::Unavailable(
                "OPENAI_API_KEY is not configured".to_string(),
            ));
        };

        tracing::info!(
            model = %self.model,
            beverage_type = %beverage_type,
            retry = retry_mode,
            image_count = images.len(),
            "Calling OpenAI extraction"
        );

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(images, retry_mode))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    retry = retry_mode,
                    timeout = e.is_timeout(),
                    error = %e,
                    "OpenAI request failed"
                );
                ExtractionError::Failed(transport_error_message(&e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, retry = retry_mode, "OpenAI API returned error status");
            return Err(ExtractionError::Failed(format!(
                "OpenAI API error: status {status}: {body}"
            )));
        }

        let parsed: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Failed(format!("OpenAI extraction parse error: {e}")))?;

        let text = structured_text(&parsed)?;
        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| ExtractionError::Failed(format!("OpenAI extraction parse error: {e}")))?;
        let fields = normalize_payload(payload)?;

        tracing::info!(
            beverage_type = %beverage_type,
            retry = retry_mode,
            unreadable_fields = ?fields.unreadable,
            "OpenAI extraction success"
        );
        Ok(fields)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Transport failure with its full cause chain; reqwest's own message omits it.
fn transport_error_message(e: &reqwest::Error) -> String {
    let mut message = if e.is_timeout() {
        format!("OpenAI API error: request timed out: {e}")
    } else {
        format!("OpenAI API error: {e}")
    };
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}

fn structured_text(response: &ResponsesResponse) -> Result<String, ExtractionError> {
    for item in response.output.iter().filter(|i| i.kind == "message") {
        for part in &item.content {
            match part.kind.as_str() {
                "output_text" => {
                    if let Some(text) = &part.text {
                        return Ok(text.clone());
                    }
                }
                "refusal" => {
                    return Err(ExtractionError::Failed(format!(
                        "OpenAI extraction refused: {}",
                        part.refusal.as_deref().unwrap_or("no reason given")
                    )));
                }
                _ => {}
            }
        }
    }
    Err(ExtractionError::Failed(
        "OpenAI extraction parse error: response produced no structured payload".to_string(),
    ))
}

/// Convert the provider's JSON object into `ExtractedFields`.
///
/// Missing keys read as absent, a missing or malformed `unreadable_fields`
/// reads as empty, and `<field>_image_idx` integers become source indexes.
pub fn normalize_payload(payload: Value) -> Result<ExtractedFields, ExtractionError> {
    let Value::Object(map) = payload else {
        return Err(ExtractionError::Failed(
            "OpenAI extraction parse error: payload is not a JSON object".to_string(),
        ));
    };

    let mut fields = ExtractedFields::default();
    for name in EXTRACTED_FIELD_NAMES {
        let value = match map.get(name) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        fields.values.insert(name.to_string(), value);

        if let Some(idx) = map
            .get(&format!("{name}_image_idx"))
            .and_then(Value::as_u64)
            .and_then(|i| u32::try_from(i).ok())
        {
            fields.image_indexes.insert(name.to_string(), idx);
        }
    }

    if let Some(Value::Array(items)) = map.get("unreadable_fields") {
        fields.unreadable = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    Ok(fields)
}

fn extraction_schema() -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for name in EXTRACTED_FIELD_NAMES {
        properties.insert(name.to_string(), json!({ "type": ["string", "null"] }));
        required.push(name.to_string());
        let idx = format!("{name}_image_idx");
        properties.insert(idx.clone(), json!({ "type": ["integer", "null"] }));
        required.push(idx);
    }
    properties.insert(
        "unreadable_fields".to_string(),
        json!({ "type": "array", "items": { "type": "string" } }),
    );
    required.push("unreadable_fields".to_string());

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("OpenAI extraction unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}
