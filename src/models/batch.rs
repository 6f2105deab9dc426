use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::label::{BeverageType, LabelVerificationResult};

/// Upper bound on labels per batch request, regardless of configuration.
pub const MAX_LABELS_PER_BATCH: usize = 100;

/// Reference to a previously uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImageRef {
    #[serde(deserialize_with = "trimmed")]
    #[garde(custom(non_blank))]
    pub id: String,

    #[serde(deserialize_with = "trimmed")]
    #[garde(custom(non_blank))]
    pub filename: String,

    #[serde(deserialize_with = "trimmed")]
    #[garde(custom(non_blank))]
    pub storage_key: String,
}

/// One label to verify: 1-3 images of the same product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LabelGroup {
    #[serde(deserialize_with = "trimmed")]
    #[garde(custom(non_blank))]
    pub label_id: String,

    #[serde(deserialize_with = "trimmed")]
    #[garde(custom(non_blank))]
    pub label_name: String,

    #[garde(skip)]
    pub beverage_type: BeverageType,

    #[garde(length(min = 1, max = 3), dive)]
    pub images: Vec<ImageRef>,
}

/// Request body for `POST /verify/batch`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchVerifyRequest {
    #[garde(length(min = 1, max = 100), dive)]
    pub labels: Vec<LabelGroup>,
}

/// Immutable record of a finished batch, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub batch_id: String,
    pub total: usize,
    pub completed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<LabelVerificationResult>,
}

/// Identifiers and names arrive with surrounding whitespace stripped.
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn non_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}
