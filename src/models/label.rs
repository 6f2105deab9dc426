use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// TTB beverage categories per 27 CFR Parts 4, 5, 7, plus the "auto" request mode.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, AsRefStr, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BeverageType {
    Spirits,
    Beer,
    Wine,
    Auto,
}

impl BeverageType {
    /// Categories that own a rule table. `Auto` is only ever a request value.
    pub const CANONICAL: [BeverageType; 3] =
        [BeverageType::Spirits, BeverageType::Beer, BeverageType::Wine];

    pub fn is_auto(self) -> bool {
        self == BeverageType::Auto
    }
}

/// Outcome of a single field check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, AsRefStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldStatus {
    Pass,
    Fail,
    Unreadable,
}

/// Overall disposition of a label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, AsRefStr, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OverallStatus {
    Pass,
    Fail,
    Escalate,
    /// Reserved; the pipeline never produces it.
    Retry,
    Error,
}

/// Field names the extraction provider is asked to return.
pub const FIELD_BRAND_NAME: &str = "brand_name";
pub const FIELD_CLASS_TYPE: &str = "class_type";
pub const FIELD_ALCOHOL_CONTENT: &str = "alcohol_content";
pub const FIELD_NET_CONTENTS: &str = "net_contents";
pub const FIELD_NAME_ADDRESS: &str = "name_address";
pub const FIELD_GOVERNMENT_WARNING: &str = "government_warning";
pub const FIELD_BEVERAGE_TYPE: &str = "beverage_type";

pub const EXTRACTED_FIELD_NAMES: [&str; 7] = [
    FIELD_BEVERAGE_TYPE,
    FIELD_BRAND_NAME,
    FIELD_CLASS_TYPE,
    FIELD_ALCOHOL_CONTENT,
    FIELD_NET_CONTENTS,
    FIELD_NAME_ADDRESS,
    FIELD_GOVERNMENT_WARNING,
];

/// Normalised output of one extraction pass.
///
/// A later pass replaces an earlier one wholesale; values are never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub values: HashMap<String, Option<String>>,
    pub image_indexes: HashMap<String, u32>,
    pub unreadable: BTreeSet<String>,
}

impl ExtractedFields {
    /// Value of a field, treating blank strings as absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// Raw value of a field, including blank strings.
    pub fn raw(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_deref())
    }

    pub fn image_index(&self, field: &str) -> Option<u32> {
        self.image_indexes.get(field).copied()
    }

    pub fn is_unreadable(&self, field: &str) -> bool {
        self.unreadable.contains(field)
    }

    pub fn with_value(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_string(), Some(value.into()));
        self
    }

    pub fn with_unreadable(mut self, field: &str) -> Self {
        self.unreadable.insert(field.to_string());
        self
    }

    pub fn with_image_index(mut self, field: &str, index: u32) -> Self {
        self.image_indexes.insert(field.to_string(), index);
        self
    }
}

/// Result of checking one required field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub field_name: String,
    pub status: FieldStatus,
    #[serde(default)]
    pub found_on_image: Option<u32>,
    #[serde(default)]
    pub extracted_value: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub cfr_reference: Option<String>,
}

impl FieldResult {
    pub fn pass(name: &str, extracted: Option<&str>, image_idx: Option<u32>) -> Self {
        Self {
            field_name: name.to_string(),
            status: FieldStatus::Pass,
            found_on_image: image_idx,
            extracted_value: extracted.map(str::to_string),
            failure_reason: None,
            cfr_reference: None,
        }
    }

    pub fn fail(name: &str, reason: impl Into<String>, cfr: Option<&str>) -> Self {
        Self {
            field_name: name.to_string(),
            status: FieldStatus::Fail,
            found_on_image: None,
            extracted_value: None,
            failure_reason: Some(reason.into()),
            cfr_reference: cfr.map(str::to_string),
        }
    }

    pub fn unreadable(name: &str, reason: impl Into<String>, cfr: &str) -> Self {
        Self {
            field_name: name.to_string(),
            status: FieldStatus::Unreadable,
            found_on_image: None,
            extracted_value: None,
            failure_reason: Some(reason.into()),
            cfr_reference: Some(cfr.to_string()),
        }
    }

    pub fn with_extracted(mut self, value: Option<&str>) -> Self {
        self.extracted_value = value.map(str::to_string);
        self
    }

    pub fn with_cfr(mut self, cfr: &str) -> Self {
        self.cfr_reference = Some(cfr.to_string());
        self
    }
}

/// Terminal verification outcome for one label group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelVerificationResult {
    pub label_id: String,
    pub label_name: String,
    pub overall_status: OverallStatus,
    pub beverage_type: BeverageType,
    pub fields: Vec<FieldResult>,
    #[serde(default)]
    pub escalation_reason: Option<String>,
    pub images_processed: usize,
}

/// Streamed once per completed label; never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgressEvent {
    pub batch_id: String,
    pub completed: usize,
    pub total: usize,
    pub result: LabelVerificationResult,
}
