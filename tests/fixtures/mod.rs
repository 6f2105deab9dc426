//! Extraction payloads for well-formed labels of each category.

#![allow(dead_code)]

use label_compliance::models::label::{
    ExtractedFields, FIELD_ALCOHOL_CONTENT, FIELD_BEVERAGE_TYPE, FIELD_BRAND_NAME,
    FIELD_CLASS_TYPE, FIELD_GOVERNMENT_WARNING, FIELD_NAME_ADDRESS, FIELD_NET_CONTENTS,
};
use label_compliance::services::health_warning::WARNING_TEXT;

/// Smallest byte string with a PNG signature.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";

pub fn spirits_fields() -> ExtractedFields {
    ExtractedFields::default()
        .with_value(FIELD_BRAND_NAME, "Old Rip Van Winkle")
        .with_value(FIELD_CLASS_TYPE, "Kentucky Straight Bourbon Whiskey")
        .with_value(FIELD_ALCOHOL_CONTENT, "53.5% Alc./Vol. (107 Proof)")
        .with_value(FIELD_NET_CONTENTS, "750 mL")
        .with_value(FIELD_NAME_ADDRESS, "Distilled and bottled by Old Rip Van Winkle Distillery, Frankfort, KY")
        .with_value(FIELD_GOVERNMENT_WARNING, WARNING_TEXT)
        .with_image_index(FIELD_BRAND_NAME, 0)
}

pub fn beer_fields() -> ExtractedFields {
    ExtractedFields::default()
        .with_value(FIELD_BRAND_NAME, "Sierra Nevada")
        .with_value(FIELD_CLASS_TYPE, "India Pale Ale")
        .with_value(FIELD_ALCOHOL_CONTENT, "6.7% Alc./Vol.")
        .with_value(FIELD_NET_CONTENTS, "12 FL. OZ.")
        .with_value(FIELD_NAME_ADDRESS, "Brewed and bottled by Sierra Nevada Brewing Co., Chico, CA")
        .with_value(FIELD_GOVERNMENT_WARNING, WARNING_TEXT)
}

pub fn wine_fields() -> ExtractedFields {
    ExtractedFields::default()
        .with_value(FIELD_BRAND_NAME, "Stone Creek Vineyards")
        .with_value(FIELD_CLASS_TYPE, "Cabernet Sauvignon")
        .with_value(FIELD_ALCOHOL_CONTENT, "13.5% Alc./Vol.")
        .with_value(FIELD_NET_CONTENTS, "750 mL")
        .with_value(FIELD_NAME_ADDRESS, "Produced and bottled by Stone Creek Vineyards, Napa, CA")
        .with_value(FIELD_GOVERNMENT_WARNING, WARNING_TEXT)
}

/// Same label, but the provider also names the category explicitly.
pub fn with_detected_type(fields: ExtractedFields, detected: &str) -> ExtractedFields {
    fields.with_value(FIELD_BEVERAGE_TYPE, detected)
}
