//! Beverage category inference for "auto" requests.

use std::str::FromStr;

use crate::models::label::{BeverageType, ExtractedFields, FIELD_BEVERAGE_TYPE, FIELD_CLASS_TYPE};

const SPIRITS_TOKENS: &[&str] = &[
    "whiskey", "whisky", "bourbon", "gin", "rum", "vodka", "tequila", "brandy",
];
const BEER_TOKENS: &[&str] = &["beer", "ale", "lager", "stout", "porter", "pilsner", "ipa"];
const WINE_TOKENS: &[&str] = &[
    "wine", "cabernet", "merlot", "pinot", "chardonnay", "sauvignon", "sparkling",
];

/// Resolve the category a label is validated against.
///
/// Explicit requests pass through. For `Auto`, the provider's own
/// `beverage_type` wins when it names a category; otherwise `class_type` is
/// scanned for keywords, spirits first, then beer, then wine. Anything else
/// falls back to spirits.
pub fn resolve_beverage_type(requested: BeverageType, extracted: &ExtractedFields) -> BeverageType {
    if !requested.is_auto() {
        return requested;
    }

    let detected = extracted.raw(FIELD_BEVERAGE_TYPE).unwrap_or_default().trim();
    if let Ok(category) = BeverageType::from_str(detected) {
        if !category.is_auto() {
            return category;
        }
    }

    let class_type = extracted
        .raw(FIELD_CLASS_TYPE)
        .unwrap_or_default()
        .to_lowercase();
    let mentions = |tokens: &[&str]| tokens.iter().any(|t| class_type.contains(t));

    if mentions(SPIRITS_TOKENS) {
        BeverageType::Spirits
    } else if mentions(BEER_TOKENS) {
        BeverageType::Beer
    } else if mentions(WINE_TOKENS) {
        BeverageType::Wine
    } else {
        BeverageType::Spirits
    }
}
