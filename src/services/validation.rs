use crate::models::label::{
    BeverageType, ExtractedFields, FieldResult, FieldStatus, OverallStatus, FIELD_ALCOHOL_CONTENT,
    FIELD_BRAND_NAME, FIELD_CLASS_TYPE, FIELD_GOVERNMENT_WARNING, FIELD_NAME_ADDRESS,
    FIELD_NET_CONTENTS,
};
use crate::services::health_warning::{self, WARNING_CFR};

/// Reason attached to every ESCALATE disposition.
pub const ESCALATION_REASON: &str = "Unreadable or ambiguous field values require human review";

const ABV_TOKEN: &str = "ABV";

/// One mandatory label statement and the regulation requiring it.
#[derive(Debug, Clone, Copy)]
pub struct RequiredField {
    pub field: &'static str,
    pub cfr: &'static str,
}

/// How a category treats the non-permitted "ABV" abbreviation.
#[derive(Debug, Clone, Copy)]
pub enum AbvCheck {
    /// Checked inside the required-field loop, on `alcohol_content`.
    Inline,
    /// Checked after the loop when a value is present, as an extra result
    /// citing its own regulation.
    Trailing { cfr: &'static str },
}

/// Mandatory-statement rules for one beverage category.
#[derive(Debug)]
pub struct CategoryRules {
    pub category: BeverageType,
    pub missing_context: &'static str,
    pub required: &'static [RequiredField],
    pub abv_check: AbvCheck,
}

/// Distilled spirits, 27 CFR Part 5.
pub static SPIRITS_RULES: CategoryRules = CategoryRules {
    category: BeverageType::Spirits,
    missing_context: "distilled spirits",
    required: &[
        RequiredField { field: FIELD_BRAND_NAME, cfr: "27 CFR 5.32" },
        RequiredField { field: FIELD_CLASS_TYPE, cfr: "27 CFR 5.32" },
        RequiredField { field: FIELD_ALCOHOL_CONTENT, cfr: "27 CFR 5.37" },
        RequiredField { field: FIELD_NET_CONTENTS, cfr: "27 CFR 5.38" },
        RequiredField { field: FIELD_NAME_ADDRESS, cfr: "27 CFR 5.36" },
    ],
    abv_check: AbvCheck::Inline,
};

/// Malt beverages, 27 CFR Part 7.
pub static BEER_RULES: CategoryRules = CategoryRules {
    category: BeverageType::Beer,
    missing_context: "malt beverages",
    required: &[
        RequiredField { field: FIELD_BRAND_NAME, cfr: "27 CFR 7.64" },
        RequiredField { field: FIELD_CLASS_TYPE, cfr: "27 CFR 7.141" },
        RequiredField { field: FIELD_NET_CONTENTS, cfr: "27 CFR 7.70" },
        RequiredField { field: FIELD_NAME_ADDRESS, cfr: "27 CFR 7.66" },
    ],
    abv_check: AbvCheck::Trailing { cfr: "27 CFR 7.63" },
};

/// Wine, 27 CFR Part 4.
pub static WINE_RULES: CategoryRules = CategoryRules {
    category: BeverageType::Wine,
    missing_context: "wine >=7% ABV",
    required: &[
        RequiredField { field: FIELD_BRAND_NAME, cfr: "27 CFR 4.32" },
        RequiredField { field: FIELD_CLASS_TYPE, cfr: "27 CFR 4.34" },
        RequiredField { field: FIELD_ALCOHOL_CONTENT, cfr: "27 CFR 4.36" },
        RequiredField { field: FIELD_NET_CONTENTS, cfr: "27 CFR 4.72" },
        RequiredField { field: FIELD_NAME_ADDRESS, cfr: "27 CFR 4.35" },
    ],
    abv_check: AbvCheck::Inline,
};

pub fn rules_for(category: BeverageType) -> Option<&'static CategoryRules> {
    match category {
        BeverageType::Spirits => Some(&SPIRITS_RULES),
        BeverageType::Beer => Some(&BEER_RULES),
        BeverageType::Wine => Some(&WINE_RULES),
        BeverageType::Auto => None,
    }
}

fn uses_abv(value: &str) -> bool {
    value.to_uppercase().contains(ABV_TOKEN)
}

/// Evaluate a category's required fields, in table order.
pub fn validate_required_fields(
    rules: &CategoryRules,
    extracted: &ExtractedFields,
) -> Vec<FieldResult> {
    let mut results = Vec::with_capacity(rules.required.len() + 1);

    for req in rules.required {
        if extracted.is_unreadable(req.field) {
            results.push(FieldResult::unreadable(
                req.field,
                format!("{} unreadable after OCR retry", req.field),
                req.cfr,
            ));
            continue;
        }

        let Some(value) = extracted.get(req.field) else {
            results.push(FieldResult::fail(
                req.field,
                format!("{} missing — required for {}", req.field, rules.missing_context),
                Some(req.cfr),
            ));
            continue;
        };

        if matches!(rules.abv_check, AbvCheck::Inline)
            && req.field == FIELD_ALCOHOL_CONTENT
            && uses_abv(value)
        {
            results.push(
                FieldResult::unreadable(
                    req.field,
                    "Alcohol content format ambiguous: uses 'ABV'; requires agent review",
                    req.cfr,
                )
                .with_extracted(Some(value)),
            );
            continue;
        }

        results.push(FieldResult::pass(
            req.field,
            Some(value),
            extracted.image_index(req.field),
        ));
    }

    if let AbvCheck::Trailing { cfr } = rules.abv_check {
        if let Some(value) = extracted.get(FIELD_ALCOHOL_CONTENT).filter(|v| uses_abv(v)) {
            results.push(
                FieldResult::unreadable(
                    FIELD_ALCOHOL_CONTENT,
                    "Alcohol content uses non-permitted abbreviation 'ABV'; requires review",
                    cfr,
                )
                .with_extracted(Some(value)),
            );
        }
    }

    results
}

/// Government warning result, independent of category.
pub fn validate_government_warning(extracted: &ExtractedFields) -> FieldResult {
    let text = extracted.raw(FIELD_GOVERNMENT_WARNING);
    match health_warning::validate_warning_exact(text) {
        Ok(()) => FieldResult::pass(
            FIELD_GOVERNMENT_WARNING,
            text,
            extracted.image_index(FIELD_GOVERNMENT_WARNING),
        )
        .with_cfr(WARNING_CFR),
        Err(violation) => {
            FieldResult::fail(FIELD_GOVERNMENT_WARNING, violation.reason(), Some(WARNING_CFR))
                .with_extracted(text)
        }
    }
}

/// Full per-field evaluation for a resolved category.
pub fn validate_label(
    category: BeverageType,
    extracted: &ExtractedFields,
) -> Result<Vec<FieldResult>, UnsupportedCategory> {
    let rules = rules_for(category).ok_or(UnsupportedCategory(category))?;
    let mut fields = validate_required_fields(rules, extracted);
    fields.push(validate_government_warning(extracted));
    Ok(fields)
}

/// Fold field outcomes into one disposition. FAIL dominates ESCALATE.
pub fn aggregate_status(fields: &[FieldResult]) -> (OverallStatus, Option<String>) {
    if fields.iter().any(|f| f.status == FieldStatus::Fail) {
        (OverallStatus::Fail, None)
    } else if fields.iter().any(|f| f.status == FieldStatus::Unreadable) {
        (OverallStatus::Escalate, Some(ESCALATION_REASON.to_string()))
    } else {
        (OverallStatus::Pass, None)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no validation rules for beverage type '{0}'")]
pub struct UnsupportedCategory(pub BeverageType);
