use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::models::batch::LabelGroup;
use crate::models::label::{
    BeverageType, ExtractedFields, FieldResult, FieldStatus, LabelVerificationResult,
    OverallStatus,
};
use crate::services::ocr::{ExtractionError, LabelExtractor, LabelImage};
use crate::services::resolver::resolve_beverage_type;
use crate::services::storage::{extension_of, LocalStorage, StorageError};
use crate::services::validation::{self, UnsupportedCategory};

/// Synthetic field reported when extraction fails.
pub const OCR_EXTRACTION_FIELD: &str = "ocr_extraction";

/// Synthetic field reported for any other failure.
pub const PROCESSING_FIELD: &str = "processing";

/// Why a label could not be verified normally.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Provider missing or failing; the label is reported as FAIL.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Anything else; the label is reported as ERROR.
    #[error("{0}")]
    Processing(String),
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        PipelineError::Processing(e.to_string())
    }
}

impl From<UnsupportedCategory> for PipelineError {
    fn from(e: UnsupportedCategory) -> Self {
        PipelineError::Processing(e.to_string())
    }
}

/// Single-label verification: load images, extract, resolve, validate, aggregate.
pub struct VerificationPipeline {
    extractor: Arc<dyn LabelExtractor>,
    storage: Arc<LocalStorage>,
}

impl VerificationPipeline {
    pub fn new(extractor: Arc<dyn LabelExtractor>, storage: Arc<LocalStorage>) -> Self {
        Self { extractor, storage }
    }

    /// Verify one label group. Never fails: every failure is folded into
    /// the returned result so one label cannot affect another.
    pub async fn verify_label_group(&self, group: &LabelGroup) -> LabelVerificationResult {
        let start = Instant::now();
        tracing::info!(
            label_id = %group.label_id,
            label_name = %group.label_name,
            beverage_type = %group.beverage_type,
            image_count = group.images.len(),
            "Label verification started"
        );

        let outcome = match AssertUnwindSafe(self.run(group)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(PipelineError::Processing(panic_message(panic.as_ref()))),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(PipelineError::Extraction(e)) => {
                tracing::error!(
                    label_id = %group.label_id,
                    label_name = %group.label_name,
                    error = %e,
                    "Label verification extraction failure"
                );
                failure_result(
                    group,
                    OverallStatus::Fail,
                    FieldResult::fail(OCR_EXTRACTION_FIELD, e.to_string(), None),
                )
            }
            Err(PipelineError::Processing(msg)) => {
                tracing::error!(
                    label_id = %group.label_id,
                    label_name = %group.label_name,
                    error = %msg,
                    "Label verification error"
                );
                failure_result(
                    group,
                    OverallStatus::Error,
                    FieldResult::fail(PROCESSING_FIELD, format!("Processing error: {msg}"), None),
                )
            }
        };

        metrics::counter!(
            "label_verifications_total",
            "status" => result.overall_status.to_string()
        )
        .increment(1);
        metrics::histogram!("label_verification_seconds").record(start.elapsed().as_secs_f64());

        result
    }

    async fn run(&self, group: &LabelGroup) -> Result<LabelVerificationResult, PipelineError> {
        let mut images = Vec::with_capacity(group.images.len());
        for image in &group.images {
            images.push(LabelImage {
                bytes: self.storage.read(&image.storage_key).await?,
                extension: extension_of(&image.storage_key),
                filename: image.filename.clone(),
            });
        }
        tracing::debug!(label_id = %group.label_id, "Label images loaded");

        let extracted = self.two_pass_extract(group, &images).await?;

        let beverage_type = resolve_beverage_type(group.beverage_type, &extracted);
        if group.beverage_type.is_auto() {
            tracing::info!(
                label_id = %group.label_id,
                resolved_beverage_type = %beverage_type,
                "Auto beverage type resolved"
            );
        }

        let fields = validation::validate_label(beverage_type, &extracted)?;
        tracing::debug!(
            label_id = %group.label_id,
            field_count = fields.len(),
            fail_count = fields.iter().filter(|f| f.status == FieldStatus::Fail).count(),
            unreadable_count = fields.iter().filter(|f| f.status == FieldStatus::Unreadable).count(),
            "Field validation complete"
        );

        let (overall_status, escalation_reason) = validation::aggregate_status(&fields);
        tracing::info!(
            label_id = %group.label_id,
            status = %overall_status,
            "Label verification finished"
        );

        Ok(LabelVerificationResult {
            label_id: group.label_id.clone(),
            label_name: group.label_name.clone(),
            overall_status,
            beverage_type,
            fields,
            escalation_reason,
            images_processed: group.images.len(),
        })
    }

    /// Baseline extraction, then exactly one targeted retry when the
    /// baseline reports unreadable fields. The retry output replaces the
    /// baseline entirely.
    async fn two_pass_extract(
        &self,
        group: &LabelGroup,
        images: &[LabelImage],
    ) -> Result<ExtractedFields, ExtractionError> {
        let pass_one = self
            .extractor
            .extract(images, group.beverage_type, false)
            .await?;
        metrics::counter!("extraction_passes_total", "pass" => "1").increment(1);
        tracing::info!(
            label_id = %group.label_id,
            unreadable_fields = ?pass_one.unreadable,
            "OCR pass 1 complete"
        );

        if pass_one.unreadable.is_empty() {
            return Ok(pass_one);
        }

        let pass_two = self
            .extractor
            .extract(images, group.beverage_type, true)
            .await?;
        metrics::counter!("extraction_passes_total", "pass" => "2").increment(1);
        tracing::info!(
            label_id = %group.label_id,
            unreadable_fields = ?pass_two.unreadable,
            "OCR retry complete"
        );
        Ok(pass_two)
    }
}

/// Single-field result for a label that could not be verified.
pub fn failure_result(
    group: &LabelGroup,
    overall_status: OverallStatus,
    field: FieldResult,
) -> LabelVerificationResult {
    let beverage_type = if group.beverage_type.is_auto() {
        BeverageType::Spirits
    } else {
        group.beverage_type
    };
    LabelVerificationResult {
        label_id: group.label_id.clone(),
        label_name: group.label_name.clone(),
        overall_status,
        beverage_type,
        fields: vec![field],
        escalation_reason: None,
        images_processed: group.images.len(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "label pipeline panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batch::ImageRef;

    fn group(beverage_type: BeverageType) -> LabelGroup {
        LabelGroup {
            label_id: "l1".to_string(),
            label_name: "Label".to_string(),
            beverage_type,
            images: vec![ImageRef {
                id: "i".to_string(),
                filename: "f.png".to_string(),
                storage_key: "k.png".to_string(),
            }],
        }
    }

    #[test]
    fn test_failure_result_forces_spirits_for_auto() {
        let field = FieldResult::fail(OCR_EXTRACTION_FIELD, "down", None);
        let result = failure_result(&group(BeverageType::Auto), OverallStatus::Fail, field.clone());
        assert_eq!(result.beverage_type, BeverageType::Spirits);
        assert_eq!(result.images_processed, 1);
        assert_eq!(result.fields, vec![field.clone()]);

        let wine = failure_result(&group(BeverageType::Wine), OverallStatus::Fail, field);
        assert_eq!(wine.beverage_type, BeverageType::Wine);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "label pipeline panicked");
    }
}
