//! Batch orchestration: bounded fan-out of label pipelines with progress
//! events streamed in completion order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::Stream;
use garde::Validate;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::models::batch::{BatchSnapshot, BatchVerifyRequest, LabelGroup};
use crate::models::label::{
    BatchProgressEvent, FieldResult, LabelVerificationResult, OverallStatus,
};
use crate::services::batch_store::BatchStore;
use crate::services::pipeline::{failure_result, VerificationPipeline, PROCESSING_FIELD};

/// Default number of label pipelines running at once within a batch.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Item on a batch's event stream.
#[derive(Debug, Clone)]
pub enum BatchStreamItem {
    Progress(BatchProgressEvent),
    /// Terminal marker, sent once after the snapshot is stored.
    Done { batch_id: String, completed: usize },
}

/// A running batch: its id and the live event stream.
pub struct BatchHandle {
    pub batch_id: String,
    pub total: usize,
    pub events: mpsc::Receiver<BatchStreamItem>,
}

impl BatchHandle {
    pub fn into_stream(self) -> impl Stream<Item = BatchStreamItem> + Send {
        futures::stream::unfold(self.events, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
    }
}

/// Runs batches of label verifications and stores their snapshots.
pub struct BatchRunner {
    pipeline: Arc<VerificationPipeline>,
    store: Arc<BatchStore>,
    concurrency: usize,
    max_batch_size: usize,
}

impl BatchRunner {
    pub fn new(
        pipeline: Arc<VerificationPipeline>,
        store: Arc<BatchStore>,
        concurrency: usize,
        max_batch_size: usize,
    ) -> Self {
        Self {
            pipeline,
            store,
            concurrency: concurrency.max(1),
            max_batch_size,
        }
    }

    /// Reject malformed requests before any work starts.
    pub fn validate(&self, request: &BatchVerifyRequest) -> Result<(), BatchError> {
        if request.labels.len() > self.max_batch_size {
            return Err(BatchError::TooLarge {
                limit: self.max_batch_size,
            });
        }
        request
            .validate()
            .map_err(|report| BatchError::Invalid(report.to_string()))
    }

    /// Validate and launch a batch. Must be called within a Tokio runtime.
    ///
    /// The batch runs to completion even if the returned handle is dropped.
    pub fn start(&self, request: BatchVerifyRequest) -> Result<BatchHandle, BatchError> {
        self.validate(&request)?;

        let batch_id = Uuid::new_v4().to_string();
        let total = request.labels.len();
        let (tx, rx) = mpsc::channel(total + 1);

        tracing::info!(batch_id = %batch_id, total_labels = total, "Batch requested");
        metrics::counter!("batches_started_total").increment(1);

        tokio::spawn(run_batch(
            Arc::clone(&self.pipeline),
            Arc::clone(&self.store),
            self.concurrency,
            batch_id.clone(),
            request.labels,
            tx,
        )
        .in_current_span());

        Ok(BatchHandle {
            batch_id,
            total,
            events: rx,
        })
    }

    /// Run a batch and wait for its snapshot, discarding progress events.
    pub async fn run_to_completion(
        &self,
        request: BatchVerifyRequest,
    ) -> Result<Arc<BatchSnapshot>, BatchError> {
        let mut handle = self.start(request)?;
        while let Some(item) = handle.events.recv().await {
            if let BatchStreamItem::Done { batch_id, .. } = item {
                return self.store.get(&batch_id).ok_or(BatchError::Interrupted);
            }
        }
        Err(BatchError::Interrupted)
    }
}

async fn run_batch(
    pipeline: Arc<VerificationPipeline>,
    store: Arc<BatchStore>,
    concurrency: usize,
    batch_id: String,
    labels: Vec<LabelGroup>,
    tx: mpsc::Sender<BatchStreamItem>,
) {
    let total = labels.len();
    let started_at = Utc::now();
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut pending: HashMap<usize, LabelGroup> = HashMap::with_capacity(total);
    let mut tasks = JoinSet::new();

    for (index, group) in labels.into_iter().enumerate() {
        pending.insert(index, group.clone());
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(
            async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, pipeline.verify_label_group(&group).await)
            }
            .in_current_span(),
        );
    }

    let mut completed = 0;
    let mut results = Vec::with_capacity(total);
    let mut emit = |result: LabelVerificationResult, results: &mut Vec<LabelVerificationResult>| {
        completed += 1;
        tracing::info!(
            batch_id = %batch_id,
            label_id = %result.label_id,
            label_name = %result.label_name,
            status = %result.overall_status,
            progress = %format!("{completed}/{total}"),
            "Batch label completed"
        );
        let event = BatchProgressEvent {
            batch_id: batch_id.clone(),
            completed,
            total,
            result: result.clone(),
        };
        results.push(result);
        // A departed client does not stop the batch.
        if tx.try_send(BatchStreamItem::Progress(event)).is_err() {
            tracing::debug!(batch_id = %batch_id, "Progress receiver gone");
        }
    };

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                pending.remove(&index);
                emit(result, &mut results);
            }
            Err(e) => tracing::error!(batch_id = %batch_id, error = %e, "Label task aborted"),
        }
    }

    // Labels whose task died without reporting still count toward the batch.
    let mut orphaned: Vec<_> = pending.into_iter().collect();
    orphaned.sort_by_key(|(index, _)| *index);
    for (_, group) in orphaned {
        let field = FieldResult::fail(
            PROCESSING_FIELD,
            "Processing error: label task aborted",
            None,
        );
        emit(failure_result(&group, OverallStatus::Error, field), &mut results);
    }

    let completed = results.len();
    let finished_at = Utc::now();
    store.insert(BatchSnapshot {
        batch_id: batch_id.clone(),
        total,
        completed,
        started_at,
        finished_at,
        results,
    });
    metrics::counter!("batches_completed_total").increment(1);
    tracing::info!(
        batch_id = %batch_id,
        completed,
        duration_ms = (finished_at - started_at).num_milliseconds(),
        "Batch finished"
    );

    let _ = tx.try_send(BatchStreamItem::Done { batch_id, completed });
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Batch limit is {limit}")]
    TooLarge { limit: usize },

    #[error("Invalid batch request: {0}")]
    Invalid(String),

    #[error("Batch ended without a snapshot")]
    Interrupted,
}
