use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};

use crate::app_state::AppState;
use crate::models::batch::BatchVerifyRequest;
use crate::routes::error::ApiError;
use crate::services::batch::BatchStreamItem;
use crate::services::export::{export_rows, to_csv};

/// POST /verify/batch — verify label groups, streaming one event per label.
///
/// Events arrive in completion order as `data: <BatchProgressEvent>`,
/// followed by `event: done`.
pub async fn verify_batch_stream(
    State(state): State<AppState>,
    payload: Result<Json<BatchVerifyRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::ValidationRejected(e.body_text()))?;

    let handle = state.batches.start(request).map_err(|e| {
        tracing::warn!(error = %e, "Batch rejected");
        ApiError::from(e)
    })?;

    let stream = handle
        .into_stream()
        .map(|item| Ok::<_, Infallible>(to_sse_event(item)));
    Ok(Sse::new(stream))
}

fn to_sse_event(item: BatchStreamItem) -> Event {
    match item {
        BatchStreamItem::Progress(event) => match serde_json::to_string(&event) {
            Ok(json) => Event::default().data(json),
            Err(e) => Event::default().event("error").data(e.to_string()),
        },
        BatchStreamItem::Done { .. } => Event::default().event("done").data("done"),
    }
}

/// GET /verify/batch/{batch_id}/export.csv — one row per (label, field).
pub async fn export_batch_csv(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(snapshot) = state.store.get(&batch_id) else {
        tracing::warn!(batch_id = %batch_id, "CSV export missing batch");
        return Err(ApiError::NotFound("Batch not found".to_string()));
    };

    let rows = export_rows(&snapshot);
    let csv = to_csv(&rows);
    tracing::info!(
        batch_id = %batch_id,
        rows = rows.len(),
        labels = snapshot.results.len(),
        "CSV export generated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"batch-{batch_id}.csv\""),
            ),
        ],
        csv,
    )
        .into_response())
}
