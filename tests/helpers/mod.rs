//! Shared test scaffolding: a scripted extraction provider and state builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use label_compliance::app_state::AppState;
use label_compliance::config::AppConfig;
use label_compliance::models::batch::{BatchVerifyRequest, ImageRef, LabelGroup};
use label_compliance::models::label::{BeverageType, ExtractedFields};
use label_compliance::models::upload::UploadedImage;
use label_compliance::services::ocr::{ExtractionError, LabelExtractor, LabelImage};
use label_compliance::services::storage::LocalStorage;

use crate::fixtures::PNG_BYTES;

/// What the scripted provider answers for one pass.
#[derive(Clone)]
pub enum Reply {
    Fields(ExtractedFields),
    Unavailable,
    Failed(String),
    Panic,
}

#[derive(Clone)]
struct Script {
    first: Reply,
    retry: Reply,
    delay: Duration,
}

/// Extraction provider answering from a per-label script.
///
/// Labels are identified by the filename of their first image.
pub struct ScriptedExtractor {
    default: Reply,
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, bool)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(default: ExtractedFields) -> Self {
        Self {
            default: Reply::Fields(default),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn script(&self, filename: &str, first: Reply, retry: Reply) {
        self.script_with_delay(filename, first, retry, Duration::ZERO);
    }

    pub fn script_with_delay(&self, filename: &str, first: Reply, retry: Reply, delay: Duration) {
        self.scripts.lock().unwrap().insert(
            filename.to_string(),
            Script {
                first,
                retry,
                delay,
            },
        );
    }

    /// (first image filename, retry mode) per call, in call order.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, filename: &str) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter(|(f, _)| f == filename)
            .map(|(_, retry)| retry)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LabelExtractor for ScriptedExtractor {
    async fn extract(
        &self,
        images: &[LabelImage],
        _beverage_type: BeverageType,
        retry_mode: bool,
    ) -> Result<ExtractedFields, ExtractionError> {
        let key = images.first().map(|i| i.filename.clone()).unwrap_or_default();
        self.calls.lock().unwrap().push((key.clone(), retry_mode));

        let script = self.scripts.lock().unwrap().get(&key).cloned();
        let (reply, delay) = match script {
            Some(s) if retry_mode => (s.retry, s.delay),
            Some(s) => (s.first, s.delay),
            None => (self.default.clone(), Duration::ZERO),
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(delay.max(Duration::from_millis(5))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Fields(fields) => Ok(fields),
            Reply::Unavailable => Err(ExtractionError::Unavailable(
                "OPENAI_API_KEY is not configured".to_string(),
            )),
            Reply::Failed(msg) => Err(ExtractionError::Failed(msg)),
            Reply::Panic => panic!("scripted provider panic"),
        }
    }
}

/// Storage in a fresh temp dir, plus `count` uploaded PNGs named `<prefix>-<n>.png`.
pub async fn storage_with_images(prefix: &str, count: usize) -> (TempDir, LocalStorage, Vec<UploadedImage>) {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();
    let mut uploaded = Vec::new();
    for n in 0..count {
        let saved = storage
            .save_upload(&format!("{prefix}-{n}.png"), "image/png", PNG_BYTES)
            .await
            .unwrap();
        uploaded.push(saved);
    }
    (dir, storage, uploaded)
}

pub fn image_ref(uploaded: &UploadedImage) -> ImageRef {
    ImageRef {
        id: uploaded.id.clone(),
        filename: uploaded.filename.clone(),
        storage_key: uploaded.storage_key.clone(),
    }
}

pub fn label_group(label_id: &str, beverage_type: BeverageType, images: &[UploadedImage]) -> LabelGroup {
    LabelGroup {
        label_id: label_id.to_string(),
        label_name: format!("Label {label_id}"),
        beverage_type,
        images: images.iter().map(image_ref).collect(),
    }
}

/// Save one PNG per label and build a batch request over them.
///
/// Label `n` has id `label-<n>` and its image is named `label-<n>.png`, which
/// is the key `ScriptedExtractor` scripts are looked up by.
pub async fn batch_request(
    storage: &LocalStorage,
    count: usize,
    beverage_type: BeverageType,
) -> BatchVerifyRequest {
    let mut labels = Vec::with_capacity(count);
    for n in 0..count {
        let saved = storage
            .save_upload(&format!("label-{n}.png"), "image/png", PNG_BYTES)
            .await
            .unwrap();
        labels.push(label_group(&format!("label-{n}"), beverage_type, &[saved]));
    }
    BatchVerifyRequest { labels }
}

/// Application state over a temp upload dir and the given provider.
pub async fn test_state(
    extractor: Arc<ScriptedExtractor>,
    config: AppConfig,
) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();
    let state = AppState::new(config, storage, extractor);
    (dir, state)
}
