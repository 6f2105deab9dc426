use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::models::batch::BatchSnapshot;

struct Entry {
    inserted_at: Instant,
    snapshot: Arc<BatchSnapshot>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Batch ids, oldest first.
    order: VecDeque<String>,
}

/// In-memory store of finished batch snapshots for export.
///
/// Holds at most `capacity` snapshots; the oldest is evicted first. Entries
/// older than `ttl` are dropped on insert and ignored on lookup.
pub struct BatchStore {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl BatchStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn insert(&self, snapshot: BatchSnapshot) -> Arc<BatchSnapshot> {
        let snapshot = Arc::new(snapshot);
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        self.purge_expired(&mut inner, now);
        if inner.entries.remove(&snapshot.batch_id).is_some() {
            inner.order.retain(|id| id != &snapshot.batch_id);
        }
        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                tracing::debug!(batch_id = %oldest, "Evicted batch snapshot");
            }
        }

        inner.order.push_back(snapshot.batch_id.clone());
        inner.entries.insert(
            snapshot.batch_id.clone(),
            Entry {
                inserted_at: now,
                snapshot: Arc::clone(&snapshot),
            },
        );
        metrics::gauge!("batch_store_snapshots").set(inner.entries.len() as f64);

        snapshot
    }

    pub fn get(&self, batch_id: &str) -> Option<Arc<BatchSnapshot>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .get(batch_id)
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.snapshot))
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, inner: &mut Inner, now: Instant) {
        while let Some(oldest) = inner.order.front() {
            let expired = inner
                .entries
                .get(oldest)
                .map_or(true, |e| now.duration_since(e.inserted_at) >= self.ttl);
            if !expired {
                break;
            }
            if let Some(id) = inner.order.pop_front() {
                inner.entries.remove(&id);
            }
        }
    }
}
