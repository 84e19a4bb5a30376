//! Aggregated load-progress tracking for the two models
//!
//! Each model reports progress independently; observers see a single
//! aggregate (the arithmetic mean of the two percentages). The knowledge
//! base fetch is not instrumented and does not factor in.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::provider::ProgressEvent;

/// Phase label handed to observers alongside the aggregate percentage
pub const PHASE_MODELS: &str = "models";

/// Observer callback: `(aggregate_percent, phase_label)`
pub type ProgressListener = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// Which model a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPhase {
    Embedder,
    Generator,
}

/// Tracks both model loads and publishes a non-regressing aggregate.
///
/// Invariants enforced at the publish boundary:
///   - each per-model percentage is monotonically non-decreasing,
///   - a terminal `Done` maps to exactly 100 regardless of the last
///     numeric event,
///   - the published aggregate never regresses.
pub struct ProgressTracker {
    inner: Mutex<TrackerInner>,
}

struct TrackerInner {
    embedder: f32,
    generator: f32,
    published: f32,
    listener: Option<ProgressListener>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                embedder: 0.0,
                generator: 0.0,
                published: 0.0,
                listener: None,
            }),
        }
    }

    /// Register the single progress observer
    pub fn set_listener(&self, listener: impl Fn(f32, &str) + Send + Sync + 'static) {
        self.inner.lock().listener = Some(Arc::new(listener));
    }

    /// Current published aggregate percentage
    pub fn aggregate(&self) -> f32 {
        self.inner.lock().published
    }

    /// Apply one provider event and republish the aggregate.
    ///
    /// The aggregate is computed under the lock; the observer is invoked
    /// after release so a listener may call back into the tracker.
    pub fn update(&self, phase: ModelPhase, event: ProgressEvent) {
        let (aggregate, listener) = {
            let mut inner = self.inner.lock();

            let percent = match event {
                ProgressEvent::InProgress(p) => p.clamp(0.0, 100.0),
                ProgressEvent::Done => 100.0,
            };
            match phase {
                ModelPhase::Embedder => inner.embedder = inner.embedder.max(percent),
                ModelPhase::Generator => inner.generator = inner.generator.max(percent),
            }

            let mean = (inner.embedder + inner.generator) / 2.0;
            inner.published = inner.published.max(mean);

            (inner.published, inner.listener.clone())
        };

        if let Some(listener) = listener {
            listener(aggregate, PHASE_MODELS);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
