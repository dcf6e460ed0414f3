//! TrackerPipeline for combining detection with tracking.

use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::integration::detector::{DetectionSource, Frame, RawDetection};
use crate::integration::filter::DetectionFilter;
use crate::integration::worker::{DetectionWorker, FrameOutcome};
use crate::tracker::{SharedStore, StoreEvent, TrackedItem};

type ErrorHandler = Box<dyn FnMut(&Error) + Send>;

/// Applies detector results to a tracking store.
///
/// Each detector result is filtered and ingested as one step; a failed
/// result is reported to the error handler and leaves the store unchanged.
/// The store handle can be cloned out with [`TrackerPipeline::store`] for
/// renderers and counters.
pub struct TrackerPipeline {
    filter: DetectionFilter,
    store: SharedStore,
    on_error: Option<ErrorHandler>,
    detecting: bool,
}

impl Default for TrackerPipeline {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl TrackerPipeline {
    pub fn new(config: Config) -> Self {
        Self::with_store(
            DetectionFilter::new(config.filter),
            SharedStore::new(config.store),
        )
    }

    /// Build a pipeline writing into an existing store.
    pub fn with_store(filter: DetectionFilter, store: SharedStore) -> Self {
        Self {
            filter,
            store,
            on_error: None,
            detecting: true,
        }
    }

    /// Register a callback invoked for every detector failure.
    pub fn on_error(mut self, handler: impl FnMut(&Error) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Apply one frame's detector result.
    ///
    /// Returns the number of new tracked items, or the detector failure.
    pub fn apply<E: std::fmt::Display>(
        &mut self,
        result: std::result::Result<Vec<RawDetection>, E>,
    ) -> Result<usize> {
        match result {
            Ok(detections) => {
                let candidates = self.filter.filter(&detections);
                Ok(self.store.ingest(candidates))
            }
            Err(err) => {
                let err = Error::Detector(err.to_string());
                log::error!("detection failed: {err}");
                if let Some(handler) = self.on_error.as_mut() {
                    handler(&err);
                }
                Err(err)
            }
        }
    }

    /// Apply a result delivered by a [`DetectionWorker`].
    pub fn apply_outcome(&mut self, outcome: FrameOutcome) -> Result<usize> {
        log::trace!("applying result for frame {}", outcome.frame_id);
        self.apply(outcome.result)
    }

    /// Apply every outcome the worker has ready without blocking.
    ///
    /// Returns the total number of new tracked items; failed frames are
    /// reported through the error handler and skipped. Fails only when the
    /// worker thread is gone.
    pub fn drain(&mut self, worker: &mut DetectionWorker) -> Result<usize> {
        let mut added = 0;
        while let Some(outcome) = worker.try_recv()? {
            if let Ok(n) = self.apply_outcome(outcome) {
                added += n;
            }
        }
        Ok(added)
    }

    /// Run `detector` on `frame` and apply the result synchronously.
    ///
    /// Does nothing while detection is paused.
    pub fn process_frame<D: DetectionSource>(
        &mut self,
        detector: &mut D,
        frame: &Frame,
    ) -> Result<usize> {
        if !self.detecting {
            return Ok(0);
        }
        let result = detector.detect(frame);
        self.apply(result)
    }

    /// Pause or resume detection for [`TrackerPipeline::process_frame`].
    pub fn set_detecting(&mut self, detecting: bool) {
        if self.detecting != detecting {
            log::debug!("detection {}", if detecting { "resumed" } else { "paused" });
        }
        self.detecting = detecting;
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn evict_older_than(&self, max_age_ms: u64) -> usize {
        self.store.evict_older_than(max_age_ms)
    }

    pub fn snapshot(&self) -> Arc<Vec<TrackedItem>> {
        self.store.snapshot()
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Get a handle to the underlying store.
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn filter(&self) -> &DetectionFilter {
        &self.filter
    }
}
