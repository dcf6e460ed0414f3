//! Runs a detector on its own thread, one frame at a time.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{Error, Result};
use crate::integration::detector::{DetectionSource, Frame, RawDetection};

/// Result of running the detector on one submitted frame.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Id returned by [`DetectionWorker::submit`]
    pub frame_id: u64,
    /// Detections, or the detector's error message
    pub result: std::result::Result<Vec<RawDetection>, String>,
}

/// Asynchronous front end for a [`DetectionSource`].
///
/// At most one frame is in flight: a new frame is accepted only after the
/// outcome of the previous one has been received. Every accepted frame
/// yields exactly one [`FrameOutcome`].
pub struct DetectionWorker {
    frames: Option<Sender<(u64, Frame)>>,
    outcomes: Receiver<FrameOutcome>,
    handle: Option<JoinHandle<()>>,
    next_frame_id: u64,
    in_flight: bool,
}

impl DetectionWorker {
    /// Move `detector` onto a dedicated thread.
    pub fn spawn<D>(mut detector: D) -> Result<Self>
    where
        D: DetectionSource + Send + 'static,
    {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<(u64, Frame)>(1);
        let (outcome_tx, outcome_rx) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name("detection-worker".to_string())
            .spawn(move || {
                for (frame_id, frame) in frame_rx {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        detector.detect(&frame).map_err(|e| e.to_string())
                    }))
                    .unwrap_or_else(|payload| {
                        let msg = panic_message(payload.as_ref());
                        log::error!("detector panicked on frame {frame_id}: {msg}");
                        Err(format!("detector panicked: {msg}"))
                    });
                    if let Ok(ref detections) = result {
                        log::debug!("frame {frame_id}: {} detections", detections.len());
                    }
                    if outcome_tx.send(FrameOutcome { frame_id, result }).is_err() {
                        break;
                    }
                }
                log::debug!("detection worker stopped");
            })?;

        Ok(Self {
            frames: Some(frame_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
            next_frame_id: 0,
            in_flight: false,
        })
    }

    /// Hand a frame to the detector. Fails with [`Error::WorkerBusy`] while
    /// the previous frame's outcome has not been received.
    pub fn submit(&mut self, frame: Frame) -> Result<u64> {
        if self.in_flight {
            return Err(Error::WorkerBusy);
        }
        let frames = self.frames.as_ref().ok_or(Error::WorkerDisconnected)?;

        self.next_frame_id += 1;
        let frame_id = self.next_frame_id;
        frames
            .send((frame_id, frame))
            .map_err(|_| Error::WorkerDisconnected)?;
        self.in_flight = true;
        Ok(frame_id)
    }

    /// Take the pending outcome if it is ready.
    ///
    /// Returns `Ok(None)` while the detector is still working and
    /// [`Error::WorkerDisconnected`] once the worker thread is gone.
    pub fn try_recv(&mut self) -> Result<Option<FrameOutcome>> {
        match self.outcomes.try_recv() {
            Ok(outcome) => {
                self.in_flight = false;
                Ok(Some(outcome))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                Err(Error::WorkerDisconnected)
            }
        }
    }

    /// Block until the pending outcome arrives.
    pub fn recv(&mut self) -> Result<FrameOutcome> {
        if !self.in_flight {
            return Err(Error::NothingPending);
        }
        let outcome = self.outcomes.recv();
        self.in_flight = false;
        outcome.map_err(|_| Error::WorkerDisconnected)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        drop(self.frames.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("detection worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::builder::RawDetectionBuilder;
    use crate::integration::pipeline::TrackerPipeline;

    struct ScriptedDetector {
        frames: usize,
    }

    impl DetectionSource for ScriptedDetector {
        type Error = String;

        fn detect(&mut self, frame: &Frame) -> std::result::Result<Vec<RawDetection>, String> {
            self.frames += 1;
            if frame.width == 0 {
                return Err("empty frame".to_string());
            }
            let x = self.frames as f32 * 200.0;
            Ok(vec![
                RawDetectionBuilder::new()
                    .tlwh(x, 0.0, 100.0, 100.0)
                    .tracking_id(self.frames as u32)
                    .build(),
            ])
        }
    }

    #[test]
    fn test_one_frame_in_flight() {
        let mut worker = DetectionWorker::spawn(ScriptedDetector { frames: 0 }).unwrap();

        let id = worker.submit(Frame::new(vec![], 640, 480)).unwrap();
        assert!(worker.is_busy());
        assert!(matches!(
            worker.submit(Frame::new(vec![], 640, 480)),
            Err(Error::WorkerBusy)
        ));

        let outcome = worker.recv().unwrap();
        assert_eq!(outcome.frame_id, id);
        assert_eq!(outcome.result.unwrap().len(), 1);
        assert!(!worker.is_busy());
        assert!(matches!(worker.recv(), Err(Error::NothingPending)));
    }

    #[test]
    fn test_outcomes_feed_pipeline() {
        let mut worker = DetectionWorker::spawn(ScriptedDetector { frames: 0 }).unwrap();
        let mut pipeline = TrackerPipeline::default();

        for width in [640, 0, 640] {
            worker.submit(Frame::new(vec![], width, 480)).unwrap();
            let outcome = worker.recv().unwrap();
            let _ = pipeline.apply_outcome(outcome);
        }

        // Frame 2 failed, frames 1 and 3 each added a disjoint item.
        assert_eq!(pipeline.count(), 2);
        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot[0].confidence, 0.7);
        assert_eq!(snapshot[1].bbox.left, 600.0);
    }

    struct PanickingDetector {
        frames: usize,
    }

    impl DetectionSource for PanickingDetector {
        type Error = String;

        fn detect(&mut self, _frame: &Frame) -> std::result::Result<Vec<RawDetection>, String> {
            self.frames += 1;
            if self.frames == 1 {
                panic!("model crashed");
            }
            Ok(vec![
                RawDetectionBuilder::new()
                    .tlwh(0.0, 0.0, 100.0, 100.0)
                    .label("Food", 0.9)
                    .build(),
            ])
        }
    }

    #[test]
    fn test_detector_panic_loses_only_one_frame() {
        let mut worker = DetectionWorker::spawn(PanickingDetector { frames: 0 }).unwrap();
        let mut pipeline = TrackerPipeline::default();

        worker.submit(Frame::new(vec![], 640, 480)).unwrap();
        let outcome = worker.recv().unwrap();
        assert_eq!(
            outcome.result.as_ref().unwrap_err(),
            "detector panicked: model crashed"
        );
        assert!(!worker.is_busy());
        assert!(matches!(pipeline.apply_outcome(outcome), Err(Error::Detector(_))));

        worker.submit(Frame::new(vec![], 640, 480)).unwrap();
        let outcome = worker.recv().unwrap();
        assert_eq!(pipeline.apply_outcome(outcome).unwrap(), 1);
        assert_eq!(pipeline.count(), 1);
    }

    #[test]
    fn test_lost_worker_reports_disconnect() {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(1);
        let (outcome_tx, outcome_rx) = crossbeam_channel::bounded::<FrameOutcome>(1);
        drop(frame_rx);
        drop(outcome_tx);

        let mut worker = DetectionWorker {
            frames: Some(frame_tx),
            outcomes: outcome_rx,
            handle: None,
            next_frame_id: 1,
            in_flight: true,
        };
        assert!(matches!(worker.try_recv(), Err(Error::WorkerDisconnected)));
        assert!(!worker.is_busy());
        assert!(matches!(
            worker.submit(Frame::default()),
            Err(Error::WorkerDisconnected)
        ));

        worker.in_flight = true;
        assert!(matches!(worker.recv(), Err(Error::WorkerDisconnected)));
        assert!(!worker.is_busy());
    }

    #[test]
    fn test_try_recv_before_outcome_is_ready() {
        let mut worker = DetectionWorker::spawn(ScriptedDetector { frames: 0 }).unwrap();
        assert!(worker.try_recv().unwrap().is_none());

        worker.submit(Frame::new(vec![], 640, 480)).unwrap();
        let outcome = loop {
            if let Some(outcome) = worker.try_recv().unwrap() {
                break outcome;
            }
            thread::yield_now();
        };
        assert_eq!(outcome.frame_id, 1);
        assert!(!worker.is_busy());
    }

    #[test]
    fn test_pipeline_drains_ready_outcomes() {
        let mut worker = DetectionWorker::spawn(ScriptedDetector { frames: 0 }).unwrap();
        let mut pipeline = TrackerPipeline::default();

        worker.submit(Frame::new(vec![], 640, 480)).unwrap();
        let mut added = 0;
        while worker.is_busy() {
            added += pipeline.drain(&mut worker).unwrap();
            thread::yield_now();
        }
        assert_eq!(added, 1);
        assert_eq!(pipeline.drain(&mut worker).unwrap(), 0);
    }

    #[test]
    fn test_drop_with_pending_outcome() {
        let mut worker = DetectionWorker::spawn(ScriptedDetector { frames: 0 }).unwrap();
        worker.submit(Frame::new(vec![], 640, 480)).unwrap();
        drop(worker);
    }
}
