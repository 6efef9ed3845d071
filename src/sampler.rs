//! Periodic frame sampling and detection dispatch.
//!
//! Detection runs off the owning thread on a one-thread pool, gated by a
//! single in-flight flag: while a detection is running, newly sampled frames
//! are dropped rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use crate::detector::{Face, FaceDetector};
use crate::frame::Frame;

/// Default polling period for detection samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("failed to start detection thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Fixed-interval deadline tracker driving frame sampling.
pub struct SampleClock {
    interval: Duration,
    next: Option<Instant>,
}

impl SampleClock {
    pub fn new(interval: Duration) -> SampleClock {
        SampleClock {
            interval,
            next: None,
        }
    }

    /// True when a sample is due; arms the next deadline when it fires.
    pub fn should_sample(&mut self, now: Instant) -> bool {
        match self.next {
            Some(deadline) if now < deadline => false,
            _ => {
                self.next = Some(now + self.interval);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.next = None;
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        SampleClock::new(DEFAULT_SAMPLE_INTERVAL)
    }
}

/// Runs a [`FaceDetector`] on its own thread, one frame at a time.
pub struct DetectionScheduler<D> {
    pool: ThreadPool,
    detector: Arc<Mutex<D>>,
    in_flight: Arc<AtomicBool>,
    results_tx: Sender<Vec<Face>>,
    results_rx: Receiver<Vec<Face>>,
}

impl<D: FaceDetector + 'static> DetectionScheduler<D> {
    pub fn new(detector: D) -> Result<DetectionScheduler<D>, SchedulerError> {
        Self::with_builder(
            detector,
            ThreadPoolBuilder::new()
                .num_threads(1)
                .thread_name(|index| format!("face-detect-{}", index)),
        )
    }

    /// Builds the pool from caller-adjusted settings (see
    /// `Surface::adjust_thread_pool_settings`).
    pub fn with_builder(
        detector: D,
        builder: ThreadPoolBuilder,
    ) -> Result<DetectionScheduler<D>, SchedulerError> {
        let pool = builder.build()?;
        let (results_tx, results_rx) = channel();
        Ok(DetectionScheduler {
            pool,
            detector: Arc::new(Mutex::new(detector)),
            in_flight: Arc::new(AtomicBool::new(false)),
            results_tx,
            results_rx,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Hands a frame to the detector. Returns `false` (frame dropped) while
    /// a previous detection is still in flight.
    pub fn schedule(&self, frame: Frame) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            log::debug!("detection in flight, dropping sampled frame");
            return false;
        }

        let detector = Arc::clone(&self.detector);
        let in_flight = Arc::clone(&self.in_flight);
        let results_tx = self.results_tx.clone();

        self.pool.spawn(move || {
            // The in-flight flag already serializes detections; the mutex
            // only satisfies ownership across the pool boundary.
            let mut detector = match detector.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match detector.detect(&frame) {
                Ok(faces) => {
                    let _ = results_tx.send(faces);
                }
                Err(e) => log::warn!("face detection failed: {}", e),
            }
            drop(detector);
            in_flight.store(false, Ordering::Release);
        });

        true
    }

    /// Drains finished detections, oldest first.
    pub fn poll(&self) -> Vec<Vec<Face>> {
        self.results_rx.try_iter().collect()
    }
}
