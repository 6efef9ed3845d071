//! Live camera preview with face-detection overlay.
//!
//! The core is a pure calculator that maps the camera buffer onto the
//! preview surface (rotation correction + center-crop scale, see
//! [`transform`]); around it sit a renderer facade ([`preview`]), a
//! pluggable detection seam ([`detector`]), a sampling scheduler
//! ([`sampler`]), the annotation overlay ([`overlay`]) and a controller
//! ([`controller`]) the embedder drives from the thread that owns the
//! rendering surface.

pub mod controller;
pub mod detector;
pub mod frame;
pub mod overlay;
pub mod preview;
pub mod sampler;
pub mod surface;
pub mod transform;

pub use controller::{PreviewApp, PreviewOptions};
pub use detector::{
    ContourMode, DetectError, DetectorOptions, Face, FaceDetector, Landmark, LandmarkKind,
    PerformanceMode, StaticDetector,
};
pub use frame::{Frame, FrameError};
pub use overlay::{FrameToView, LensFacing, OverlayOptions};
pub use preview::{PreviewError, PreviewRenderer};
pub use sampler::{DetectionScheduler, SampleClock, SchedulerError, DEFAULT_SAMPLE_INTERVAL};
pub use surface::{MemResourceLoader, Surface, SurfaceEvent, SurfaceSize};
pub use transform::{compute_preview_transform, DisplayRotation, TransformState};
