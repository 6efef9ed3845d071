//! Face detection service seam.
//!
//! Detection itself is an external black box (a vision service or an
//! on-device model); this module only fixes the data the rest of the crate
//! consumes and the trait an embedder implements to plug a backend in.

use pathfinder_geometry::{rect::RectF, vector::Vector2F};
use thiserror::Error;

use crate::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("detector backend failed: `{0}`")]
    Backend(String),

    #[error("frame has no pixels")]
    EmptyFrame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceMode {
    Fast,
    Accurate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourMode {
    None,
    All,
}

/// Detector configuration handed to the backend.
#[derive(Clone, Copy, Debug)]
pub struct DetectorOptions {
    pub performance: PerformanceMode,
    pub contours: ContourMode,
    pub classification: bool,
    pub tracking: bool,
    /// Smallest face to report, relative to the frame's larger side.
    pub min_face_size: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        DetectorOptions {
            performance: PerformanceMode::Fast,
            contours: ContourMode::All,
            classification: false,
            tracking: true,
            min_face_size: 0.1,
        }
    }
}

impl DetectorOptions {
    pub fn performance(mut self, mode: PerformanceMode) -> Self {
        self.performance = mode;
        self
    }

    pub fn contours(mut self, mode: ContourMode) -> Self {
        self.contours = mode;
        self
    }

    pub fn classification(mut self, enabled: bool) -> Self {
        self.classification = enabled;
        self
    }

    pub fn tracking(mut self, enabled: bool) -> Self {
        self.tracking = enabled;
        self
    }
}

/// The landmark positions a detection service reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandmarkKind {
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftCheek,
    RightCheek,
    NoseBase,
    MouthLeft,
    MouthRight,
    MouthBottom,
}

#[derive(Clone, Copy, Debug)]
pub struct Landmark {
    pub kind: LandmarkKind,
    /// Position in frame (buffer) pixels.
    pub position: Vector2F,
}

/// One detected face, in frame (buffer) pixel coordinates.
#[derive(Clone, Debug)]
pub struct Face {
    pub bounding_box: RectF,
    pub tracking_id: Option<i32>,
    /// Full face contour, empty unless contour detection is enabled.
    pub contour: Vec<Vector2F>,
    pub landmarks: Vec<Landmark>,
    pub smiling_probability: Option<f32>,
    pub left_eye_open_probability: Option<f32>,
    pub right_eye_open_probability: Option<f32>,
}

impl Face {
    pub fn new(bounding_box: RectF) -> Face {
        Face {
            bounding_box,
            tracking_id: None,
            contour: Vec::new(),
            landmarks: Vec::new(),
            smiling_probability: None,
            left_eye_open_probability: None,
            right_eye_open_probability: None,
        }
    }

    pub fn landmark(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.landmarks.iter().find(|landmark| landmark.kind == kind)
    }
}

/// Pluggable face detection backend.
///
/// Implementations may be stateful (tracking ids across frames), hence
/// `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Face>, DetectError>;
}

/// Scripted stand-in backend: replays a fixed face list, filtered through
/// [`DetectorOptions`] the way a real service would. Useful for wiring up
/// the pipeline in demos and tests without a real model.
pub struct StaticDetector {
    faces: Vec<Face>,
    options: DetectorOptions,
}

impl StaticDetector {
    pub fn new(faces: Vec<Face>) -> StaticDetector {
        StaticDetector::with_options(faces, DetectorOptions::default())
    }

    pub fn with_options(faces: Vec<Face>, options: DetectorOptions) -> StaticDetector {
        StaticDetector { faces, options }
    }
}

impl FaceDetector for StaticDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Face>, DetectError> {
        if frame.data().is_empty() {
            return Err(DetectError::EmptyFrame);
        }

        let min_side = self.options.min_face_size * frame.width().max(frame.height()) as f32;
        let faces = self
            .faces
            .iter()
            .filter(|face| {
                face.bounding_box.size().x().max(face.bounding_box.size().y()) >= min_side
            })
            .map(|face| {
                let mut face = face.clone();
                if self.options.contours == ContourMode::None {
                    face.contour.clear();
                }
                if !self.options.classification {
                    face.smiling_probability = None;
                    face.left_eye_open_probability = None;
                    face.right_eye_open_probability = None;
                }
                if !self.options.tracking {
                    face.tracking_id = None;
                }
                face
            })
            .collect();
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_geometry::vector::{vec2f, vec2i};

    #[test]
    fn landmark_lookup() {
        let mut face = Face::new(RectF::new(vec2f(0.0, 0.0), vec2f(10.0, 10.0)));
        face.landmarks.push(Landmark {
            kind: LandmarkKind::LeftEye,
            position: vec2f(3.0, 3.0),
        });

        assert!(face.landmark(LandmarkKind::LeftEye).is_some());
        assert!(face.landmark(LandmarkKind::RightEye).is_none());
    }

    #[test]
    fn default_options_match_fast_contour_tracking() {
        let options = DetectorOptions::default();
        assert_eq!(options.performance, PerformanceMode::Fast);
        assert_eq!(options.contours, ContourMode::All);
        assert!(options.tracking);
        assert!(!options.classification);
    }

    #[test]
    fn static_detector_replays_faces() {
        let face = Face::new(RectF::new(vec2f(1.0, 2.0), vec2f(3.0, 4.0)));
        let mut detector = StaticDetector::new(vec![face]);

        let frame = Frame::solid(vec2i(4, 4), pathfinder_color::ColorU::white()).unwrap();
        let faces = detector.detect(&frame).unwrap();
        assert_eq!(faces.len(), 1);
    }

    #[test]
    fn options_filter_detector_output() {
        let mut face = Face::new(RectF::new(vec2f(0.0, 0.0), vec2f(50.0, 50.0)));
        face.contour = vec![vec2f(1.0, 1.0)];
        face.tracking_id = Some(7);
        face.smiling_probability = Some(0.9);

        let options = DetectorOptions::default()
            .contours(ContourMode::None)
            .tracking(false);
        let mut detector = StaticDetector::with_options(vec![face], options);

        let frame = Frame::solid(vec2i(100, 100), pathfinder_color::ColorU::white()).unwrap();
        let faces = detector.detect(&frame).unwrap();
        assert_eq!(faces.len(), 1);
        assert!(faces[0].contour.is_empty());
        assert_eq!(faces[0].tracking_id, None);
        // classification is off by default
        assert_eq!(faces[0].smiling_probability, None);
    }

    #[test]
    fn small_faces_fall_below_the_size_floor() {
        let small = Face::new(RectF::new(vec2f(0.0, 0.0), vec2f(4.0, 4.0)));
        let mut detector = StaticDetector::new(vec![small]);

        // min_face_size defaults to 0.1: a 4px face in a 100px frame drops.
        let frame = Frame::solid(vec2i(100, 100), pathfinder_color::ColorU::white()).unwrap();
        assert!(detector.detect(&frame).unwrap().is_empty());
    }
}
