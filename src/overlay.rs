//! Face annotation overlay.
//!
//! Builds vector outlines for detected faces in view space: a dot at the
//! face center, a stroked bounding box, contour and landmark dots, and
//! probability bars for classification values. Dot radii and stroke widths
//! are fixed in view pixels and are not scaled by the frame-to-view mapping.

use std::sync::atomic::{AtomicUsize, Ordering};

use lazy_static::lazy_static;
use pathfinder_color::ColorU;
use pathfinder_content::outline::{Contour, Outline};
use pathfinder_content::stroke::{LineCap, LineJoin, OutlineStrokeToFill, StrokeStyle};
use pathfinder_geometry::rect::RectF;
use pathfinder_geometry::transform2d::Transform2F;
use pathfinder_geometry::vector::{vec2f, Vector2F, Vector2I};
use pathfinder_renderer::paint::Paint;
use pathfinder_renderer::scene::{DrawPath, Scene};

use crate::detector::{Face, LandmarkKind};

const FACE_POSITION_RADIUS: f32 = 7.0;
const BOX_STROKE_WIDTH: f32 = 5.0;
const BAR_HEIGHT: f32 = 6.0;
const BAR_GAP: f32 = 2.0;

lazy_static! {
    static ref COLOR_CHOICES: [ColorU; 7] = [
        ColorU::new(0x00, 0x00, 0xff, 0xff), // blue
        ColorU::new(0x00, 0xff, 0x00, 0xff), // green
        ColorU::new(0x00, 0xff, 0xff, 0xff), // cyan
        ColorU::new(0xff, 0x00, 0xff, 0xff), // magenta
        ColorU::new(0xff, 0x00, 0x00, 0xff), // red
        ColorU::new(0xff, 0xff, 0xff, 0xff), // white
        ColorU::new(0xff, 0xff, 0x00, 0xff), // yellow
    ];
}

static COLOR_INDEX: AtomicUsize = AtomicUsize::new(0);

fn next_color() -> ColorU {
    let index = COLOR_INDEX.fetch_add(1, Ordering::Relaxed);
    COLOR_CHOICES[index % COLOR_CHOICES.len()]
}

/// Which camera the frames come from. A front-facing lens mirrors the
/// preview (and therefore the overlay) horizontally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LensFacing {
    Front,
    Back,
}

impl LensFacing {
    pub fn toggled(self) -> LensFacing {
        match self {
            LensFacing::Front => LensFacing::Back,
            LensFacing::Back => LensFacing::Front,
        }
    }
}

/// Maps frame (buffer) pixels into view pixels: buffer-to-view stretch,
/// then the preview transform, then the front-lens mirror if any. The same
/// mapping positions the frame pattern and the face annotations, so the
/// overlay stays glued to the video under every rotation and crop.
#[derive(Clone, Copy, Debug)]
pub struct FrameToView(pub Transform2F);

impl FrameToView {
    pub fn new(
        preview_transform: Transform2F,
        buffer_dims: Vector2I,
        view_dims: Vector2I,
        lens: LensFacing,
    ) -> FrameToView {
        let stretch = Transform2F::from_scale(vec2f(
            view_dims.x() as f32 / buffer_dims.x() as f32,
            view_dims.y() as f32 / buffer_dims.y() as f32,
        ));
        let composed = match lens {
            LensFacing::Front => {
                let mirror =
                    Transform2F::row_major(-1.0, 0.0, view_dims.x() as f32, 0.0, 1.0, 0.0);
                mirror * preview_transform * stretch
            }
            LensFacing::Back => preview_transform * stretch,
        };
        FrameToView(composed)
    }

    pub fn map(&self, point: Vector2F) -> Vector2F {
        self.0 * point
    }

    /// Length the mapping gives a unit x step, used to size box extents.
    pub fn x_scale(&self) -> f32 {
        let origin = self.0 * vec2f(0.0, 0.0);
        let step = self.0 * vec2f(1.0, 0.0) - origin;
        f32::hypot(step.x(), step.y())
    }

    pub fn y_scale(&self) -> f32 {
        let origin = self.0 * vec2f(0.0, 0.0);
        let step = self.0 * vec2f(0.0, 1.0) - origin;
        f32::hypot(step.x(), step.y())
    }
}

/// Draw toggles, one per annotation element.
#[derive(Clone, Copy, Debug)]
pub struct OverlayOptions {
    pub bounding_box: bool,
    pub face_contour: bool,
    pub smiling_indicator: bool,
    pub right_eye_open_indicator: bool,
    pub left_eye_open_indicator: bool,
    pub right_eye_landmark: bool,
    pub left_eye_landmark: bool,
    pub left_cheek_landmark: bool,
    pub right_cheek_landmark: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        OverlayOptions {
            bounding_box: true,
            face_contour: true,
            smiling_indicator: false,
            right_eye_open_indicator: false,
            left_eye_open_indicator: false,
            right_eye_landmark: false,
            left_eye_landmark: false,
            left_cheek_landmark: false,
            right_cheek_landmark: false,
        }
    }
}

impl OverlayOptions {
    pub fn bounding_box(mut self, enabled: bool) -> Self {
        self.bounding_box = enabled;
        self
    }

    pub fn face_contour(mut self, enabled: bool) -> Self {
        self.face_contour = enabled;
        self
    }

    pub fn classification_indicators(mut self, enabled: bool) -> Self {
        self.smiling_indicator = enabled;
        self.right_eye_open_indicator = enabled;
        self.left_eye_open_indicator = enabled;
        self
    }

    pub fn landmarks(mut self, enabled: bool) -> Self {
        self.right_eye_landmark = enabled;
        self.left_eye_landmark = enabled;
        self.left_cheek_landmark = enabled;
        self.right_cheek_landmark = enabled;
        self
    }
}

fn circle(center: Vector2F, radius: f32) -> Outline {
    let transform = Transform2F::from_translation(center) * Transform2F::from_scale(radius);
    let mut contour = Contour::new();
    contour.push_ellipse(&transform);
    contour.close();
    let mut outline = Outline::new();
    outline.push_contour(contour);
    outline
}

fn stroked(outline: &Outline, line_width: f32) -> Outline {
    let style = StrokeStyle {
        line_width,
        line_cap: LineCap::Butt,
        line_join: LineJoin::Miter(10.0),
    };
    let mut stroke_to_fill = OutlineStrokeToFill::new(outline, style);
    stroke_to_fill.offset();
    stroke_to_fill.into_outline()
}

/// Outlines for one face: palette color for shapes, accent color for
/// classification bars. Center dot first, then box, contour, bars and
/// landmarks.
pub fn annotation_outlines(
    face: &Face,
    options: &OverlayOptions,
    map: &FrameToView,
    color: ColorU,
    accent: ColorU,
) -> Vec<(Outline, ColorU)> {
    let mut outlines = Vec::new();

    let bounds = face.bounding_box;
    let center = map.map(bounds.origin() + bounds.size() * 0.5);
    let half = vec2f(
        bounds.size().x() * 0.5 * map.x_scale(),
        bounds.size().y() * 0.5 * map.y_scale(),
    );

    outlines.push((circle(center, FACE_POSITION_RADIUS), color));

    if options.bounding_box {
        let rect = RectF::new(center - half, half * 2.0);
        outlines.push((stroked(&Outline::from_rect(rect), BOX_STROKE_WIDTH), color));
    }

    if options.face_contour {
        for &point in &face.contour {
            outlines.push((circle(map.map(point), FACE_POSITION_RADIUS), color));
        }
    }

    // Classification bars stack below the box; filled width tracks the
    // probability.
    let mut bar_top = center.y() + half.y() + BAR_GAP;
    let indicators = [
        (options.smiling_indicator, face.smiling_probability),
        (
            options.right_eye_open_indicator,
            face.right_eye_open_probability,
        ),
        (
            options.left_eye_open_indicator,
            face.left_eye_open_probability,
        ),
    ];
    for (enabled, probability) in indicators {
        if !enabled {
            continue;
        }
        if let Some(probability) = probability {
            let width = probability.max(0.0).min(1.0) * half.x() * 2.0;
            let rect = RectF::new(
                vec2f(center.x() - half.x(), bar_top),
                vec2f(width, BAR_HEIGHT),
            );
            outlines.push((Outline::from_rect(rect), accent));
            bar_top += BAR_HEIGHT + BAR_GAP;
        }
    }

    let landmarks = [
        (options.right_eye_landmark, LandmarkKind::RightEye),
        (options.left_eye_landmark, LandmarkKind::LeftEye),
        (options.left_cheek_landmark, LandmarkKind::LeftCheek),
        (options.right_cheek_landmark, LandmarkKind::RightCheek),
    ];
    for (enabled, kind) in landmarks {
        if !enabled {
            continue;
        }
        if let Some(landmark) = face.landmark(kind) {
            outlines.push((circle(map.map(landmark.position), FACE_POSITION_RADIUS), color));
        }
    }

    outlines
}

/// Pushes annotation paths for every face onto the scene, cycling the
/// palette per face.
pub fn push_overlay(scene: &mut Scene, faces: &[Face], options: &OverlayOptions, map: &FrameToView) {
    for face in faces {
        let color = next_color();
        let accent = next_color();
        for (outline, fill) in annotation_outlines(face, options, map, color, accent) {
            let paint_id = scene.push_paint(&Paint::from_color(fill));
            scene.push_draw_path(DrawPath::new(outline, paint_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Landmark;
    use pathfinder_geometry::vector::vec2i;

    fn test_face() -> Face {
        let mut face = Face::new(RectF::new(vec2f(10.0, 10.0), vec2f(40.0, 40.0)));
        face.contour = vec![vec2f(12.0, 12.0), vec2f(30.0, 12.0), vec2f(30.0, 40.0)];
        face.landmarks = vec![
            Landmark {
                kind: LandmarkKind::LeftEye,
                position: vec2f(20.0, 22.0),
            },
            Landmark {
                kind: LandmarkKind::RightEye,
                position: vec2f(40.0, 22.0),
            },
        ];
        face
    }

    fn identity_map(dims: Vector2I) -> FrameToView {
        FrameToView::new(Transform2F::default(), dims, dims, LensFacing::Back)
    }

    #[test]
    fn front_lens_mirrors_x() {
        let map = FrameToView::new(
            Transform2F::default(),
            vec2i(100, 50),
            vec2i(100, 50),
            LensFacing::Front,
        );
        let mapped = map.map(vec2f(10.0, 20.0));
        assert!((mapped.x() - 90.0).abs() < 1e-4);
        assert!((mapped.y() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn stretch_scales_buffer_to_view() {
        let map = FrameToView::new(
            Transform2F::default(),
            vec2i(640, 480),
            vec2i(1280, 960),
            LensFacing::Back,
        );
        let mapped = map.map(vec2f(10.0, 10.0));
        assert!((mapped.x() - 20.0).abs() < 1e-4);
        assert!((mapped.y() - 20.0).abs() < 1e-4);
        assert!((map.x_scale() - 2.0).abs() < 1e-4);
        assert!((map.y_scale() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn default_options_draw_center_box_and_contour() {
        let face = test_face();
        let map = identity_map(vec2i(100, 100));
        let outlines = annotation_outlines(
            &face,
            &OverlayOptions::default(),
            &map,
            ColorU::white(),
            ColorU::black(),
        );
        // center dot + box + 3 contour dots
        assert_eq!(outlines.len(), 5);
    }

    #[test]
    fn landmark_toggles_add_dots_only_for_present_landmarks() {
        let face = test_face();
        let map = identity_map(vec2i(100, 100));
        let options = OverlayOptions::default()
            .bounding_box(false)
            .face_contour(false)
            .landmarks(true);
        let outlines =
            annotation_outlines(&face, &options, &map, ColorU::white(), ColorU::black());
        // center dot + two eye landmarks; cheeks are absent from the face
        assert_eq!(outlines.len(), 3);
    }

    #[test]
    fn classification_bars_require_probabilities() {
        let mut face = test_face();
        let map = identity_map(vec2i(100, 100));
        let options = OverlayOptions::default()
            .bounding_box(false)
            .face_contour(false)
            .classification_indicators(true);

        let none = annotation_outlines(&face, &options, &map, ColorU::white(), ColorU::black());
        assert_eq!(none.len(), 1);

        face.smiling_probability = Some(0.8);
        face.left_eye_open_probability = Some(0.5);
        let some = annotation_outlines(&face, &options, &map, ColorU::white(), ColorU::black());
        assert_eq!(some.len(), 3);
    }

    #[test]
    fn dot_radius_is_not_scaled_by_the_mapping() {
        let map = FrameToView::new(
            Transform2F::default(),
            vec2i(100, 100),
            vec2i(400, 400),
            LensFacing::Back,
        );
        let face = Face::new(RectF::new(vec2f(10.0, 10.0), vec2f(20.0, 20.0)));
        let options = OverlayOptions::default().bounding_box(false).face_contour(false);
        let outlines =
            annotation_outlines(&face, &options, &map, ColorU::white(), ColorU::black());
        let bounds = outlines[0].0.bounds();
        assert!((bounds.size().x() - 2.0 * FACE_POSITION_RADIUS).abs() < 0.5);
    }

    #[test]
    fn palette_has_seven_distinct_colors() {
        for (i, a) in COLOR_CHOICES.iter().enumerate() {
            for b in COLOR_CHOICES.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
