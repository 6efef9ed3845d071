//! Buffer-to-view preview transform.

use pathfinder_geometry::{
    transform2d::Transform2F,
    vector::{vec2f, Vector2I},
};

/// Display rotation relative to the device's natural orientation.
///
/// Platforms report rotation as a small enumeration; anything outside the
/// four fixed values maps to `None` ("not yet determinable").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl DisplayRotation {
    pub fn from_degrees(degrees: i32) -> Option<DisplayRotation> {
        match degrees {
            0 => Some(DisplayRotation::Deg0),
            90 => Some(DisplayRotation::Deg90),
            180 => Some(DisplayRotation::Deg180),
            270 => Some(DisplayRotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            DisplayRotation::Deg0 => 0,
            DisplayRotation::Deg90 => 90,
            DisplayRotation::Deg180 => 180,
            DisplayRotation::Deg270 => 270,
        }
    }
}

/// Last applied (rotation, buffer, view) triple.
///
/// Threaded through [`compute_preview_transform`] so redundant recomputation
/// can be skipped; fields stay unset until a valid value has been seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformState {
    rotation: Option<DisplayRotation>,
    buffer_dims: Option<Vector2I>,
    view_dims: Option<Vector2I>,
}

impl TransformState {
    pub fn rotation(&self) -> Option<DisplayRotation> {
        self.rotation
    }

    pub fn buffer_dims(&self) -> Option<Vector2I> {
        self.buffer_dims
    }

    pub fn view_dims(&self) -> Option<Vector2I> {
        self.view_dims
    }
}

/// Computes the transform that maps the camera buffer onto the preview
/// surface: counter-rotate by the display rotation about the view center,
/// then center-crop scale so the surface is filled without letterboxing.
///
/// Returns `None` when nothing changed since the last applied state or when
/// any input is degenerate (unknown rotation, zero-sized buffer or view);
/// the caller keeps whatever transform is currently in effect. The returned
/// state records every input that validated, even if a later one aborted
/// the computation.
pub fn compute_preview_transform(
    prev: &TransformState,
    rotation: Option<DisplayRotation>,
    buffer_dims: Vector2I,
    view_dims: Vector2I,
) -> (Option<Transform2F>, TransformState) {
    let mut state = prev.clone();

    if prev.rotation == rotation
        && prev.buffer_dims == Some(buffer_dims)
        && prev.view_dims == Some(view_dims)
    {
        // Nothing has changed, no need to transform output again
        return (None, state);
    }

    let rotation = match rotation {
        Some(r) => r,
        // Invalid rotation - wait for valid inputs before setting matrix
        None => return (None, state),
    };
    state.rotation = Some(rotation);

    if buffer_dims.x() == 0 || buffer_dims.y() == 0 {
        // Invalid buffer dimens - wait for valid inputs
        return (None, state);
    }
    state.buffer_dims = Some(buffer_dims);

    if view_dims.x() == 0 || view_dims.y() == 0 {
        // Invalid view finder dimens - wait for valid inputs
        return (None, state);
    }
    state.view_dims = Some(view_dims);

    let center = view_dims.to_f32() * 0.5;

    // Buffers are rotated relative to the device's natural orientation:
    // width and height swap roles.
    let buffer_ratio = buffer_dims.y() as f32 / buffer_dims.x() as f32;

    // Match longest sides together (center-crop).
    let (scaled_width, scaled_height) = if view_dims.x() > view_dims.y() {
        (
            (view_dims.x() as f32 * buffer_ratio).round() as i32,
            view_dims.x(),
        )
    } else {
        (
            (view_dims.y() as f32 * buffer_ratio).round() as i32,
            view_dims.y(),
        )
    };

    let x_scale = scaled_width as f32 / view_dims.x() as f32;
    let y_scale = scaled_height as f32 / view_dims.y() as f32;

    let to_center = Transform2F::from_translation(center);
    let from_center = Transform2F::from_translation(center * -1.0);

    let rotate = to_center
        * Transform2F::from_rotation((-(rotation.degrees() as f32)).to_radians())
        * from_center;
    let scale = to_center * Transform2F::from_scale(vec2f(x_scale, y_scale)) * from_center;

    // The scale is composed on the right so it takes effect before the
    // rotation when the transform is applied to points.
    (Some(rotate * scale), state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_geometry::vector::{vec2i, Vector2F};

    const EPS: f32 = 1e-3;

    fn assert_close(a: Vector2F, b: Vector2F) {
        assert!(
            (a.x() - b.x()).abs() < EPS && (a.y() - b.y()).abs() < EPS,
            "{:?} != {:?}",
            a,
            b
        );
    }

    fn compute(
        prev: &TransformState,
        degrees: i32,
        buffer: (i32, i32),
        view: (i32, i32),
    ) -> (Option<Transform2F>, TransformState) {
        compute_preview_transform(
            prev,
            DisplayRotation::from_degrees(degrees),
            vec2i(buffer.0, buffer.1),
            vec2i(view.0, view.1),
        )
    }

    #[test]
    fn rotation_mapping() {
        assert_eq!(DisplayRotation::from_degrees(0), Some(DisplayRotation::Deg0));
        assert_eq!(
            DisplayRotation::from_degrees(270),
            Some(DisplayRotation::Deg270)
        );
        assert_eq!(DisplayRotation::from_degrees(45), None);
        assert_eq!(DisplayRotation::from_degrees(-90), None);
        assert_eq!(DisplayRotation::Deg180.degrees(), 180);
    }

    #[test]
    fn exact_aspect_match_is_unit_scale() {
        // buffer 1280x720 against a 1080x1920 portrait view: ratio 0.5625,
        // scaled 1080x1920, both scale factors exactly 1.
        let (transform, _) = compute(&TransformState::default(), 0, (1280, 720), (1080, 1920));
        let transform = transform.unwrap();

        let center = vec2f(540.0, 960.0);
        assert_close(transform * center, center);
        assert_close(transform * vec2f(541.0, 960.0), vec2f(541.0, 960.0));
        assert_close(transform * vec2f(0.0, 0.0), vec2f(0.0, 0.0));
    }

    #[test]
    fn rotation_component_is_negated_about_center() {
        // Unit-scale inputs isolate the rotation component.
        let center = vec2f(540.0, 960.0);
        let probe = center + vec2f(1.0, 0.0);

        let expected = [
            (0, vec2f(1.0, 0.0)),
            (90, vec2f(0.0, -1.0)),
            (180, vec2f(-1.0, 0.0)),
            (270, vec2f(0.0, 1.0)),
        ];
        for (degrees, offset) in expected {
            let (transform, _) =
                compute(&TransformState::default(), degrees, (1280, 720), (1080, 1920));
            let transform = transform.unwrap();
            assert_close(transform * probe, center + offset);
            // The pivot is a fixed point for every rotation.
            assert_close(transform * center, center);
        }
    }

    #[test]
    fn landscape_view_pins_width() {
        // view 1920x1080, buffer 720x1280: ratio = 1280/720, scaled height
        // pins to the view width (1920), scaled width = round(1920 * ratio).
        let (transform, _) = compute(&TransformState::default(), 0, (720, 1280), (1920, 1080));
        let transform = transform.unwrap();

        let x_scale = 3413.0 / 1920.0;
        let y_scale = 1920.0 / 1080.0;
        let center = vec2f(960.0, 540.0);
        assert_close(transform * center, center);
        assert_close(
            transform * (center + vec2f(1.0, 0.0)),
            center + vec2f(x_scale, 0.0),
        );
        assert_close(
            transform * (center + vec2f(0.0, 1.0)),
            center + vec2f(0.0, y_scale),
        );
    }

    #[test]
    fn scale_applies_before_rotation() {
        // Portrait view with a wide crop: x_scale = round(1920 * 1280/720) /
        // 1080 ≈ 3.16 while y_scale = 1. A point offset along +x must be
        // scaled first and rotated by -90 degrees after; rotating first
        // would leave the offset at unit length.
        let (transform, _) = compute(&TransformState::default(), 90, (720, 1280), (1080, 1920));
        let transform = transform.unwrap();

        let x_scale = 3413.0 / 1080.0;
        let center = vec2f(540.0, 960.0);
        assert_close(
            transform * (center + vec2f(1.0, 0.0)),
            center + vec2f(0.0, -x_scale),
        );
    }

    #[test]
    fn identical_inputs_are_a_no_op() {
        let (first, state) = compute(&TransformState::default(), 90, (720, 1280), (1080, 1920));
        assert!(first.is_some());

        let (second, state2) = compute(&state, 90, (720, 1280), (1080, 1920));
        assert!(second.is_none());
        assert_eq!(state, state2);
    }

    #[test]
    fn zero_dimensions_yield_no_transform() {
        let cases = [
            ((0, 720), (1080, 1920)),
            ((1280, 0), (1080, 1920)),
            ((1280, 720), (0, 1920)),
            ((1280, 720), (1080, 0)),
            ((0, 0), (0, 0)),
        ];
        for (buffer, view) in cases {
            for degrees in [0, 90, 180, 270] {
                let (transform, _) = compute(&TransformState::default(), degrees, buffer, view);
                assert!(transform.is_none(), "buffer {:?} view {:?}", buffer, view);
            }
        }
    }

    #[test]
    fn unknown_rotation_yields_no_transform() {
        let (transform, state) = compute_preview_transform(
            &TransformState::default(),
            None,
            vec2i(1280, 720),
            vec2i(1080, 1920),
        );
        assert!(transform.is_none());
        assert_eq!(state.rotation(), None);
    }

    #[test]
    fn degenerate_input_keeps_earlier_valid_fields() {
        // Rotation validates before the zero-sized buffer aborts: the
        // returned state remembers it.
        let (transform, state) = compute(&TransformState::default(), 90, (0, 0), (1080, 1920));
        assert!(transform.is_none());
        assert_eq!(state.rotation(), Some(DisplayRotation::Deg90));
        assert_eq!(state.buffer_dims(), None);
        assert_eq!(state.view_dims(), None);

        // Once the buffer becomes valid the full transform is produced.
        let (transform, state) = compute(&state, 90, (720, 1280), (1080, 1920));
        assert!(transform.is_some());
        assert_eq!(state.buffer_dims(), Some(vec2i(720, 1280)));
        assert_eq!(state.view_dims(), Some(vec2i(1080, 1920)));
    }

    #[test]
    fn rotation_change_recomputes() {
        let (first, state) = compute(&TransformState::default(), 90, (720, 1280), (1080, 1920));
        let first = first.unwrap();

        let (repeat, state) = compute(&state, 90, (720, 1280), (1080, 1920));
        assert!(repeat.is_none());

        let (second, _) = compute(&state, 0, (720, 1280), (1080, 1920));
        let second = second.unwrap();

        // Same dimensions, different rotation component.
        let probe = vec2f(541.0, 960.0);
        let a = first * probe;
        let b = second * probe;
        assert!((a.x() - b.x()).abs() > EPS || (a.y() - b.y()).abs() > EPS);
    }
}
