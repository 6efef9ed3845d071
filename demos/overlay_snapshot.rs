use std::fs::File;
use std::io::BufWriter;

use clap::{App, Arg};
use face_preview::{
    DetectorOptions, DisplayRotation, Face, FaceDetector, Frame, Landmark, LandmarkKind,
    OverlayOptions, PreviewRenderer, StaticDetector,
};
use pathfinder_color::ColorU;
use pathfinder_geometry::rect::RectF;
use pathfinder_geometry::vector::{vec2f, vec2i};

/// A face roughly centered in the frame, with a ring of contour points —
/// stands in for a detection service.
fn demo_face(frame: &Frame) -> Face {
    let size = frame.size().to_f32();
    let half = size * 0.25;
    let center = size * 0.5;

    let mut face = Face::new(RectF::new(center - half, half * 2.0));
    face.tracking_id = Some(1);
    face.smiling_probability = Some(0.85);
    face.left_eye_open_probability = Some(0.97);
    face.right_eye_open_probability = Some(0.93);

    for i in 0..12 {
        let angle = i as f32 / 12.0 * std::f32::consts::TAU;
        face.contour
            .push(center + vec2f(half.x() * angle.cos(), half.y() * angle.sin()));
    }
    face.landmarks.push(Landmark {
        kind: LandmarkKind::LeftEye,
        position: center + vec2f(-half.x() * 0.4, -half.y() * 0.3),
    });
    face.landmarks.push(Landmark {
        kind: LandmarkKind::RightEye,
        position: center + vec2f(half.x() * 0.4, -half.y() * 0.3),
    });
    face
}

fn load_frame(path: Option<&str>) -> Frame {
    match path {
        Some(path) => {
            let image = image::open(path).expect("can't load frame image").to_rgba8();
            let (width, height) = image.dimensions();
            Frame::from_rgba(vec2i(width as i32, height as i32), image.into_raw())
                .expect("bad frame image")
        }
        None => Frame::solid(vec2i(720, 1280), ColorU::new(0x30, 0x30, 0x30, 0xff))
            .expect("solid frame"),
    }
}

fn main() {
    pretty_env_logger::init();

    let matches = App::new("overlay_snapshot")
        .about("Renders a frame with a face overlay into an SVG snapshot")
        .arg(
            Arg::with_name("frame")
                .long("frame")
                .takes_value(true)
                .help("PNG to use as the camera frame (solid gray if omitted)"),
        )
        .arg(
            Arg::with_name("out")
                .long("out")
                .takes_value(true)
                .default_value("overlay_snapshot.svg"),
        )
        .arg(
            Arg::with_name("rotation")
                .long("rotation")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("view")
                .long("view")
                .takes_value(true)
                .default_value("1080x1920")
                .help("Preview surface dimensions, WxH"),
        )
        .get_matches();

    let frame = load_frame(matches.value_of("frame"));

    let degrees: i32 = matches
        .value_of("rotation")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);
    let view = matches.value_of("view").unwrap_or("1080x1920");
    let mut parts = view.splitn(2, 'x');
    let view_w: i32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1080);
    let view_h: i32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1920);

    let options = DetectorOptions::default().classification(true);
    let mut detector = StaticDetector::with_options(vec![demo_face(&frame)], options);
    let faces = detector.detect(&frame).expect("detection failed");

    let mut renderer = PreviewRenderer::default();
    renderer.set_viewport(0, 0, Some((view_w, view_h)));
    renderer.set_overlay_options(
        OverlayOptions::default()
            .landmarks(true)
            .classification_indicators(true),
    );
    renderer.update_layout(DisplayRotation::from_degrees(degrees), frame.size());
    renderer.submit_frame(frame);
    renderer.set_faces(faces);

    let out_path = matches.value_of("out").unwrap_or("overlay_snapshot.svg");
    let mut writer = BufWriter::new(File::create(out_path).expect("can't create output"));
    renderer.export_svg(&mut writer).expect("export failed");

    println!("wrote {}", out_path);
}
