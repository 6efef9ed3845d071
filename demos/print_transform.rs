use clap::{App, Arg};
use face_preview::{compute_preview_transform, DisplayRotation, TransformState};
use pathfinder_geometry::vector::{vec2f, vec2i};

fn parse_size(text: &str) -> (i32, i32) {
    let mut parts = text.splitn(2, 'x');
    let w = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let h = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (w, h)
}

fn main() {
    pretty_env_logger::init();

    let matches = App::new("print_transform")
        .about("Prints the preview transform for given buffer/view/rotation")
        .arg(
            Arg::with_name("rotation")
                .long("rotation")
                .takes_value(true)
                .default_value("0")
                .help("Display rotation in degrees (0, 90, 180, 270)"),
        )
        .arg(
            Arg::with_name("buffer")
                .long("buffer")
                .takes_value(true)
                .default_value("720x1280")
                .help("Camera buffer dimensions, WxH"),
        )
        .arg(
            Arg::with_name("view")
                .long("view")
                .takes_value(true)
                .default_value("1080x1920")
                .help("Preview surface dimensions, WxH"),
        )
        .get_matches();

    let degrees: i32 = matches
        .value_of("rotation")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);
    let (buffer_w, buffer_h) = parse_size(matches.value_of("buffer").unwrap_or("0x0"));
    let (view_w, view_h) = parse_size(matches.value_of("view").unwrap_or("0x0"));

    let (transform, state) = compute_preview_transform(
        &TransformState::default(),
        DisplayRotation::from_degrees(degrees),
        vec2i(buffer_w, buffer_h),
        vec2i(view_w, view_h),
    );

    match transform {
        Some(transform) => {
            println!("transform: {:?}", transform);
            let center = vec2f(view_w as f32 * 0.5, view_h as f32 * 0.5);
            for probe in [
                center,
                vec2f(0.0, 0.0),
                vec2f(view_w as f32, 0.0),
                vec2f(0.0, view_h as f32),
                vec2f(view_w as f32, view_h as f32),
            ] {
                println!("  {:?} -> {:?}", probe, transform * probe);
            }
        }
        None => println!("no transform: degenerate inputs, state = {:?}", state),
    }
}
