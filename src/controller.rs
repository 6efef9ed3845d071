//! Preview controller.
//!
//! Composes the renderer facade, the detection scheduler and the sample
//! clock over a platform [`Surface`]. The embedder calls in directly on the
//! owning thread: one call per camera frame, one per layout event, plus a
//! periodic `tick`.

use std::time::{Duration, Instant};

use pathfinder_color::ColorF;
use rayon::ThreadPoolBuilder;

use crate::detector::FaceDetector;
use crate::frame::Frame;
use crate::overlay::{LensFacing, OverlayOptions};
use crate::preview::{PreviewError, PreviewRenderer};
use crate::sampler::{DetectionScheduler, SampleClock, DEFAULT_SAMPLE_INTERVAL};
use crate::surface::{Surface, SurfaceEvent, SurfaceSize};

#[derive(Clone, Copy, Debug)]
pub struct PreviewOptions {
    pub sample_interval: Duration,
    pub overlay: OverlayOptions,
    pub lens_facing: LensFacing,
    pub clear_color: ColorF,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        PreviewOptions {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            overlay: OverlayOptions::default(),
            lens_facing: LensFacing::Front,
            clear_color: ColorF::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

pub struct PreviewApp<S, D>
where
    S: Surface,
    D: FaceDetector + 'static,
{
    pub surface: S,
    pub should_exit: bool,

    surface_size: SurfaceSize,
    renderer: PreviewRenderer,
    scheduler: DetectionScheduler<D>,
    clock: SampleClock,

    target_stale: bool,
}

impl<S, D> PreviewApp<S, D>
where
    S: Surface,
    D: FaceDetector + 'static,
{
    pub fn new(
        surface: S,
        surface_size: SurfaceSize,
        detector: D,
        options: PreviewOptions,
    ) -> Result<PreviewApp<S, D>, PreviewError> {
        let builder = surface.adjust_thread_pool_settings(
            ThreadPoolBuilder::new()
                .num_threads(1)
                .thread_name(|index| format!("face-detect-{}", index)),
        );
        let scheduler = DetectionScheduler::with_builder(detector, builder)?;

        let mut renderer = PreviewRenderer::default();
        renderer.set_gl_version(surface.gl_version());
        let clear = options.clear_color;
        renderer.set_clear_color(clear.r(), clear.g(), clear.b(), clear.a());
        renderer.set_overlay_options(options.overlay);
        renderer.set_lens_facing(options.lens_facing);

        let viewport = surface.viewport();
        renderer.set_viewport(
            viewport.origin().x(),
            viewport.origin().y(),
            Some((viewport.size().x(), viewport.size().y())),
        );

        Ok(PreviewApp {
            surface,
            should_exit: false,

            surface_size,
            renderer,
            scheduler,
            clock: SampleClock::new(options.sample_interval),

            target_stale: false,
        })
    }

    pub fn renderer(&self) -> &PreviewRenderer {
        &self.renderer
    }

    /// The camera delivered a new preview buffer: refresh the preview
    /// transform against the current display rotation and keep the frame
    /// for rendering and sampling. Returns true when the transform changed.
    pub fn on_preview_output(&mut self, frame: Frame) -> bool {
        let rotation = self.surface.display_rotation();
        let changed = self.renderer.update_layout(rotation, frame.size());
        self.renderer.submit_frame(frame);
        changed
    }

    pub fn on_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Quit => {
                self.should_exit = true;
            }
            SurfaceEvent::Resized(size) => {
                self.surface_size = size;
                self.target_stale = true;

                let device_size = size.device_size();
                self.renderer
                    .set_viewport(0, 0, Some((device_size.x(), device_size.y())));
                self.refresh_layout();
            }
            SurfaceEvent::RotationChanged(rotation) => {
                let buffer = self
                    .renderer
                    .transform_state()
                    .buffer_dims()
                    .unwrap_or_default();
                self.renderer.update_layout(rotation, buffer);
            }
            SurfaceEvent::LensSwitched => {
                let lens = self.renderer.lens_facing().toggled();
                log::info!("lens switched to {:?}", lens);
                self.renderer.set_lens_facing(lens);
                // the capture pipeline restarts on a lens switch
                self.clock.reset();
            }
        }
    }

    /// Periodic pump: samples the latest frame into the detector when the
    /// clock fires and drains finished detections into the overlay.
    pub fn tick(&mut self, now: Instant) {
        if self.clock.should_sample(now) {
            if let Some(frame) = self.renderer.current_frame() {
                self.scheduler.schedule(frame.clone());
            }
        }

        for faces in self.scheduler.poll() {
            if faces.is_empty() {
                log::info!("no face found");
            } else {
                for face in &faces {
                    if let Some(id) = face.tracking_id {
                        log::debug!("face id: {}", id);
                    }
                }
            }
            self.renderer.set_faces(faces);
        }
    }

    pub fn draw(&mut self) -> Result<(), PreviewError> {
        if self.target_stale || !self.renderer.has_target() {
            let device_size = self.surface_size.device_size();
            self.renderer.set_target_with_resources(
                self.surface.gl_default_framebuffer(),
                device_size.x(),
                device_size.y(),
                self.surface.resource_loader(),
            );
            self.target_stale = false;
        }
        self.renderer.draw_once()
    }

    pub fn present(&mut self) {
        if let Some(device) = self.renderer.device_mut() {
            self.surface.present(device);
        }
    }

    fn refresh_layout(&mut self) {
        let rotation = self.surface.display_rotation();
        let buffer = self
            .renderer
            .transform_state()
            .buffer_dims()
            .unwrap_or_default();
        self.renderer.update_layout(rotation, buffer);
    }
}
