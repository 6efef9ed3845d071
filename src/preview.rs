//! Preview renderer facade.
//!
//! Owns the GL-backed vector renderer and the current preview state: render
//! target, viewport, the last computed preview transform, the latest camera
//! frame and the latest detection results. The embedder drives it with
//! explicit calls on the thread that owns the rendering surface.

use std::io::Write;
use std::path::PathBuf;

use pathfinder_color::ColorF;
use pathfinder_export::{Export, FileFormat};
use pathfinder_geometry::{
    rect::{RectF, RectI},
    transform2d::Transform2F,
    vector::{vec2i, Vector2F, Vector2I},
};
use pathfinder_gl::{GLDevice as DeviceImpl, GLVersion};
use pathfinder_gpu::{Device, RenderTarget, TextureData};
use pathfinder_renderer::{
    concurrent::{executor::SequentialExecutor, scene_proxy::SceneProxy},
    gpu::{
        options::{DestFramebuffer, RendererLevel, RendererMode, RendererOptions},
        renderer::Renderer,
    },
    options::{BuildOptions, RenderTransform},
    paint::Paint,
    scene::{DrawPath, Scene},
};
use pathfinder_content::{outline::Outline, pattern::Pattern};
use pathfinder_resources::{fs::FilesystemResourceLoader, ResourceLoader};
use thiserror::Error;

use crate::detector::Face;
use crate::frame::{Frame, FrameError};
use crate::overlay::{push_overlay, FrameToView, LensFacing, OverlayOptions};
use crate::sampler::SchedulerError;
use crate::transform::{compute_preview_transform, DisplayRotation, TransformState};

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("no camera frame submitted yet")]
    NoFrame,

    #[error("viewport size is not set")]
    NoViewport,

    #[error("no render target")]
    NoTarget,

    #[error("unexpected pixel format for default framebuffer")]
    UnexpectedPixelFormat,

    #[error("snapshot failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Camera preview renderer.
pub struct PreviewRenderer {
    // GL version: Windows 4.0, Android ES3
    gl_version: GLVersion,
    /// D3D9 level for mobile compatibility
    gl_level: RendererLevel,

    // created by set_target
    renderer: Option<Renderer<DeviceImpl>>,
    // rebuilt whenever frame, faces or transform change
    scene_proxy: Option<SceneProxy>,

    clear_color: ColorF,
    target_size: Vector2I,

    viewport_offset: Vector2I,
    // viewport size doubles as the view dimensions fed to the calculator
    viewport_size: Option<Vector2I>,

    transform_state: TransformState,
    preview_transform: Option<Transform2F>,

    frame: Option<Frame>,
    faces: Vec<Face>,
    overlay_options: OverlayOptions,
    lens: LensFacing,

    dirty: bool,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self {
            gl_version: get_native_gl_version(),
            gl_level: RendererLevel::D3D9,

            renderer: None,
            scene_proxy: None,

            clear_color: ColorF::new(0.0, 0.0, 0.0, 1.0),

            target_size: vec2i(1, 1),

            viewport_offset: vec2i(0, 0),
            viewport_size: None,

            transform_state: TransformState::default(),
            preview_transform: None,

            frame: None,
            faces: Vec::new(),
            overlay_options: OverlayOptions::default(),
            lens: LensFacing::Front,

            dirty: true,
        }
    }
}

impl PreviewRenderer {
    pub fn new(
        fbo_id: u32,
        target_w: i32,
        target_h: i32,
        vp_offset: (i32, i32),
        vp_size: Option<(i32, i32)>,
    ) -> Self {
        let mut s = Self::default();
        s.set_viewport(vp_offset.0, vp_offset.1, vp_size);
        s.set_target(fbo_id, target_w, target_h);
        s
    }

    /// Loads GL symbols through the embedder's lookup function.
    pub fn load_gl_with<F>(loader: F)
    where
        F: FnMut(&'static str) -> *const std::os::raw::c_void,
    {
        gl::load_with(loader);
    }

    pub fn set_gl_version(&mut self, version: GLVersion) {
        self.gl_version = version;
    }

    /// Background color behind the video frame.
    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = ColorF::new(r, g, b, a);
    }

    pub fn set_lens_facing(&mut self, lens: LensFacing) {
        if self.lens != lens {
            self.lens = lens;
            self.dirty = true;
        }
    }

    pub fn lens_facing(&self) -> LensFacing {
        self.lens
    }

    pub fn set_overlay_options(&mut self, options: OverlayOptions) {
        self.overlay_options = options;
        self.dirty = true;
    }

    pub fn has_target(&self) -> bool {
        self.renderer.is_some()
    }

    /// Recreates the renderer against the given framebuffer, locating shader
    /// resources on the filesystem.
    pub fn set_target(&mut self, fbo_id: u32, target_w: i32, target_h: i32) {
        let resources = FilesystemResourceLoader::locate();
        self.set_target_with_resources(fbo_id, target_w, target_h, &resources);
    }

    pub fn set_target_with_resources(
        &mut self,
        fbo_id: u32,
        target_w: i32,
        target_h: i32,
        resources: &dyn ResourceLoader,
    ) {
        self.target_size = vec2i(target_w, target_h);

        let viewport_size = self.viewport_size.unwrap_or_else(|| vec2i(1, 1));

        self.renderer = Some(Renderer::new(
            DeviceImpl::new(self.gl_version, fbo_id),
            resources,
            RendererMode {
                level: self.gl_level,
            },
            RendererOptions {
                background_color: Some(self.clear_color),
                show_debug_ui: false,
                dest: DestFramebuffer::Default {
                    viewport: RectI::new(self.viewport_offset, viewport_size),
                    window_size: self.target_size,
                },
            },
        ));
    }

    /// Places the preview surface inside the render target. The viewport
    /// size is also the view dimension pair fed to the transform calculator.
    pub fn set_viewport(&mut self, x: i32, y: i32, size: Option<(i32, i32)>) {
        self.viewport_offset = vec2i(x, y);
        if let Some((w, h)) = size {
            self.viewport_size = Some(vec2i(w, h));
            self.dirty = true;
        }
    }

    pub fn viewport_size(&self) -> Option<Vector2I> {
        self.viewport_size
    }

    pub fn transform_state(&self) -> &TransformState {
        &self.transform_state
    }

    pub fn preview_transform(&self) -> Option<Transform2F> {
        self.preview_transform
    }

    /// Re-runs the transform calculator for new rotation/buffer inputs.
    /// Returns true when a new transform was produced; degenerate or
    /// unchanged inputs leave the previous transform in effect.
    pub fn update_layout(
        &mut self,
        rotation: Option<DisplayRotation>,
        buffer_dims: Vector2I,
    ) -> bool {
        let view_dims = self.viewport_size.unwrap_or_else(|| vec2i(0, 0));
        let (transform, state) =
            compute_preview_transform(&self.transform_state, rotation, buffer_dims, view_dims);
        self.transform_state = state;
        match transform {
            Some(transform) => {
                log::debug!(
                    "preview transform updated: buffer {:?}, view {:?}, rotation {:?}",
                    buffer_dims,
                    view_dims,
                    rotation
                );
                self.preview_transform = Some(transform);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Latest camera frame; replaces the previous one.
    pub fn submit_frame(&mut self, frame: Frame) {
        log::debug!("received new frame {}x{}", frame.width(), frame.height());
        self.frame = Some(frame);
        self.dirty = true;
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Replaces the overlay with the faces of the most recent detection.
    /// An empty list clears the overlay.
    pub fn set_faces(&mut self, faces: Vec<Face>) {
        self.faces = faces;
        self.dirty = true;
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn draw_once(&mut self) -> Result<(), PreviewError> {
        let viewport_size = self.viewport_size.ok_or(PreviewError::NoViewport)?;

        if self.renderer.is_none() {
            self.set_target(0, viewport_size.x(), viewport_size.y());
        }

        self.ensure_scene()?;

        let scene_proxy = match self.scene_proxy.as_ref() {
            Some(proxy) => proxy,
            None => return Err(PreviewError::NoFrame),
        };
        let renderer = match self.renderer.as_mut() {
            Some(renderer) => renderer,
            None => return Err(PreviewError::NoTarget),
        };

        *renderer.options_mut() = RendererOptions {
            show_debug_ui: false,
            background_color: Some(self.clear_color),
            dest: DestFramebuffer::Default {
                viewport: RectI::new(self.viewport_offset, viewport_size),
                window_size: self.target_size,
            },
        };

        renderer.device().begin_commands();
        scene_proxy.render(renderer);
        renderer.device().end_commands();

        Ok(())
    }

    pub fn device_mut(&mut self) -> Option<&mut DeviceImpl> {
        self.renderer.as_mut().map(|renderer| renderer.device_mut())
    }

    /// Vector snapshot of the current scene (frame pattern + overlay).
    /// Works without a GL context.
    pub fn export_svg<W: Write>(&mut self, writer: &mut W) -> Result<(), PreviewError> {
        let scene = self.build_scene()?;
        scene.export(writer, FileFormat::SVG)?;
        Ok(())
    }

    /// Reads the rendered target back and writes it out as PNG.
    pub fn take_raster_screenshot(&mut self, path: PathBuf) -> Result<(), PreviewError> {
        let renderer = match self.renderer.as_ref() {
            Some(renderer) => renderer,
            None => return Err(PreviewError::NoTarget),
        };

        let viewport = RectI::new(Vector2I::default(), self.target_size);
        let texture_data_receiver = renderer
            .device()
            .read_pixels(&RenderTarget::Default, viewport);
        let pixels = match renderer.device().recv_texture_data(&texture_data_receiver) {
            TextureData::U8(pixels) => pixels,
            _ => return Err(PreviewError::UnexpectedPixelFormat),
        };

        Frame::from_rgba(self.target_size, pixels)?.save_png(path)?;
        Ok(())
    }

    fn ensure_scene(&mut self) -> Result<(), PreviewError> {
        if !self.dirty && self.scene_proxy.is_some() {
            return Ok(());
        }

        let scene = self.build_scene()?;
        match self.scene_proxy.as_ref() {
            Some(proxy) => proxy.replace_scene(scene),
            None => {
                self.scene_proxy = Some(SceneProxy::from_scene(
                    scene,
                    self.gl_level,
                    SequentialExecutor,
                ));
            }
        }

        if let Some(proxy) = self.scene_proxy.as_ref() {
            proxy.build(BuildOptions {
                transform: RenderTransform::Transform2D(Transform2F::default()),
                ..Default::default()
            });
        }

        self.dirty = false;
        Ok(())
    }

    /// View-space scene: the frame as a pattern-painted rectangle carried
    /// through the preview transform, with face annotations above it.
    fn build_scene(&self) -> Result<Scene, PreviewError> {
        let viewport_size = self.viewport_size.ok_or(PreviewError::NoViewport)?;
        let frame = self.frame.as_ref().ok_or(PreviewError::NoFrame)?;

        let mut scene = Scene::new();
        scene.set_view_box(RectF::new(Vector2F::zero(), viewport_size.to_f32()));

        let preview_transform = self.preview_transform.unwrap_or_default();
        let map = FrameToView::new(preview_transform, frame.size(), viewport_size, self.lens);

        let mut pattern = Pattern::from_image(frame.to_pattern_image());
        pattern.apply_transform(map.0);
        let paint_id = scene.push_paint(&Paint::from_pattern(pattern));

        let mut outline = Outline::from_rect(RectF::new(Vector2F::zero(), frame.size().to_f32()));
        outline.transform(&map.0);
        scene.push_draw_path(DrawPath::new(outline, paint_id));

        push_overlay(&mut scene, &self.faces, &self.overlay_options, &map);

        Ok(scene)
    }
}

#[cfg(target_os = "android")]
fn get_native_gl_version() -> GLVersion {
    GLVersion::GLES3
}

#[cfg(target_os = "windows")]
fn get_native_gl_version() -> GLVersion {
    GLVersion::GL4
}

#[cfg(not(any(target_os = "android", target_os = "windows")))]
fn get_native_gl_version() -> GLVersion {
    GLVersion::GL3
}
