//! A minimal seam for the platform rendering surface.
//!
//! The camera subsystem and the on-screen surface are external
//! collaborators; this trait is the whole contract the preview needs from
//! them: GL access, the viewport, and the display-rotation query.

use std::collections::HashMap;

use gl::types::GLuint;
use pathfinder_gl::{GLDevice, GLVersion};
use pathfinder_geometry::rect::RectI;
use pathfinder_geometry::vector::Vector2I;
use pathfinder_resources::ResourceLoader;
use rayon::ThreadPoolBuilder;

use crate::transform::DisplayRotation;

pub trait Surface {
    fn gl_version(&self) -> GLVersion;
    fn gl_default_framebuffer(&self) -> GLuint {
        0
    }
    fn present(&mut self, device: &mut GLDevice);

    fn viewport(&self) -> RectI;
    /// Current display rotation, `None` while it cannot be determined.
    fn display_rotation(&self) -> Option<DisplayRotation>;
    fn resource_loader(&self) -> &dyn ResourceLoader;

    fn adjust_thread_pool_settings(&self, builder: ThreadPoolBuilder) -> ThreadPoolBuilder {
        builder
    }
}

/// Layout and lifecycle notifications the embedder forwards to the
/// controller.
#[derive(Clone, Copy, Debug)]
pub enum SurfaceEvent {
    Quit,
    Resized(SurfaceSize),
    RotationChanged(Option<DisplayRotation>),
    LensSwitched,
}

#[derive(Clone, Copy, Debug)]
pub struct SurfaceSize {
    pub logical_size: Vector2I,
    pub backing_scale_factor: f32,
}

impl SurfaceSize {
    #[inline]
    pub fn device_size(&self) -> Vector2I {
        (self.logical_size.to_f32() * self.backing_scale_factor).to_i32()
    }
}

/// In-memory shader resource loader for embedders without a filesystem.
pub struct MemResourceLoader {
    map: HashMap<String, Vec<u8>>,
}

impl Default for MemResourceLoader {
    fn default() -> Self {
        let map = Default::default();

        Self { map }
    }
}

impl MemResourceLoader {
    pub fn insert(&mut self, virtual_path: &str, data: Vec<u8>) {
        self.map.insert(virtual_path.to_owned(), data);
    }
}

impl ResourceLoader for MemResourceLoader {
    fn slurp(&self, virtual_path: &str) -> Result<Vec<u8>, std::io::Error> {
        match self.map.get(virtual_path) {
            Some(data) => Ok(data.clone()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("preview resource isn't found, path = {}", virtual_path),
            )),
        }
    }
}
