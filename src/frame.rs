//! Camera frame buffers.

use std::path::Path;
use std::sync::Arc;

use image::ColorType;
use pathfinder_color::ColorU;
use pathfinder_content::pattern::Image;
use pathfinder_geometry::vector::Vector2I;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame dimensions must be positive, got {0}x{1}")]
    EmptySize(i32, i32),

    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BadLength {
        actual: usize,
        expected: usize,
        width: i32,
        height: i32,
    },

    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// One preview frame as delivered by the camera subsystem: tightly packed
/// row-major RGBA8, in the sensor's native orientation.
#[derive(Clone, Debug)]
pub struct Frame {
    size: Vector2I,
    data: Vec<u8>,
}

impl Frame {
    pub fn from_rgba(size: Vector2I, data: Vec<u8>) -> Result<Frame, FrameError> {
        if size.x() <= 0 || size.y() <= 0 {
            return Err(FrameError::EmptySize(size.x(), size.y()));
        }
        let expected = size.x() as usize * size.y() as usize * 4;
        if data.len() != expected {
            return Err(FrameError::BadLength {
                actual: data.len(),
                expected,
                width: size.x(),
                height: size.y(),
            });
        }
        Ok(Frame { size, data })
    }

    /// Single-color frame, handy for wiring tests and demos.
    pub fn solid(size: Vector2I, color: ColorU) -> Result<Frame, FrameError> {
        if size.x() <= 0 || size.y() <= 0 {
            return Err(FrameError::EmptySize(size.x(), size.y()));
        }
        let pixel = [color.r, color.g, color.b, color.a];
        let count = size.x() as usize * size.y() as usize;
        let mut data = Vec::with_capacity(count * 4);
        for _ in 0..count {
            data.extend_from_slice(&pixel);
        }
        Ok(Frame { size, data })
    }

    pub fn size(&self) -> Vector2I {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.x()
    }

    pub fn height(&self) -> i32 {
        self.size.y()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Converts the frame into a pattern image for scene painting.
    pub fn to_pattern_image(&self) -> Image {
        let pixels = self
            .data
            .chunks_exact(4)
            .map(|px| ColorU::new(px[0], px[1], px[2], px[3]))
            .collect::<Vec<_>>();
        Image::new(self.size, Arc::new(pixels))
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), FrameError> {
        image::save_buffer(
            path,
            &self.data,
            self.size.x() as u32,
            self.size.y() as u32,
            ColorType::Rgba8,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_geometry::vector::vec2i;

    #[test]
    fn length_is_validated() {
        let err = Frame::from_rgba(vec2i(2, 2), vec![0; 15]).unwrap_err();
        match err {
            FrameError::BadLength {
                actual, expected, ..
            } => {
                assert_eq!(actual, 15);
                assert_eq!(expected, 16);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(Frame::from_rgba(vec2i(2, 2), vec![0; 16]).is_ok());
    }

    #[test]
    fn zero_sized_frames_are_rejected() {
        assert!(Frame::from_rgba(vec2i(0, 4), Vec::new()).is_err());
        assert!(Frame::solid(vec2i(4, 0), ColorU::black()).is_err());
    }

    #[test]
    fn solid_frame_pixels() {
        let frame = Frame::solid(vec2i(3, 2), ColorU::new(1, 2, 3, 255)).unwrap();
        assert_eq!(frame.data().len(), 24);
        assert_eq!(&frame.data()[..4], &[1, 2, 3, 255]);

        let image = frame.to_pattern_image();
        assert_eq!(image.size(), vec2i(3, 2));
    }
}
