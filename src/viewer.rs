//! Display targets for human-mode rendering.

use tracing::debug;

use crate::core::Result;
use crate::spaces::Image;

/// Something that can present camera frames to a person.
pub trait Viewer {
    fn show(&mut self, frame: &Image) -> Result<()>;
}

/// Builds the viewer the first time an environment renders in human mode.
/// Arguments are the frame height and width.
pub type ViewerFactory = Box<dyn FnMut(usize, usize) -> Result<Box<dyn Viewer>>>;

/// The viewer used when none is configured: an on-screen window.
#[cfg(feature = "viewer")]
pub fn default_viewer(height: usize, width: usize) -> Result<Box<dyn Viewer>> {
    Ok(Box::new(WindowViewer::new("gym-duckietown-agent", height, width)?))
}

/// The viewer used when none is configured: a log line per frame, since the
/// `viewer` feature is off.
#[cfg(not(feature = "viewer"))]
pub fn default_viewer(height: usize, width: usize) -> Result<Box<dyn Viewer>> {
    Ok(Box::new(LogViewer::new(height, width)))
}

/// Headless viewer that only reports what it would have drawn.
#[derive(Debug, Default)]
pub struct LogViewer {
    frames: u64,
}

impl LogViewer {
    pub fn new(height: usize, width: usize) -> Self {
        debug!(height, width, "no display available, logging frames instead");
        Self { frames: 0 }
    }

    pub fn frames_shown(&self) -> u64 { self.frames }
}

impl Viewer for LogViewer {
    fn show(&mut self, frame: &Image) -> Result<()> {
        self.frames += 1;
        let (h, w, c) = frame.shape();
        debug!(frame = self.frames, height = h, width = w, channels = c, "frame");
        Ok(())
    }
}

#[cfg(feature = "viewer")]
pub use window::WindowViewer;

#[cfg(feature = "viewer")]
mod window {
    use minifb::{Window, WindowOptions};

    use super::Viewer;
    use crate::core::{GymError, Result};
    use crate::spaces::Image;

    // minifb buffers are 0RGB; the top byte stays zero and alpha is dropped.
    fn rgb_to_u32(r: u8, g: u8, b: u8) -> u32 { (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b) }

    /// An on-screen window that is redrawn with every frame.
    pub struct WindowViewer {
        window: Window,
        buffer: Vec<u32>,
    }

    impl WindowViewer {
        pub fn new(title: &str, height: usize, width: usize) -> Result<Self> {
            let window = Window::new(title, width, height, WindowOptions::default())
                .map_err(|e| GymError::Viewer(e.to_string()))?;
            Ok(Self { window, buffer: vec![0; width * height] })
        }
    }

    impl Viewer for WindowViewer {
        fn show(&mut self, frame: &Image) -> Result<()> {
            let (h, w, c) = frame.shape();
            self.buffer.resize(w * h, 0);
            for (dst, px) in self.buffer.iter_mut().zip(frame.as_bytes().chunks_exact(c.max(1))) {
                *dst = match px {
                    [r, g, b, ..] => rgb_to_u32(*r, *g, *b),
                    [v, ..] => rgb_to_u32(*v, *v, *v),
                    [] => 0,
                };
            }
            self.window
                .update_with_buffer(&self.buffer, w, h)
                .map_err(|e| GymError::Viewer(e.to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::rgb_to_u32;

        #[test]
        fn pixels_pack_as_zero_rgb() {
            assert_eq!(rgb_to_u32(0x12, 0x34, 0x56), 0x0012_3456);
            assert_eq!(rgb_to_u32(255, 255, 255) >> 24, 0);
        }
    }
}
