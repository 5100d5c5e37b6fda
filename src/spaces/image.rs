// Camera frames and the byte-image observation space.

use rand::Rng;
use rand::distributions::{Distribution, Uniform};

use crate::core::{GymError, RenderFrame, Result};
use crate::spaces::Space;

/// A row-major `height x width x channels` byte image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Image {
    /// An all-black RGB frame.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self { height, width, channels: 3, data: vec![0; height * width * 3] }
    }

    /// Wrap an existing buffer. The buffer length must equal `height * width * channels`.
    pub fn from_raw(height: usize, width: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let expected = height.checked_mul(width).and_then(|n| n.checked_mul(channels));
        if expected != Some(data.len()) {
            let needed = expected.map_or_else(|| "more than usize::MAX".to_string(), |n| n.to_string());
            return Err(GymError::InvalidObservation(format!(
                "buffer holds {} bytes, shape ({height}, {width}, {channels}) needs {needed}",
                data.len()
            )));
        }
        Ok(Self { height, width, channels, data })
    }

    pub fn height(&self) -> usize { self.height }
    pub fn width(&self) -> usize { self.width }
    pub fn channels(&self) -> usize { self.channels }

    /// `(height, width, channels)`
    pub fn shape(&self) -> (usize, usize, usize) { (self.height, self.width, self.channels) }

    pub fn as_bytes(&self) -> &[u8] { &self.data }
    pub fn into_bytes(self) -> Vec<u8> { self.data }

    /// Channel values of the pixel at row `y`, column `x`.
    pub fn pixel(&self, y: usize, x: usize) -> Option<&[u8]> {
        if y >= self.height || x >= self.width { return None; }
        let idx = (y * self.width + x) * self.channels;
        Some(&self.data[idx..idx + self.channels])
    }

    pub fn to_render_frame(&self) -> RenderFrame {
        RenderFrame::Pixels {
            width: self.width as u32,
            height: self.height as u32,
            data: self.data.clone(),
        }
    }
}

/// Fixed-shape image space with inclusive per-channel byte bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSpace {
    height: usize,
    width: usize,
    channels: usize,
    low: u8,
    high: u8,
}

impl ImageSpace {
    pub fn new(height: usize, width: usize, channels: usize, low: u8, high: u8) -> Self {
        assert!(low <= high, "low > high");
        Self { height, width, channels, low, high }
    }

    /// RGB frames with pixels anywhere in `[0, 255]`.
    pub fn rgb(height: usize, width: usize) -> Self { Self::new(height, width, 3, 0, 255) }

    pub fn low(&self) -> u8 { self.low }
    pub fn high(&self) -> u8 { self.high }
}

impl Space for ImageSpace {
    type Element = Image;

    fn shape(&self) -> Vec<usize> { vec![self.height, self.width, self.channels] }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        let dist = Uniform::new_inclusive(self.low, self.high);
        let data = (0..self.height * self.width * self.channels).map(|_| dist.sample(rng)).collect();
        Image { height: self.height, width: self.width, channels: self.channels, data }
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        elem.shape() == (self.height, self.width, self.channels)
            && elem.data.iter().all(|&v| self.low <= v && v <= self.high)
    }
}
