use crate::core::{GymError, RenderFrame, Result};

/// Encode a pixel frame as PNG bytes.
/// Requires the `image` feature; without it this returns `GymError::NotSupported`.
pub fn encode_png(frame: &RenderFrame) -> Result<Vec<u8>> {
    match frame {
        RenderFrame::Pixels { width, height, data } => encode_pixels_png(*width, *height, data),
    }
}

#[cfg(feature = "image")]
fn encode_pixels_png(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::{ColorType, ImageEncoder};

    let count = (width as usize) * (height as usize);
    let color = match pixels.len() {
        n if n == count => ColorType::L8,
        n if n == count * 3 => ColorType::Rgb8,
        n if n == count * 4 => ColorType::Rgba8,
        n => {
            return Err(GymError::InvalidObservation(format!(
                "pixel data length {n} does not fit a {width}x{height} frame"
            )));
        }
    };

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(pixels, width, height, color.into())
        .map_err(|e| GymError::Other(format!("PNG encode error: {e}")))?;
    Ok(buf)
}

#[cfg(not(feature = "image"))]
fn encode_pixels_png(_width: u32, _height: u32, _pixels: &[u8]) -> Result<Vec<u8>> {
    Err(GymError::NotSupported("PNG encoding requires the `image` feature".into()))
}

/// Save a frame as a PNG file. Requires the `image` feature.
pub fn save_png<P: AsRef<std::path::Path>>(path: P, frame: &RenderFrame) -> Result<()> {
    let bytes = encode_png(frame)?;
    std::fs::write(path, bytes).map_err(|e| GymError::Other(format!("failed to write PNG: {e}")))
}
