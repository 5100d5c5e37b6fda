//! Message encoding for the simulator link.
//!
//! Commands travel as single JSON objects. Observations come back as two-part
//! messages: a JSON header describing the pixel array, followed by the raw
//! little-endian array bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{GymError, Result};
use crate::remote::Reply;
use crate::spaces::Image;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Reset,
    Step,
}

/// A request pushed to the simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Address the simulator should publish replies for.
    pub ip: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<[f32; 2]>,
}

impl Command {
    pub fn reset(ip: &str) -> Self { Self { ip: ip.to_string(), kind: CommandKind::Reset, data: None } }

    pub fn step(ip: &str, action: [f32; 2]) -> Self {
        Self { ip: ip.to_string(), kind: CommandKind::Step, data: Some(action) }
    }

    pub fn encode(&self) -> Result<Vec<u8>> { Ok(serde_json::to_vec(self)?) }
}

/// First part of an observation message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    #[serde(default)]
    pub dtype: Option<String>,
    #[serde(default)]
    pub shape: Option<Vec<usize>>,
    #[serde(default)]
    pub reward: f32,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub misc: Option<Value>,
}

/// Decode a `[header, payload]` observation message.
pub fn decode_frame(header: &[u8], payload: &[u8]) -> Result<Reply> {
    let header: FrameHeader = serde_json::from_slice(header)?;
    let observation = decode_pixels(&header, payload)?;
    Ok(Reply { observation, reward: header.reward, done: header.done })
}

/// Encode a reply the way the simulator publishes it. Pixels are sent as `uint8`.
pub fn encode_frame(reply: &Reply) -> Result<(Vec<u8>, Vec<u8>)> {
    let (header, payload) = match &reply.observation {
        Some(img) => {
            let (h, w, c) = img.shape();
            let header = FrameHeader {
                dtype: Some("uint8".into()),
                shape: Some(vec![h, w, c]),
                reward: reply.reward,
                done: reply.done,
                misc: None,
            };
            (header, img.as_bytes().to_vec())
        }
        None => (FrameHeader { reward: reply.reward, done: reply.done, ..FrameHeader::default() }, Vec::new()),
    };
    Ok((serde_json::to_vec(&header)?, payload))
}

fn decode_pixels(header: &FrameHeader, payload: &[u8]) -> Result<Option<Image>> {
    let shape = match header.shape.as_deref() {
        None | Some([]) => return Ok(None),
        Some(shape) => shape,
    };
    if payload.is_empty() {
        return Ok(None);
    }
    let (h, w, c) = match *shape {
        [h, w, c] => (h, w, c),
        [h, w] => (h, w, 1),
        _ => return Err(GymError::Protocol(format!("unsupported observation shape {shape:?}"))),
    };
    let count = h
        .checked_mul(w)
        .and_then(|n| n.checked_mul(c))
        .ok_or_else(|| GymError::Protocol(format!("observation shape {shape:?} is too large")))?;
    let dtype = header.dtype.as_deref().unwrap_or("uint8");
    let bytes = match dtype {
        "uint8" => payload.to_vec(),
        "float32" => normalize_floats(&read_floats::<4>(payload, count, |b| f32::from_le_bytes(b) as f64)?),
        "float64" => normalize_floats(&read_floats::<8>(payload, count, f64::from_le_bytes)?),
        other => return Err(GymError::Protocol(format!("unsupported observation dtype `{other}`"))),
    };
    if bytes.len() != count {
        return Err(GymError::Protocol(format!(
            "observation payload has {} values, shape {shape:?} needs {count}",
            bytes.len()
        )));
    }
    Image::from_raw(h, w, c, bytes).map(Some)
}

fn read_floats<const W: usize>(payload: &[u8], count: usize, conv: fn([u8; W]) -> f64) -> Result<Vec<f64>> {
    let expected = count
        .checked_mul(W)
        .ok_or_else(|| GymError::Protocol(format!("{count} values of {W} bytes overflow the payload size")))?;
    if payload.len() != expected {
        return Err(GymError::Protocol(format!(
            "observation payload has {} bytes, expected {expected} ({count} x {W})",
            payload.len()
        )));
    }
    Ok(payload
        .chunks_exact(W)
        .map(|chunk| {
            let mut buf = [0u8; W];
            buf.copy_from_slice(chunk);
            conv(buf)
        })
        .collect())
}

// Floats in [0, 1] are treated as normalized intensities; anything else is
// assumed to already be on the byte scale.
fn normalize_floats(values: &[f64]) -> Vec<u8> {
    let unit = values.iter().all(|v| (0.0..=1.0).contains(v));
    let scale = if unit { 255.0 } else { 1.0 };
    values.iter().map(|v| (v * scale).round().clamp(0.0, 255.0) as u8).collect()
}
