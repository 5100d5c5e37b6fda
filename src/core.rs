// Core traits and types shared by every environment in the crate.

use std::fmt;
use std::str::FromStr;

use crate::spaces::{BoxSpace, ImageSpace};

/// A small ordered info map returned alongside every step.
/// The remote adapter always returns it empty; it exists for interface parity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: InfoValue) {
        let k = key.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(kk, _)| kk == &k) {
            *v = value;
        } else {
            self.entries.push((k, value));
        }
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{k}: {v:?}")?;
        }
        write!(f, "}}")
    }
}

/// Value types allowed in an info map.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl From<bool> for InfoValue { fn from(v: bool) -> Self { InfoValue::Bool(v) } }
impl From<i64> for InfoValue { fn from(v: i64) -> Self { InfoValue::I64(v) } }
impl From<f64> for InfoValue { fn from(v: f64) -> Self { InfoValue::F64(v) } }
impl From<&str> for InfoValue { fn from(v: &str) -> Self { InfoValue::Str(v.to_string()) } }
impl From<String> for InfoValue { fn from(v: String) -> Self { InfoValue::Str(v) } }

/// A frame in a form that can be handed to encoders and windows.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderFrame {
    /// Raw pixel buffer in row-major RGB or RGBA format.
    Pixels {
        width: u32,
        height: u32,
        /// Pixel data. Convention: RGB uses 3 bytes per pixel, RGBA uses 4.
        data: Vec<u8>,
    },
}

/// How `Env::render` should present the current observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Draw into a persistent on-screen window.
    #[default]
    Human,
    /// Hand the raw observation back to the caller.
    RgbArray,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Human => "human",
            RenderMode::RgbArray => "rgb_array",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for RenderMode {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(RenderMode::Human),
            "rgb_array" => Ok(RenderMode::RgbArray),
            other => Err(GymError::NotSupported(format!("render mode `{other}`"))),
        }
    }
}

/// Static rendering metadata advertised by an environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub render_modes: &'static [RenderMode],
    pub video_frames_per_second: u32,
}

/// Result of a single `Env::step`.
///
/// `observation` is `None` when the simulator had no frame ready; callers must
/// handle that case explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs> {
    pub observation: Option<Obs>,
    pub reward: f32,
    pub done: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Option<Obs>, reward: f32, done: bool, info: Info) -> Self {
        Self { observation, reward, done, info }
    }
}

/// Errors surfaced by environments and the remote transport.
#[derive(thiserror::Error, Debug)]
pub enum GymError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed reply from simulator: {0}")]
    Protocol(String),
    #[error("Viewer error: {0}")]
    Viewer(String),
    #[error("Other error: {0}")]
    Other(String),
}

#[cfg(feature = "zmq")]
impl From<zmq::Error> for GymError {
    fn from(e: zmq::Error) -> Self { GymError::Transport(e.to_string()) }
}

impl From<serde_json::Error> for GymError {
    fn from(e: serde_json::Error) -> Self { GymError::Protocol(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, GymError>;

/// Agent/environment contract.
///
/// Every call is synchronous; implementations backed by a remote process block
/// until the reply arrives.
pub trait Env {
    type Obs;
    type Act;

    /// Start a new episode. Produces no observation: call `step` or `render`
    /// to fetch one.
    fn reset(&mut self) -> Result<()>;

    /// Apply an action and advance the simulation by one step.
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>>;

    /// Present the current observation. Returns it for `RgbArray`, `None` for
    /// `Human`. `close` is accepted for interface compatibility and ignored.
    fn render(&mut self, mode: RenderMode, close: bool) -> Result<Option<Self::Obs>>;

    /// Echo the seed back as a single-element list.
    fn seed(&mut self, seed: Option<u64>) -> Vec<Option<u64>> { vec![seed] }

    /// Release local resources.
    fn close(&mut self) {}

    fn action_space(&self) -> &BoxSpace<f32, 2>;

    fn observation_space(&self) -> &ImageSpace;

    fn reward_range(&self) -> (f32, f32);

    fn metadata(&self) -> &Metadata;
}
