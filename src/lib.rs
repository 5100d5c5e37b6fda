//! Gymnasium-style client environment for a remote Duckietown road simulator.
//!
//! Physics, rendering and domain randomization all happen in a separate
//! simulator process. [`SimpleSimAgentEnv`] forwards `reset`, `step` and
//! `render` to it over ZeroMQ, one blocking round trip per call, and exposes
//! fixed action and observation spaces.
//!
//! ```no_run
//! use gym_duckietown_agent::{Env, RenderMode, SimpleSimAgentEnv};
//!
//! # fn main() -> gym_duckietown_agent::Result<()> {
//! let mut env = SimpleSimAgentEnv::new(false)?;
//! let step = env.step(vec![0.5, 0.0])?;
//! if let Some(frame) = env.render(RenderMode::RgbArray, false)? {
//!     println!("{:?} reward={}", frame.shape(), step.reward);
//! }
//! env.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod envs;
pub mod registry;
pub mod remote;
pub mod spaces;
pub mod utils;
pub mod viewer;

pub use crate::config::{CAMERA_HEIGHT, CAMERA_WIDTH, ClientConfig};
pub use crate::core::{Env, GymError, Info, InfoValue, Metadata, RenderFrame, RenderMode, Result, Step};
pub use crate::envs::SimpleSimAgentEnv;
pub use crate::remote::{RemoteRobot, Reply};
#[cfg(feature = "zmq")]
pub use crate::remote::ZmqRobot;
pub use crate::spaces::{BoxSpace, Image, ImageSpace, Space};
pub use crate::utils::{encode_png, save_png};
pub use crate::viewer::{LogViewer, Viewer, ViewerFactory};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_inserts_and_replaces() {
        let mut info = Info::new();
        assert!(info.is_empty());
        info.insert("episode", InfoValue::from(3i64));
        info.insert("episode", InfoValue::from(4i64));
        info.insert("tile", "straight".into());
        assert_eq!(info.len(), 2);
        assert_eq!(info.get("episode"), Some(&InfoValue::I64(4)));
        assert_eq!(info.to_string(), r#"{episode: I64(4), tile: Str("straight")}"#);
        assert_eq!(Info::new().to_string(), "{}");
    }

    #[test]
    fn render_modes_parse_from_gym_names() {
        assert_eq!("human".parse::<RenderMode>().unwrap(), RenderMode::Human);
        assert_eq!("rgb_array".parse::<RenderMode>().unwrap(), RenderMode::RgbArray);
        assert!(matches!("ansi".parse::<RenderMode>(), Err(GymError::NotSupported(_))));
        assert_eq!(RenderMode::default().to_string(), "human");
    }
}
