//! Client side of the remote simulator link.

pub mod wire;
#[cfg(feature = "zmq")]
pub mod zmq_robot;

use crate::core::Result;
use crate::spaces::Image;

#[cfg(feature = "zmq")]
pub use zmq_robot::ZmqRobot;

/// One observation message from the simulator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reply {
    pub observation: Option<Image>,
    pub reward: f32,
    pub done: bool,
}

/// Requests the simulator understands. `reset` and `step` block until the
/// server answers; there is no timeout and no retry.
pub trait RemoteRobot {
    /// Start a new episode. The server re-randomizes its parameters.
    fn reset(&mut self) -> Result<()>;

    /// Send `(velocity, steering)`. With `with_observation`, wait for and
    /// return the resulting frame; otherwise return `None` right after sending.
    fn step(&mut self, action: [f32; 2], with_observation: bool) -> Result<Option<Reply>>;

    /// Read the latest frame without advancing the simulation. The reply has no
    /// observation when the server has not produced one yet.
    fn observe(&mut self) -> Result<Reply>;
}
