use tracing::{debug, info, trace};

use crate::config::{CAMERA_HEIGHT, CAMERA_WIDTH};
use crate::core::{Env, GymError, Info, Metadata, RenderMode, Result, Step};
use crate::remote::{RemoteRobot, Reply};
use crate::spaces::{BoxSpace, Image, ImageSpace};
use crate::viewer::{Viewer, ViewerFactory, default_viewer};

#[cfg(feature = "zmq")]
use crate::{config::ClientConfig, remote::ZmqRobot};

/// Nominal reward bounds. Not enforced locally.
pub const REWARD_RANGE: (f32, f32) = (-1000.0, 1000.0);

pub static METADATA: Metadata = Metadata {
    render_modes: &[RenderMode::Human, RenderMode::RgbArray],
    video_frames_per_second: 30,
};

/// Client environment for the Duckietown road simulator.
///
/// The simulator (physics, rendering, domain randomization) runs in a separate
/// server process; `reset` and `step` are each one blocking round trip to it.
///
/// Actions: `(velocity, steering)`, each nominally in `[-1, 1]` where -1/1 mean
/// full speed backward/ahead and full left/right turn. Values outside the box
/// are forwarded untouched.
/// Observation: RGB camera frame of `CAMERA_HEIGHT x CAMERA_WIDTH` bytes, or
/// `None` when the server had no frame ready.
///
/// Known gaps, kept on purpose:
/// - `reset` returns no observation; fetch one with `step` or `render`.
/// - `seed` does not reach the simulator, whose randomness lives server side.
pub struct SimpleSimAgentEnv<R: RemoteRobot> {
    sim: R,
    debug: bool,
    action_space: BoxSpace<f32, 2>,
    observation_space: ImageSpace,
    last_obs: Image,
    viewer: Option<Box<dyn Viewer>>,
    viewer_factory: ViewerFactory,
}

#[cfg(feature = "zmq")]
impl SimpleSimAgentEnv<ZmqRobot> {
    /// Connect to the simulator named by `DUCKIETOWN_SERVER` (default
    /// `localhost`) and reset it. Blocks until the reset is acknowledged.
    pub fn new(debug: bool) -> Result<Self> {
        let config = ClientConfig::from_env();
        info!(host = %config.host, "connecting to simulator");
        Self::with_robot(ZmqRobot::connect(config)?, debug)
    }
}

impl<R: RemoteRobot> SimpleSimAgentEnv<R> {
    /// Wrap an existing connection and perform the initial reset.
    pub fn with_robot(sim: R, debug: bool) -> Result<Self> {
        let mut env = Self {
            sim,
            debug,
            action_space: BoxSpace::uniform(-1.0, 1.0),
            observation_space: ImageSpace::rgb(CAMERA_HEIGHT, CAMERA_WIDTH),
            last_obs: Image::zeros(CAMERA_HEIGHT, CAMERA_WIDTH),
            viewer: None,
            viewer_factory: Box::new(default_viewer),
        };
        env.reset()?;
        Ok(env)
    }

    /// Replace the factory used to open the human-mode viewer.
    /// Has no effect on a viewer that is already open.
    pub fn set_viewer_factory(&mut self, factory: ViewerFactory) { self.viewer_factory = factory; }

    pub fn debug(&self) -> bool { self.debug }

    /// Most recent non-empty observation returned by `step`; zeros before the first one.
    pub fn last_observation(&self) -> &Image { &self.last_obs }

    pub fn viewer_open(&self) -> bool { self.viewer.is_some() }

    pub fn robot(&self) -> &R { &self.sim }

    fn log_reply(&self, call: &str, reply: &Reply) {
        let shape = reply.observation.as_ref().map(Image::shape);
        if self.debug {
            info!(call, reward = reply.reward, done = reply.done, obs_shape = ?shape, "simulator reply");
        } else {
            trace!(call, reward = reply.reward, done = reply.done, obs_shape = ?shape, "simulator reply");
        }
    }

    fn draw(&mut self, observation: Option<&Image>) -> Result<()> {
        if self.viewer.is_none() {
            let (h, w) = (CAMERA_HEIGHT, CAMERA_WIDTH);
            debug!(height = h, width = w, "opening viewer");
            self.viewer = Some((self.viewer_factory)(h, w)?);
        }
        match (self.viewer.as_mut(), observation) {
            (Some(viewer), Some(obs)) => viewer.show(obs),
            _ => Ok(()),
        }
    }
}

/// Check the `(velocity, steering)` length contract.
fn steering_action(action: &[f32]) -> Result<[f32; 2]> {
    match *action {
        [velocity, steering] => Ok([velocity, steering]),
        _ => Err(GymError::InvalidAction(format!(
            "expected 2 values (velocity, steering), got {}",
            action.len()
        ))),
    }
}

impl<R: RemoteRobot> Env for SimpleSimAgentEnv<R> {
    type Obs = Image;
    type Act = Vec<f32>;

    /// Ask the simulator for a new episode; it re-randomizes its environment
    /// parameters. Nothing is returned.
    fn reset(&mut self) -> Result<()> {
        self.sim.reset()?;
        if self.debug { info!("simulator reset") } else { debug!("simulator reset") }
        Ok(())
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let action = steering_action(&action)?;
        let reply = self
            .sim
            .step(action, true)?
            .ok_or_else(|| GymError::Protocol("step reply missing".into()))?;
        self.log_reply("step", &reply);
        if let Some(obs) = &reply.observation {
            self.last_obs.clone_from(obs);
        }
        Ok(Step::new(reply.observation, reply.reward, reply.done, Info::new()))
    }

    /// Reads the current frame without advancing the simulation. Reward and
    /// done flag from that read are dropped. In human mode a missing frame is
    /// silently skipped.
    fn render(&mut self, mode: RenderMode, _close: bool) -> Result<Option<Self::Obs>> {
        let reply = self.sim.observe()?;
        self.log_reply("observe", &reply);
        match mode {
            RenderMode::RgbArray => Ok(reply.observation),
            RenderMode::Human => {
                self.draw(reply.observation.as_ref())?;
                Ok(None)
            }
        }
    }

    /// Not functional: the seed is never sent to the simulator. It is only
    /// echoed back.
    fn seed(&mut self, seed: Option<u64>) -> Vec<Option<u64>> {
        debug!(?seed, "seed is not forwarded to the simulator");
        vec![seed]
    }

    /// Closes the viewer, if one is open. The simulator connection stays usable.
    fn close(&mut self) {
        if self.viewer.take().is_some() {
            debug!("viewer closed");
        }
    }

    fn action_space(&self) -> &BoxSpace<f32, 2> { &self.action_space }

    fn observation_space(&self) -> &ImageSpace { &self.observation_space }

    fn reward_range(&self) -> (f32, f32) { REWARD_RANGE }

    fn metadata(&self) -> &Metadata { &METADATA }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_values_make_a_steering_action() {
        assert_eq!(steering_action(&[0.3, -0.7]).unwrap(), [0.3, -0.7]);
        // Out-of-range values are the server's business.
        assert_eq!(steering_action(&[4.0, -9.0]).unwrap(), [4.0, -9.0]);
    }

    #[test]
    fn other_lengths_are_rejected() {
        for bad in [&[][..], &[1.0][..], &[1.0, 0.0, 0.5][..]] {
            assert!(matches!(steering_action(bad), Err(GymError::InvalidAction(_))));
        }
    }
}
