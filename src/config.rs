//! Connection settings and camera constants.

use serde::{Deserialize, Serialize};

/// Width in pixels of the frames the simulator sends.
pub const CAMERA_WIDTH: usize = 160;
/// Height in pixels of the frames the simulator sends.
pub const CAMERA_HEIGHT: usize = 120;

/// Environment variable naming the simulator host. Inside the docker setup it
/// points at the server container; locally it is usually unset.
pub const SERVER_ENV_VAR: &str = "DUCKIETOWN_SERVER";
pub const DEFAULT_SERVER_HOST: &str = "localhost";

/// Port the simulator pulls commands from.
pub const DEFAULT_ACTION_PORT: u16 = 5558;
/// Port the simulator publishes observation frames on.
pub const DEFAULT_OBSERVATION_PORT: u16 = 5557;

/// Where to find the remote simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub action_port: u16,
    pub observation_port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            action_port: DEFAULT_ACTION_PORT,
            observation_port: DEFAULT_OBSERVATION_PORT,
        }
    }
}

impl ClientConfig {
    /// Resolve the host from `DUCKIETOWN_SERVER`, falling back to localhost.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a caller-supplied variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(SERVER_ENV_VAR)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());
        Self { host, ..Self::default() }
    }

    pub fn action_endpoint(&self) -> String { format!("tcp://{}:{}", self.host, self.action_port) }

    pub fn observation_endpoint(&self) -> String {
        format!("tcp://{}:{}", self.host, self.observation_port)
    }
}
