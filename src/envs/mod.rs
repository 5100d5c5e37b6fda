pub mod simplesim_agent;

pub use simplesim_agent::{METADATA, REWARD_RANGE, SimpleSimAgentEnv};
