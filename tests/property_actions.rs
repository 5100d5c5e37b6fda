use gym_duckietown_agent::{Env, GymError, RemoteRobot, Reply, Result, SimpleSimAgentEnv};
use proptest::prelude::*;

/// Counts steps and replies with the action components as reward/done.
#[derive(Default)]
struct TallyRobot {
    steps: usize,
}

impl RemoteRobot for TallyRobot {
    fn reset(&mut self) -> Result<()> { Ok(()) }

    fn step(&mut self, action: [f32; 2], _with_observation: bool) -> Result<Option<Reply>> {
        self.steps += 1;
        Ok(Some(Reply { observation: None, reward: action[0], done: action[1] > 0.0 }))
    }

    fn observe(&mut self) -> Result<Reply> { Ok(Reply::default()) }
}

proptest! {
    // Any action that is not exactly two values is refused before reaching the simulator.
    #[test]
    fn wrong_length_actions_are_rejected(action in proptest::collection::vec(-5.0f32..5.0, 0..16)) {
        prop_assume!(action.len() != 2);
        let mut env = SimpleSimAgentEnv::with_robot(TallyRobot::default(), false).unwrap();
        let rejected = matches!(env.step(action), Err(GymError::InvalidAction(_)));
        prop_assert!(rejected);
        prop_assert_eq!(env.robot().steps, 0);
    }

    // Two-value actions reach the simulator untouched, in or out of the nominal box.
    #[test]
    fn two_value_actions_pass_through(v in -10.0f32..10.0, s in -10.0f32..10.0) {
        let mut env = SimpleSimAgentEnv::with_robot(TallyRobot::default(), false).unwrap();
        let step = env.step(vec![v, s]).unwrap();
        prop_assert_eq!(step.reward, v);
        prop_assert_eq!(step.done, s > 0.0);
        prop_assert!(step.info.is_empty());
        prop_assert_eq!(env.robot().steps, 1);
    }

    // The seed is echoed back verbatim.
    #[test]
    fn seed_echoes_any_value(seed in any::<u64>()) {
        let mut env = SimpleSimAgentEnv::with_robot(TallyRobot::default(), false).unwrap();
        prop_assert_eq!(env.seed(Some(seed)), vec![Some(seed)]);
    }
}
