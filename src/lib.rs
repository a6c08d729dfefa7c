pub mod client;
pub mod core;
pub mod envs;
pub mod registry;
pub mod robots;
pub mod spaces;
pub mod utils;

pub use crate::client::{LoopbackServer, RobotServer, StateMsg};
pub use crate::core::{Env, GymError, Info, InfoValue, RenderFrame, Result, Step};
pub use crate::envs::ur5::{
    ActionDim, Deployment, EnvConfig, FinalStatus, ObstacleAvoidanceEnv, Observation, ResetMode, ResetOptions,
    SimulationLaunch, SplinePath, TargetMotion, Telemetry, VerticalOscillation,
};
pub use crate::registry::{EnvSpec, KwArgs, make, make_config};
pub use crate::robots::Ur5;
pub use crate::spaces::{BoxSpace, Space};

#[cfg(test)]
mod tests {
    use super::*;

    /// A tiny environment to check the trait contract.
    struct CounterEnv {
        state: i32,
    }

    impl Env for CounterEnv {
        type Obs = i32;
        type Act = i32;

        fn reset(&mut self, _seed: Option<u64>) -> Result<(Self::Obs, Info)> {
            self.state = 0;
            Ok((self.state, Info::new()))
        }

        fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
            if action < 0 {
                return Err(GymError::Validation(format!("negative action {action}")));
            }
            self.state += action;
            let terminated = self.state >= 3;
            Ok(Step::new(self.state, 1.0, terminated, false, Info::new()))
        }

        fn render(&self) -> Option<RenderFrame> {
            Some(RenderFrame::Text(format!("state={}", self.state)))
        }
    }

    #[test]
    fn dummy_env_runs() {
        let mut env = CounterEnv { state: 0 };
        env.reset(None).unwrap();
        let s1 = env.step(1).unwrap();
        assert_eq!(s1.observation, 1);
        assert!(!s1.done());
        let s2 = env.step(2).unwrap();
        assert_eq!(s2.observation, 3);
        assert!(s2.terminated && s2.done());
        assert!(matches!(env.step(-1), Err(GymError::Validation(_))));
        assert!(matches!(env.render(), Some(RenderFrame::Text(_))));
        env.close();
    }

    #[test]
    fn info_insert_replaces_existing_keys() {
        let mut info = Info::new();
        info.insert("final_status", InfoValue::from("collision"));
        info.insert("final_status", InfoValue::from("success"));
        info.insert("target_coord", InfoValue::from([0.1, 0.2, 0.3]));
        assert_eq!(info.len(), 2);
        assert_eq!(info.get_str("final_status"), Some("success"));
        assert_eq!(info.get("target_coord"), Some(&InfoValue::Vector(vec![0.1, 0.2, 0.3])));
        assert_eq!(info.get_str("target_coord"), None);
        let keys: Vec<&str> = info.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["final_status", "target_coord"]);
    }

    #[test]
    fn loopback_episode_runs_and_renders() {
        let config = EnvConfig::simulated(ActionDim::Five, TargetMotion::default());
        let mut env = ObstacleAvoidanceEnv::with_seed(config, LoopbackServer::new(0), 0);
        let (obs, _info) = env.reset(Some(0)).unwrap();
        assert!(env.observation_space().contains_slice(&obs));
        assert!(env.render().is_none());
        for _ in 0..10 {
            let s = env.step(vec![0.0; 5]).unwrap();
            assert_eq!(s.observation.len(), 15);
            if s.done() { break; }
        }
        assert!(matches!(env.render(), Some(RenderFrame::Text(_))));
    }
}
