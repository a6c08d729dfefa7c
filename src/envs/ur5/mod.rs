pub mod avoidance;
pub mod config;
pub mod reward;
pub mod telemetry;

pub use avoidance::{Diagnostics, ObstacleAvoidanceEnv, ResetMode, ResetOptions, commanded_joint_positions};
pub use config::{ActionDim, Deployment, EnvConfig, SimulationLaunch, SplinePath, TargetMotion, VerticalOscillation};
pub use reward::{Evaluation, FinalStatus, RewardBreakdown};
pub use telemetry::{OBSERVATION_LEN, Observation, StateTransform, TELEMETRY_LEN, Telemetry};
