pub mod ur5;

pub use ur5::{ActionDim, EnvConfig, ObstacleAvoidanceEnv, ResetMode, ResetOptions, TargetMotion};
