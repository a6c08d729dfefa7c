//! UR5 obstacle avoidance.
//!
//! A box-shaped obstacle moves in front of the arm. The agent should keep the
//! arm near its start configuration while staying clear of the obstacle.
//! Observations: target polar coordinates in the end-effector frame (3),
//! normalized joint positions (6), deltas to the start configuration (6).
//! Actions: offsets in `[-1, 1]` on 3, 5 or 6 joints of the default configuration.
//! Episodes end on collision or after `max_episode_steps` steps.

use std::fmt;

use tracing::{debug, info, warn};

use crate::client::{RobotServer, StateMsg};
use crate::core::{Env, GymError, Info, InfoValue, RenderFrame, Result, Step};
use crate::robots::{NUM_JOINTS, Ur5};
use crate::spaces::BoxSpace;
use crate::utils::rng::{RngStream, rng_from_optional_seed, rng_from_seed};

use super::config::{
    ActionDim, DEFAULT_JOINT_POSITIONS, EnvConfig, INITIAL_JOINT_POSITIONS_HIGH, INITIAL_JOINT_POSITIONS_LOW,
};
use super::reward::{self, FinalStatus, RewardBreakdown};
use super::telemetry::{OBSERVATION_LEN, Observation, StateTransform, TELEMETRY_LEN, Telemetry, layout, obs};

/// Where the initial joint configuration of a reset comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetMode {
    /// Start from the default configuration.
    #[default]
    Random,
    /// Resume from the last configuration reached in an unfinished episode, if any.
    Continue,
}

/// Arguments for [`ObstacleAvoidanceEnv::reset_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResetOptions {
    pub seed: Option<u64>,
    /// Explicit standard-order start configuration; must have six entries.
    pub initial_joint_positions: Option<Vec<f64>>,
    pub mode: ResetMode,
}

/// Snapshot of the last step, for logging and text rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub action: Vec<f64>,
    pub observation: Observation,
    /// Standard-order joint velocities from the step telemetry.
    pub joint_velocities: [f64; NUM_JOINTS],
    pub reward: RewardBreakdown,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.observation;
        writeln!(f, "Action: {:?}", self.action)?;
        writeln!(f, "Distance: {:.2}", o[0])?;
        writeln!(f, "Polar 1 (degree): {:.2}", o[1].to_degrees())?;
        writeln!(f, "Polar 2 (degree): {:.2}", o[2].to_degrees())?;
        write!(f, "Joint Positions:")?;
        for (i, v) in o[obs::JOINT_POSITIONS].iter().enumerate() {
            write!(f, " [{}]:{:.2e}", i + 1, v)?;
        }
        write!(f, "\nJoint PosDeltas:")?;
        for (i, v) in o[obs::JOINT_DELTAS].iter().enumerate() {
            write!(f, " [{}]:{:.2e}", i + 1, v)?;
        }
        let sum: f64 = o[obs::JOINT_DELTAS].iter().map(|v| v.abs()).sum();
        writeln!(f, "\nSum of Deltas: {sum:.2e}")?;
        write!(f, "Joint Velocities:")?;
        for (i, v) in self.joint_velocities.iter().enumerate() {
            write!(f, " [{}]:{:.2e}", i + 1, v)?;
        }
        writeln!(f)?;
        let r = &self.reward;
        write!(
            f,
            "Reward: dr={:.5} no_act={:.5} min_dist={:.5} max_dist={:.5} total={:.5}",
            r.dr, r.act_r, r.dist, r.dist_max, r.total()
        )
    }
}

/// Joint command for an action: the default configuration with the action
/// added to the joints selected by its dimensionality.
pub fn commanded_joint_positions(action_dim: ActionDim, action: &[f64]) -> [f64; NUM_JOINTS] {
    let mut joints = DEFAULT_JOINT_POSITIONS;
    for (q, a) in joints[action_dim.joint_range()].iter_mut().zip(action.iter()) {
        *q += a;
    }
    joints
}

/// Obstacle-avoidance environment driving a robot server through `S`.
pub struct ObstacleAvoidanceEnv<S: RobotServer> {
    config: EnvConfig,
    server: S,
    transform: StateTransform,
    observation_space: BoxSpace,
    action_space: BoxSpace,
    rng: RngStream,

    elapsed_steps: u32,
    state: Observation,
    /// Normalized joint positions right after the last reset.
    start_position: [f64; NUM_JOINTS],
    /// Configuration to resume from on a `Continue` reset; cleared when an episode ends.
    last_position_on_success: Option<[f64; NUM_JOINTS]>,
    prev_telemetry: Option<Telemetry>,
    last_diagnostics: Option<Diagnostics>,
}

impl<S: RobotServer> ObstacleAvoidanceEnv<S> {
    /// Create an environment whose target sampling draws from OS entropy.
    pub fn new(config: EnvConfig, server: S) -> Self {
        Self::build(config, server, rng_from_optional_seed(None))
    }

    /// Create an environment with reproducible target sampling.
    pub fn with_seed(config: EnvConfig, server: S, seed: u64) -> Self {
        Self::build(config, server, rng_from_seed(seed))
    }

    fn build(config: EnvConfig, server: S, rng: RngStream) -> Self {
        let transform = StateTransform::new(Ur5::new(), &DEFAULT_JOINT_POSITIONS);
        let observation_space = transform.observation_space();
        let action_space = BoxSpace::uniform(config.action_dim.len(), -1.0, 1.0);
        Self {
            config,
            server,
            transform,
            observation_space,
            action_space,
            rng,
            elapsed_steps: 0,
            state: [0.0; OBSERVATION_LEN],
            start_position: [0.0; NUM_JOINTS],
            last_position_on_success: None,
            prev_telemetry: None,
            last_diagnostics: None,
        }
    }

    pub fn config(&self) -> &EnvConfig { &self.config }
    pub fn observation_space(&self) -> &BoxSpace { &self.observation_space }
    pub fn action_space(&self) -> &BoxSpace { &self.action_space }
    pub fn elapsed_steps(&self) -> u32 { self.elapsed_steps }
    pub fn state(&self) -> &Observation { &self.state }
    pub fn start_position(&self) -> &[f64; NUM_JOINTS] { &self.start_position }
    pub fn last_position_on_success(&self) -> Option<&[f64; NUM_JOINTS]> { self.last_position_on_success.as_ref() }
    pub fn prev_telemetry(&self) -> Option<&Telemetry> { self.prev_telemetry.as_ref() }
    pub fn last_diagnostics(&self) -> Option<&Diagnostics> { self.last_diagnostics.as_ref() }
    pub fn server(&self) -> &S { &self.server }
    pub fn server_mut(&mut self) -> &mut S { &mut self.server }
    pub fn into_server(self) -> S { self.server }

    /// Reset with an explicit start configuration and mode.
    pub fn reset_with(&mut self, options: ResetOptions) -> Result<(Observation, Info)> {
        self.config.validate()?;
        if let Some(seed) = options.seed {
            self.rng = rng_from_seed(seed);
        }
        self.elapsed_steps = 0;
        self.state = [0.0; OBSERVATION_LEN];
        self.last_diagnostics = None;

        let initial = match options.initial_joint_positions.as_deref() {
            Some(joints) => <[f64; NUM_JOINTS]>::try_from(joints).map_err(|_| {
                GymError::Validation(format!(
                    "initial joint positions need {NUM_JOINTS} values, got {}",
                    joints.len()
                ))
            })?,
            None => match (options.mode, self.last_position_on_success) {
                (ResetMode::Continue, Some(last)) => last,
                _ => DEFAULT_JOINT_POSITIONS,
            },
        };

        let mut rs_state = vec![0.0; TELEMETRY_LEN];
        rs_state[layout::JOINT_POSITIONS].copy_from_slice(&Ur5::standard_to_ros(&initial));
        let msg = self.config.target_motion.apply_to(StateMsg::new(rs_state), &mut self.rng);
        info!(
            function = self.config.target_motion.function_name(),
            params = ?msg.float_params,
            initial_joints = ?initial,
            "resetting robot server"
        );
        if !self.server.set_state(&msg) {
            warn!("robot server rejected set_state");
            return Err(GymError::Server("set_state".into()));
        }

        let telemetry = Telemetry::from_raw(self.server.get_state())?.sanitized();
        self.prev_telemetry = Some(telemetry.clone());

        let state = self.transform.observe(&telemetry)?;
        self.start_position.copy_from_slice(&state[obs::JOINT_POSITIONS]);
        self.check_observation(&state)?;
        self.state = state;

        if options.mode == ResetMode::Random || self.last_position_on_success.is_none() {
            self.check_reset_joint_positions(&telemetry.joint_positions())?;
        }

        Ok((self.state, Info::new()))
    }

    /// Apply an action given as a slice.
    pub fn step_slice(&mut self, action: &[f64]) -> Result<Step<Observation>> {
        self.config.validate()?;
        if action.len() != self.config.action_dim.len() || !self.action_space.contains_slice(action) {
            return Err(GymError::Validation(format!(
                "action {:?} is not in the {}-dimensional action space",
                action,
                self.action_space.dim()
            )));
        }
        self.elapsed_steps += 1;

        let command = commanded_joint_positions(self.config.action_dim, action);
        if !self.server.send_action(&Ur5::standard_to_ros(&command)) {
            warn!(step = self.elapsed_steps, "robot server rejected send_action");
            return Err(GymError::Server("send_action".into()));
        }

        // The raw reading feeds the reward as-is; the transform zeroes NaNs on its own.
        let telemetry = Telemetry::from_raw(self.server.get_state())?;
        self.prev_telemetry = Some(telemetry.clone());

        let state = self.transform.observe(&telemetry)?;
        self.check_observation(&state)?;
        self.state = state;

        let evaluation = reward::evaluate(
            &telemetry,
            &self.state,
            action,
            self.elapsed_steps,
            self.config.max_episode_steps,
        );
        let r = &evaluation.reward;
        debug!(
            step = self.elapsed_steps,
            dr = r.dr,
            no_act = r.act_r,
            min_dist = r.dist,
            max_dist = r.dist_max,
            distance = r.distance_to_target,
            "reward composition"
        );

        let mut info = Info::new();
        match evaluation.final_status {
            Some(status) => {
                info.insert("final_status", InfoValue::from(status.as_str()));
                info.insert("target_coord", InfoValue::from(evaluation.target_coord));
                self.last_position_on_success = None;
                info!(step = self.elapsed_steps, status = %status, "episode finished");
            }
            None => self.last_position_on_success = Some(telemetry.sanitized().joint_positions()),
        }

        let diagnostics = Diagnostics {
            action: action.to_vec(),
            observation: self.state,
            joint_velocities: telemetry.joint_velocities(),
            reward: evaluation.reward,
        };
        debug!("{diagnostics}");
        let reward = diagnostics.reward.total();
        self.last_diagnostics = Some(diagnostics);

        Ok(Step::new(
            self.state,
            reward,
            evaluation.final_status == Some(FinalStatus::Collision),
            evaluation.final_status == Some(FinalStatus::Success),
            info,
        ))
    }

    fn check_observation(&self, state: &Observation) -> Result<()> {
        match self.observation_space.first_violation(state) {
            None => Ok(()),
            Some((index, value)) => {
                warn!(index, value, "observation outside observation space");
                Err(GymError::InvalidState(format!("observation component {index} = {value} is out of bounds")))
            }
        }
    }

    fn check_reset_joint_positions(&self, joints: &[f64; NUM_JOINTS]) -> Result<()> {
        let tol = self.config.reset_tolerance;
        for (i, q) in joints.iter().enumerate() {
            if q + tol < INITIAL_JOINT_POSITIONS_LOW[i] || q - tol > INITIAL_JOINT_POSITIONS_HIGH[i] {
                warn!(joint = i, position = q, "reset joint position outside allowed range");
                return Err(GymError::InvalidState(format!(
                    "reset joint positions are not within defined range: joint {i} at {q}"
                )));
            }
        }
        Ok(())
    }
}

impl<S: RobotServer> Env for ObstacleAvoidanceEnv<S> {
    type Obs = Observation;
    type Act = Vec<f64>;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.reset_with(ResetOptions { seed, ..ResetOptions::default() })
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> { self.step_slice(&action) }

    fn render(&self) -> Option<RenderFrame> {
        self.last_diagnostics.as_ref().map(|d| RenderFrame::Text(d.to_string()))
    }
}
