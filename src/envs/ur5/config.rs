//! Environment configuration.
//!
//! One [`EnvConfig`] covers every variant of the avoidance task: the action
//! dimensionality, how the obstacle moves, and where the robot server lives.

use crate::client::StateMsg;
use crate::core::{GymError, Result};
use crate::robots::NUM_JOINTS;
use crate::utils::rng::RngStream;
use rand::Rng;

/// Fixed joint configuration the arm starts from and actions are offset against.
pub const DEFAULT_JOINT_POSITIONS: [f64; NUM_JOINTS] = [-0.78, -1.31, -1.31, -2.18, 1.57, 0.0];

/// Allowed range for joint positions right after a reset.
pub const INITIAL_JOINT_POSITIONS_LOW: [f64; NUM_JOINTS] = [-0.9, -1.5, -1.5, -3.14, 1.3, 0.0];
pub const INITIAL_JOINT_POSITIONS_HIGH: [f64; NUM_JOINTS] = [-0.7, -1.1, -1.1, 3.14, 1.7, 0.0];

const fn default_max_episode_steps() -> u32 { 1000 }
const fn default_reset_tolerance() -> f64 { 0.1 }

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() { Ok(()) } else { Err(GymError::Validation(format!("`{name}` must be finite, got {value}"))) }
}

fn check_range(name: &str, lo: f64, hi: f64) -> Result<()> {
    check_finite(name, lo)?;
    check_finite(name, hi)?;
    if lo > hi {
        return Err(GymError::Validation(format!("`{name}` range [{lo}, {hi}] is empty")));
    }
    Ok(())
}

/// Number of joints the agent controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionDim {
    /// Shoulder lift, elbow and wrist 1.
    Three,
    /// Every joint except wrist 3.
    Five,
    #[default]
    Six,
}

impl ActionDim {
    pub fn len(self) -> usize {
        match self {
            ActionDim::Three => 3,
            ActionDim::Five => 5,
            ActionDim::Six => 6,
        }
    }

    /// Standard-order joint indices the action components are added to.
    pub fn joint_range(self) -> std::ops::Range<usize> {
        match self {
            ActionDim::Three => 1..4,
            ActionDim::Five => 0..5,
            ActionDim::Six => 0..6,
        }
    }

    pub fn from_len(n: usize) -> Option<Self> {
        match n {
            3 => Some(ActionDim::Three),
            5 => Some(ActionDim::Five),
            6 => Some(ActionDim::Six),
            _ => None,
        }
    }
}

/// Obstacle moving up and down on a vertical line in front of the robot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerticalOscillation {
    pub x: f64,
    pub y: f64,
    /// Amplitude is drawn uniformly from this inclusive range at every reset.
    pub z_amplitude_range: (f64, f64),
    pub z_frequency: f64,
    /// Offset is drawn uniformly from this inclusive range at every reset.
    pub z_offset_range: (f64, f64),
}

impl Default for VerticalOscillation {
    fn default() -> Self {
        Self { x: 0.13, y: -0.30, z_amplitude_range: (0.09, 0.35), z_frequency: 0.125, z_offset_range: (0.2, 0.6) }
    }
}

/// Obstacle following a random 3D spline inside a bounding box.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SplinePath {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    /// Control points of the spline.
    pub n_points: u32,
    /// Samples along the whole path; one per server cycle.
    pub n_sampling_points: u32,
}

impl Default for SplinePath {
    fn default() -> Self {
        Self { x_min: -0.7, x_max: 0.7, y_min: 0.2, y_max: 1.0, z_min: 0.1, z_max: 1.0, n_points: 10, n_sampling_points: 4000 }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetMotion {
    Vertical(VerticalOscillation),
    Spline(SplinePath),
}

impl Default for TargetMotion {
    fn default() -> Self { TargetMotion::Vertical(VerticalOscillation::default()) }
}

impl TargetMotion {
    /// Name understood by the robot server's obstacle controller.
    pub fn function_name(&self) -> &'static str {
        match self {
            TargetMotion::Vertical(_) => "triangle_wave",
            TargetMotion::Spline(_) => "3d_spline",
        }
    }

    /// Attach this motion's parameters to a reset message, drawing the
    /// randomized ones from `rng`.
    pub fn apply_to(&self, msg: StateMsg, rng: &mut RngStream) -> StateMsg {
        let msg = msg.with_string("function", self.function_name());
        match self {
            TargetMotion::Vertical(v) => {
                let z_amplitude = rng.gen_range(v.z_amplitude_range.0..=v.z_amplitude_range.1);
                let z_offset = rng.gen_range(v.z_offset_range.0..=v.z_offset_range.1);
                msg.with_float("x", v.x)
                    .with_float("y", v.y)
                    .with_float("z_amplitude", z_amplitude)
                    .with_float("z_frequency", v.z_frequency)
                    .with_float("z_offset", z_offset)
            }
            TargetMotion::Spline(s) => msg
                .with_float("x_min", s.x_min)
                .with_float("x_max", s.x_max)
                .with_float("y_min", s.y_min)
                .with_float("y_max", s.y_max)
                .with_float("z_min", s.z_min)
                .with_float("z_max", s.z_max)
                .with_float("n_points", s.n_points as f64)
                .with_float("n_sampling_points", s.n_sampling_points as f64),
        }
    }

    /// Reject parameters the reset sampling or the server cannot use.
    pub fn validate(&self) -> Result<()> {
        match self {
            TargetMotion::Vertical(v) => {
                check_finite("x", v.x)?;
                check_finite("y", v.y)?;
                check_finite("z_frequency", v.z_frequency)?;
                check_range("z_amplitude_range", v.z_amplitude_range.0, v.z_amplitude_range.1)?;
                check_range("z_offset_range", v.z_offset_range.0, v.z_offset_range.1)
            }
            TargetMotion::Spline(s) => {
                check_range("x", s.x_min, s.x_max)?;
                check_range("y", s.y_min, s.y_max)?;
                check_range("z", s.z_min, s.z_max)?;
                if s.n_points < 2 || s.n_sampling_points == 0 {
                    return Err(GymError::Validation(format!(
                        "spline needs at least 2 points and 1 sample, got {} and {}",
                        s.n_points, s.n_sampling_points
                    )));
                }
                Ok(())
            }
        }
    }

    /// Base yaw of the simulated world for this motion type.
    fn world_yaw(&self) -> f64 {
        match self {
            TargetMotion::Vertical(_) => 3.14,
            TargetMotion::Spline(_) => -0.78,
        }
    }
}

/// Arguments for the simulated robot-server launch file.
/// The process itself is started elsewhere; this only describes it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationLaunch {
    pub ip: Option<String>,
    pub lower_bound_port: Option<u16>,
    pub upper_bound_port: Option<u16>,
    pub gui: bool,
    pub world_name: String,
    pub yaw: f64,
    pub max_velocity_scale_factor: f64,
    pub action_cycle_rate: u32,
    pub target_model_name: String,
}

impl SimulationLaunch {
    /// Launch arguments matching the given target motion.
    pub fn for_motion(motion: &TargetMotion) -> Self {
        Self {
            ip: None,
            lower_bound_port: None,
            upper_bound_port: None,
            gui: false,
            world_name: "box100.world".to_string(),
            yaw: motion.world_yaw(),
            max_velocity_scale_factor: 0.2,
            action_cycle_rate: 20,
            target_model_name: "box100".to_string(),
        }
    }

    /// The `roslaunch` command line for this simulation.
    pub fn command(&self) -> String {
        format!(
            "roslaunch ur_robot_server ur5_sim_robot_server.launch world_name:={} yaw:={} reference_frame:=world \
             max_velocity_scale_factor:={} action_cycle_rate:={} rviz_gui:=false gazebo_gui:={} \
             obstacle_controller:=true target_mode:=moving target_model_name:={}",
            self.world_name, self.yaw, self.max_velocity_scale_factor, self.action_cycle_rate, self.gui, self.target_model_name
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Deployment {
    Simulated(SimulationLaunch),
    /// A real arm behind a robot server at a known address.
    Physical { address: Option<String> },
}

impl Deployment {
    pub fn is_real_robot(&self) -> bool { matches!(self, Deployment::Physical { .. }) }

    /// Launch command for simulated deployments.
    pub fn launch_command(&self) -> Option<String> {
        match self {
            Deployment::Simulated(launch) => Some(launch.command()),
            Deployment::Physical { .. } => None,
        }
    }
}

/// Full description of one avoidance environment variant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvConfig {
    pub action_dim: ActionDim,
    pub target_motion: TargetMotion,
    pub deployment: Deployment,
    #[cfg_attr(feature = "serde", serde(default = "default_max_episode_steps"))]
    pub max_episode_steps: u32,
    /// Slack allowed around the initial joint range after a reset, in radians.
    #[cfg_attr(feature = "serde", serde(default = "default_reset_tolerance"))]
    pub reset_tolerance: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        let target_motion = TargetMotion::default();
        let deployment = Deployment::Simulated(SimulationLaunch::for_motion(&target_motion));
        Self {
            action_dim: ActionDim::default(),
            target_motion,
            deployment,
            max_episode_steps: default_max_episode_steps(),
            reset_tolerance: default_reset_tolerance(),
        }
    }
}

impl EnvConfig {
    /// Simulated config for the given action dimension and motion.
    pub fn simulated(action_dim: ActionDim, target_motion: TargetMotion) -> Self {
        let deployment = Deployment::Simulated(SimulationLaunch::for_motion(&target_motion));
        Self { action_dim, target_motion, deployment, ..Self::default() }
    }

    /// Real-robot config for the given action dimension and motion.
    pub fn physical(action_dim: ActionDim, target_motion: TargetMotion) -> Self {
        Self { action_dim, target_motion, deployment: Deployment::Physical { address: None }, ..Self::default() }
    }

    /// Check every field a reset or step depends on.
    pub fn validate(&self) -> Result<()> {
        if self.max_episode_steps == 0 {
            return Err(GymError::Validation("`max_episode_steps` must be at least 1".into()));
        }
        if !(self.reset_tolerance.is_finite() && self.reset_tolerance >= 0.0) {
            return Err(GymError::Validation(format!(
                "`reset_tolerance` must be finite and non-negative, got {}",
                self.reset_tolerance
            )));
        }
        self.target_motion.validate()
    }
}
