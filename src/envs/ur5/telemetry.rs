//! Robot-server telemetry and its mapping to agent observations.

use std::ops::Range;

use crate::core::{GymError, Result};
use crate::robots::{NUM_JOINTS, Ur5};
use crate::spaces::BoxSpace;
use crate::utils::geometry::{cartesian_to_polar_3d, change_reference_frame, unit_quaternion_xyzw};

/// Index layout of the robot-server state vector.
pub mod layout {
    use std::ops::Range;

    /// Target position `[x, y, z]`. Indices 3..6 hold the target orientation.
    pub const TARGET_POSITION: Range<usize> = 0..3;
    /// Joint positions, ROS order.
    pub const JOINT_POSITIONS: Range<usize> = 6..12;
    /// Joint velocities, ROS order.
    pub const JOINT_VELOCITIES: Range<usize> = 12..18;
    pub const EE_POSITION: Range<usize> = 18..21;
    /// End-effector orientation quaternion `[x, y, z, w]`.
    pub const EE_ORIENTATION: Range<usize> = 21..25;
    pub const COLLISION: usize = 25;
    pub const LEN: usize = 26;
}

pub const TELEMETRY_LEN: usize = layout::LEN;
pub const OBSERVATION_LEN: usize = 15;

/// Agent observation: target polar coordinates in the end-effector frame,
/// normalized joint positions and their delta to the start configuration.
pub type Observation = [f64; OBSERVATION_LEN];

/// Slices of an [`Observation`].
pub mod obs {
    use std::ops::Range;

    pub const TARGET_POLAR: Range<usize> = 0..3;
    pub const JOINT_POSITIONS: Range<usize> = 3..9;
    pub const JOINT_DELTAS: Range<usize> = 9..15;
}

/// Joint position tolerance applied on top of the normalized `[-1, 1]` range.
const POSITION_TOLERANCE: f64 = 0.1;

/// One state vector as received from the robot server.
#[derive(Clone, Debug, PartialEq)]
pub struct Telemetry {
    raw: Vec<f64>,
}

impl Telemetry {
    /// Wrap a raw state vector, checking its length.
    pub fn from_raw(raw: Vec<f64>) -> Result<Self> {
        if raw.len() != TELEMETRY_LEN {
            return Err(GymError::InvalidState(format!(
                "robot server state has wrong length: expected {TELEMETRY_LEN}, got {}",
                raw.len()
            )));
        }
        Ok(Self { raw })
    }

    /// A copy with every NaN replaced by zero.
    pub fn sanitized(&self) -> Self {
        Self { raw: self.raw.iter().map(|v| if v.is_nan() { 0.0 } else { *v }).collect() }
    }

    pub fn as_slice(&self) -> &[f64] { &self.raw }

    fn array<const N: usize>(&self, range: Range<usize>) -> [f64; N] {
        let mut out = [0.0; N];
        out.copy_from_slice(&self.raw[range]);
        out
    }

    pub fn target_position(&self) -> [f64; 3] { self.array(layout::TARGET_POSITION) }
    pub fn joint_positions_ros(&self) -> [f64; NUM_JOINTS] { self.array(layout::JOINT_POSITIONS) }
    pub fn joint_velocities_ros(&self) -> [f64; NUM_JOINTS] { self.array(layout::JOINT_VELOCITIES) }

    /// Joint positions in standard order.
    pub fn joint_positions(&self) -> [f64; NUM_JOINTS] { Ur5::ros_to_standard(&self.joint_positions_ros()) }

    /// Joint velocities in standard order.
    pub fn joint_velocities(&self) -> [f64; NUM_JOINTS] { Ur5::ros_to_standard(&self.joint_velocities_ros()) }

    pub fn ee_position(&self) -> [f64; 3] { self.array(layout::EE_POSITION) }
    pub fn ee_orientation(&self) -> [f64; 4] { self.array(layout::EE_ORIENTATION) }

    /// True only when the collision flag is exactly 1.
    pub fn collision(&self) -> bool { self.raw[layout::COLLISION] == 1.0 }

    /// Euclidean distance between target and end effector, in the base frame.
    pub fn distance_to_target(&self) -> f64 {
        let t = self.target_position();
        let e = self.ee_position();
        t.iter().zip(e.iter()).map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt()
    }
}

/// Maps telemetry to observations for one arm and start configuration.
#[derive(Clone, Debug)]
pub struct StateTransform {
    ur5: Ur5,
    start_normalized: [f64; NUM_JOINTS],
}

impl StateTransform {
    /// `start_joints` is the standard-order configuration deltas are measured against.
    pub fn new(ur5: Ur5, start_joints: &[f64; NUM_JOINTS]) -> Self {
        let start_normalized = ur5.normalize_joint_values(start_joints);
        Self { ur5, start_normalized }
    }

    pub fn ur5(&self) -> &Ur5 { &self.ur5 }

    /// Observation box: polar part unbounded, joints and deltas in `[-1.1, 1.1]`.
    pub fn observation_space(&self) -> BoxSpace {
        let target = BoxSpace::uniform(3, f64::NEG_INFINITY, f64::INFINITY);
        let unit = BoxSpace::uniform(NUM_JOINTS, -1.0 - POSITION_TOLERANCE, 1.0 + POSITION_TOLERANCE);
        BoxSpace::concat(&[&target, &unit, &unit])
    }

    /// Compute the observation. NaNs in `telemetry` are treated as zero.
    pub fn observe(&self, telemetry: &Telemetry) -> Result<Observation> {
        let t = telemetry.sanitized();

        // End effector -> base: inverse rotation, negated translation.
        let ee_rotation = unit_quaternion_xyzw(t.ee_orientation()).ok_or_else(|| {
            GymError::InvalidState(format!("end-effector orientation is not a valid quaternion: {:?}", t.ee_orientation()))
        })?;
        let base_to_ee_rotation = ee_rotation.inverse();
        let base_to_ee_translation = t.ee_position().map(|v| -v);

        let target_ee = change_reference_frame(t.target_position(), base_to_ee_translation, &base_to_ee_rotation);
        let target_polar = cartesian_to_polar_3d(target_ee);

        let joints_norm = self.ur5.normalize_joint_values(&t.joint_positions());

        let mut observation = [0.0; OBSERVATION_LEN];
        observation[obs::TARGET_POLAR].copy_from_slice(&target_polar);
        observation[obs::JOINT_POSITIONS].copy_from_slice(&joints_norm);
        for (i, d) in observation[obs::JOINT_DELTAS].iter_mut().enumerate() {
            *d = joints_norm[i] - self.start_normalized[i];
        }
        Ok(observation)
    }
}
