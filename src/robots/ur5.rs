//! UR5 arm model: joint limits, joint ordering and normalization.
//!
//! Two joint orders are in play. The *standard* order runs from shoulder pan
//! to wrist 3. The robot server reports and accepts joints in *ROS* order,
//! which swaps the shoulder pan and elbow joints.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

pub const NUM_JOINTS: usize = 6;

/// Denavit-Hartenberg parameters `(d, a, alpha)` per joint, standard order.
const DH_PARAMS: [(f64, f64, f64); NUM_JOINTS] = [
    (0.089159, 0.0, FRAC_PI_2),
    (0.0, -0.425, 0.0),
    (0.0, -0.39225, 0.0),
    (0.10915, 0.0, FRAC_PI_2),
    (0.09465, 0.0, -FRAC_PI_2),
    (0.0823, 0.0, 0.0),
];

/// `ROS_JOINT_ORDER[i]` is the index in the source list that lands at `i`.
/// The permutation is its own inverse.
const ROS_JOINT_ORDER: [usize; NUM_JOINTS] = [2, 1, 0, 3, 4, 5];

/// Static description of a UR5 arm.
#[derive(Clone, Debug, PartialEq)]
pub struct Ur5 {
    max_joint_positions: [f64; NUM_JOINTS],
    min_joint_positions: [f64; NUM_JOINTS],
}

impl Default for Ur5 { fn default() -> Self { Self::new() } }

impl Ur5 {
    pub fn new() -> Self {
        let max_pos = [6.28; NUM_JOINTS];
        Self { max_joint_positions: max_pos, min_joint_positions: max_pos.map(|v| -v) }
    }

    pub fn max_joint_positions(&self) -> &[f64; NUM_JOINTS] { &self.max_joint_positions }
    pub fn min_joint_positions(&self) -> &[f64; NUM_JOINTS] { &self.min_joint_positions }

    /// Reorder a ROS-ordered joint list into standard order.
    pub fn ros_to_standard(ros: &[f64; NUM_JOINTS]) -> [f64; NUM_JOINTS] {
        ROS_JOINT_ORDER.map(|i| ros[i])
    }

    /// Reorder a standard-ordered joint list into ROS order.
    pub fn standard_to_ros(joints: &[f64; NUM_JOINTS]) -> [f64; NUM_JOINTS] {
        ROS_JOINT_ORDER.map(|i| joints[i])
    }

    /// Scale standard-order joint positions into `[-1, 1]`.
    /// Negative values are divided by the lower limit, positive ones by the upper.
    pub fn normalize_joint_values(&self, joints: &[f64; NUM_JOINTS]) -> [f64; NUM_JOINTS] {
        let mut out = *joints;
        for (i, q) in out.iter_mut().enumerate() {
            if *q <= 0.0 {
                *q /= self.min_joint_positions[i].abs();
            } else {
                *q /= self.max_joint_positions[i].abs();
            }
        }
        out
    }

    /// Inverse of [`normalize_joint_values`](Self::normalize_joint_values).
    pub fn denormalize_joint_values(&self, normalized: &[f64; NUM_JOINTS]) -> [f64; NUM_JOINTS] {
        let mut out = *normalized;
        for (i, q) in out.iter_mut().enumerate() {
            if *q <= 0.0 {
                *q *= self.min_joint_positions[i].abs();
            } else {
                *q *= self.max_joint_positions[i].abs();
            }
        }
        out
    }
}

/// Base-frame pose of the tool flange for standard-order joint angles.
/// Returns the position and the orientation as `[x, y, z, w]`.
pub fn forward_kinematics(joints: &[f64; NUM_JOINTS]) -> ([f64; 3], [f64; 4]) {
    let mut transform = Isometry3::identity();
    for (&theta, &(d, a, alpha)) in joints.iter().zip(DH_PARAMS.iter()) {
        transform *= Isometry3::from_parts(
            Translation3::new(0.0, 0.0, d),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta),
        );
        transform *= Isometry3::from_parts(
            Translation3::new(a, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), alpha),
        );
    }
    let t = transform.translation.vector;
    // nalgebra stores quaternion coordinates as (i, j, k, w).
    let q = transform.rotation.quaternion().coords;
    ([t.x, t.y, t.z], [q[0], q[1], q[2], q[3]])
}
