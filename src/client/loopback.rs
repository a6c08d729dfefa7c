//! In-process robot server.
//!
//! Joint commands are applied instantly, the end-effector pose comes from
//! UR5 forward kinematics, and the obstacle follows the motion requested in
//! the last reset message. The collision flag is raised whenever the
//! obstacle is within `collision_radius` of the end effector.

use rand::Rng;
use tracing::debug;

use super::{RobotServer, StateMsg};
use crate::envs::ur5::telemetry::{TELEMETRY_LEN, layout};
use crate::robots::{NUM_JOINTS, Ur5, ur5::forward_kinematics};
use crate::utils::rng::{RngStream, rng_from_seed};

const DEFAULT_CYCLE_RATE: f64 = 20.0;
const DEFAULT_COLLISION_RADIUS: f64 = 0.05;

#[derive(Clone, Debug)]
enum Motion {
    Fixed([f64; 3]),
    Triangle { x: f64, y: f64, amplitude: f64, frequency: f64, offset: f64 },
    Path(Vec<[f64; 3]>),
}

/// Uniform draw from `[lo, hi]`; `None` for an empty or non-finite interval.
fn uniform(rng: &mut RngStream, lo: f64, hi: f64) -> Option<f64> {
    (lo.is_finite() && hi.is_finite() && lo <= hi).then(|| rng.gen_range(lo..=hi))
}

/// Triangle wave with period 1 and range `[-1, 1]`.
fn triangle_wave(s: f64) -> f64 {
    let p = s - s.floor();
    if p < 0.5 { 4.0 * p - 1.0 } else { 3.0 - 4.0 * p }
}

/// Closed Catmull-Rom spline through `points`, sampled `n` times.
fn sample_closed_spline(points: &[[f64; 3]], n: usize) -> Vec<[f64; 3]> {
    let m = points.len();
    (0..n)
        .map(|k| {
            let u = k as f64 * m as f64 / n as f64;
            let i = u.floor() as usize;
            let t = u - i as f64;
            let p0 = points[(i + m - 1) % m];
            let p1 = points[i % m];
            let p2 = points[(i + 1) % m];
            let p3 = points[(i + 2) % m];
            let mut out = [0.0; 3];
            for d in 0..3 {
                out[d] = 0.5
                    * (2.0 * p1[d]
                        + (p2[d] - p0[d]) * t
                        + (2.0 * p0[d] - 5.0 * p1[d] + 4.0 * p2[d] - p3[d]) * t * t
                        + (3.0 * p1[d] - p0[d] - 3.0 * p2[d] + p3[d]) * t * t * t);
            }
            out
        })
        .collect()
}

/// Robot server living in the current process.
pub struct LoopbackServer {
    rng: RngStream,
    joints_ros: [f64; NUM_JOINTS],
    prev_joints_ros: [f64; NUM_JOINTS],
    motion: Motion,
    cycle: u64,
    cycle_rate: f64,
    collision_radius: f64,
    reject_commands: bool,
}

impl Default for LoopbackServer { fn default() -> Self { Self::new(0) } }

impl LoopbackServer {
    /// `seed` drives the random control points of spline motions.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: rng_from_seed(seed),
            joints_ros: [0.0; NUM_JOINTS],
            prev_joints_ros: [0.0; NUM_JOINTS],
            motion: Motion::Fixed([1.0, 1.0, 1.0]),
            cycle: 0,
            cycle_rate: DEFAULT_CYCLE_RATE,
            collision_radius: DEFAULT_COLLISION_RADIUS,
            reject_commands: false,
        }
    }

    pub fn with_collision_radius(mut self, radius: f64) -> Self {
        self.collision_radius = radius;
        self
    }

    /// Make every following `set_state`/`send_action` fail (or succeed again).
    pub fn set_reject_commands(&mut self, reject: bool) { self.reject_commands = reject; }

    /// Pin the obstacle to a fixed position until the next reset.
    pub fn hold_target_at(&mut self, position: [f64; 3]) { self.motion = Motion::Fixed(position); }

    /// Joint positions last commanded, in standard order.
    pub fn joint_positions(&self) -> [f64; NUM_JOINTS] { Ur5::ros_to_standard(&self.joints_ros) }

    fn target_position(&self) -> [f64; 3] {
        match &self.motion {
            Motion::Fixed(p) => *p,
            Motion::Triangle { x, y, amplitude, frequency, offset } => {
                let t = self.cycle as f64 / self.cycle_rate;
                [*x, *y, offset + amplitude * triangle_wave(frequency * t)]
            }
            Motion::Path(samples) => samples[(self.cycle as usize) % samples.len()],
        }
    }

    fn parse_motion(&mut self, msg: &StateMsg) -> Option<Motion> {
        let f = |key: &str| msg.float_params.get(key).copied();
        match msg.string_params.get("function").map(String::as_str) {
            None => Some(self.motion.clone()),
            Some("triangle_wave") => Some(Motion::Triangle {
                x: f("x")?,
                y: f("y")?,
                amplitude: f("z_amplitude")?,
                frequency: f("z_frequency")?,
                offset: f("z_offset")?,
            }),
            Some("3d_spline") => {
                let (x_min, x_max) = (f("x_min")?, f("x_max")?);
                let (y_min, y_max) = (f("y_min")?, f("y_max")?);
                let (z_min, z_max) = (f("z_min")?, f("z_max")?);
                let n_points = f("n_points")? as usize;
                let n_samples = f("n_sampling_points")? as usize;
                if n_points < 2 || n_samples == 0 {
                    return None;
                }
                let points = (0..n_points)
                    .map(|_| {
                        Some([
                            uniform(&mut self.rng, x_min, x_max)?,
                            uniform(&mut self.rng, y_min, y_max)?,
                            uniform(&mut self.rng, z_min, z_max)?,
                        ])
                    })
                    .collect::<Option<Vec<[f64; 3]>>>()?;
                Some(Motion::Path(sample_closed_spline(&points, n_samples)))
            }
            Some(_) => None,
        }
    }
}

impl RobotServer for LoopbackServer {
    fn set_state(&mut self, msg: &StateMsg) -> bool {
        if self.reject_commands || msg.state.len() != TELEMETRY_LEN {
            return false;
        }
        let Some(motion) = self.parse_motion(msg) else {
            return false;
        };
        self.motion = motion;
        self.joints_ros.copy_from_slice(&msg.state[layout::JOINT_POSITIONS]);
        self.prev_joints_ros = self.joints_ros;
        self.cycle = 0;
        debug!(joints = ?self.joints_ros, "loopback server reset");
        true
    }

    fn send_action(&mut self, joint_positions: &[f64; NUM_JOINTS]) -> bool {
        if self.reject_commands {
            return false;
        }
        self.prev_joints_ros = self.joints_ros;
        self.joints_ros = *joint_positions;
        self.cycle += 1;
        true
    }

    fn get_state(&mut self) -> Vec<f64> {
        let (ee_position, ee_orientation) = forward_kinematics(&self.joint_positions());
        let target = self.target_position();
        let distance = target.iter().zip(ee_position.iter()).map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt();

        let mut state = vec![0.0; TELEMETRY_LEN];
        state[layout::TARGET_POSITION].copy_from_slice(&target);
        state[layout::JOINT_POSITIONS].copy_from_slice(&self.joints_ros);
        for (i, v) in state[layout::JOINT_VELOCITIES].iter_mut().enumerate() {
            *v = (self.joints_ros[i] - self.prev_joints_ros[i]) * self.cycle_rate;
        }
        state[layout::EE_POSITION].copy_from_slice(&ee_position);
        state[layout::EE_ORIENTATION].copy_from_slice(&ee_orientation);
        state[layout::COLLISION] = if distance < self.collision_radius { 1.0 } else { 0.0 };
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_wave_spans_unit_range() {
        assert_eq!(triangle_wave(0.0), -1.0);
        assert_eq!(triangle_wave(0.25), 0.0);
        assert_eq!(triangle_wave(0.5), 1.0);
        assert_eq!(triangle_wave(1.0), -1.0);
    }

    #[test]
    fn spline_passes_through_control_points() {
        let pts = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let samples = sample_closed_spline(&pts, 8);
        assert_eq!(samples.len(), 8);
        assert_eq!(samples[0], pts[0]);
        assert_eq!(samples[2], pts[1]);
    }

    #[test]
    fn echoes_commanded_joints() {
        let mut server = LoopbackServer::new(1);
        let mut state = vec![0.0; TELEMETRY_LEN];
        state[layout::JOINT_POSITIONS].copy_from_slice(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert!(server.set_state(&StateMsg::new(state)));
        assert!(server.send_action(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        let s = server.get_state();
        assert_eq!(&s[layout::JOINT_POSITIONS], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(s[layout::JOINT_VELOCITIES.start], (1.0 - 0.1) * DEFAULT_CYCLE_RATE);
    }

    #[test]
    fn rejects_unknown_functions_and_bad_lengths() {
        let mut server = LoopbackServer::default();
        assert!(!server.set_state(&StateMsg::new(vec![0.0; 3])));
        let msg = StateMsg::new(vec![0.0; TELEMETRY_LEN]).with_string("function", "sine");
        assert!(!server.set_state(&msg));
        server.set_reject_commands(true);
        assert!(!server.send_action(&[0.0; NUM_JOINTS]));
    }

    #[test]
    fn inverted_spline_bounds_are_rejected() {
        let mut server = LoopbackServer::default();
        let msg = StateMsg::new(vec![0.0; TELEMETRY_LEN])
            .with_string("function", "3d_spline")
            .with_float("x_min", 0.7)
            .with_float("x_max", -0.7)
            .with_float("y_min", 0.2)
            .with_float("y_max", 1.0)
            .with_float("z_min", 0.1)
            .with_float("z_max", f64::NAN)
            .with_float("n_points", 10.0)
            .with_float("n_sampling_points", 100.0);
        assert!(!server.set_state(&msg));
        let mut rng = rng_from_seed(0);
        assert_eq!(uniform(&mut rng, 1.0, f64::INFINITY), None);
        assert_eq!(uniform(&mut rng, 0.5, 0.5), Some(0.5));
    }

    #[test]
    fn collision_flag_follows_radius() {
        let mut server = LoopbackServer::default().with_collision_radius(0.1);
        assert!(server.set_state(&StateMsg::new(vec![0.0; TELEMETRY_LEN])));
        let (ee, _) = forward_kinematics(&server.joint_positions());
        server.hold_target_at(ee);
        assert_eq!(server.get_state()[layout::COLLISION], 1.0);
        server.hold_target_at([ee[0] + 1.0, ee[1], ee[2]]);
        assert_eq!(server.get_state()[layout::COLLISION], 0.0);
    }
}
