// Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;

use ur5_avoidance_gym::envs::ur5::config::DEFAULT_JOINT_POSITIONS;
use ur5_avoidance_gym::envs::ur5::telemetry::{TELEMETRY_LEN, layout};
use ur5_avoidance_gym::robots::{NUM_JOINTS, Ur5};
use ur5_avoidance_gym::{RobotServer, StateMsg};

/// Build a telemetry vector from standard-order joints and Cartesian points.
pub fn telemetry(joints: [f64; NUM_JOINTS], target: [f64; 3], ee: [f64; 3], collision: bool) -> Vec<f64> {
    let mut raw = vec![0.0; TELEMETRY_LEN];
    raw[layout::TARGET_POSITION].copy_from_slice(&target);
    raw[layout::JOINT_POSITIONS].copy_from_slice(&Ur5::standard_to_ros(&joints));
    raw[layout::EE_POSITION].copy_from_slice(&ee);
    raw[layout::EE_ORIENTATION].copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
    raw[layout::COLLISION] = if collision { 1.0 } else { 0.0 };
    raw
}

/// Arm at rest in the default configuration, obstacle one meter away.
pub fn resting() -> Vec<f64> {
    telemetry(DEFAULT_JOINT_POSITIONS, [1.0, 0.0, 0.5], [0.0, 0.0, 0.5], false)
}

/// Robot server replaying queued telemetry and recording every request.
pub struct ScriptedServer {
    pub queued: VecDeque<Vec<f64>>,
    /// Returned once the queue is empty.
    pub fallback: Vec<f64>,
    pub set_state_msgs: Vec<StateMsg>,
    pub actions: Vec<[f64; NUM_JOINTS]>,
    pub accept_set_state: bool,
    pub accept_actions: bool,
}

impl ScriptedServer {
    pub fn new(fallback: Vec<f64>) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback,
            set_state_msgs: Vec::new(),
            actions: Vec::new(),
            accept_set_state: true,
            accept_actions: true,
        }
    }

    pub fn push(&mut self, state: Vec<f64>) -> &mut Self {
        self.queued.push_back(state);
        self
    }
}

impl RobotServer for ScriptedServer {
    fn set_state(&mut self, msg: &StateMsg) -> bool {
        self.set_state_msgs.push(msg.clone());
        self.accept_set_state
    }

    fn send_action(&mut self, joint_positions: &[f64; NUM_JOINTS]) -> bool {
        self.actions.push(*joint_positions);
        self.accept_actions
    }

    fn get_state(&mut self) -> Vec<f64> {
        self.queued.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}
