//! Robot-server transport seam.
//!
//! Environments never talk to the network directly. They are handed a
//! [`RobotServer`] which performs one blocking request/response per call.
//! A gRPC client, a recorded-log replayer or the in-process
//! [`LoopbackServer`] all plug in here.

pub mod loopback;

use std::collections::BTreeMap;

use crate::robots::NUM_JOINTS;

pub use loopback::LoopbackServer;

/// Reset-state request sent to the robot server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateMsg {
    /// Raw robot-server state vector (same layout as telemetry).
    pub state: Vec<f64>,
    /// Named numeric parameters, e.g. target-motion settings.
    pub float_params: BTreeMap<String, f64>,
    /// Named string parameters, e.g. `function = "triangle_wave"`.
    pub string_params: BTreeMap<String, String>,
}

impl StateMsg {
    pub fn new(state: Vec<f64>) -> Self {
        Self { state, ..Self::default() }
    }

    pub fn with_float<K: Into<String>>(mut self, key: K, value: f64) -> Self {
        self.float_params.insert(key.into(), value);
        self
    }

    pub fn with_string<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.string_params.insert(key.into(), value.into());
        self
    }
}

/// Blocking request/response channel to a robot server.
///
/// Joint vectors crossing this boundary are in ROS order.
pub trait RobotServer {
    /// Apply a reset state. Returns false if the server rejected it.
    fn set_state(&mut self, msg: &StateMsg) -> bool;

    /// Command the six joint positions. Returns false if the server rejected it.
    fn send_action(&mut self, joint_positions: &[f64; NUM_JOINTS]) -> bool;

    /// Read the current state vector.
    fn get_state(&mut self) -> Vec<f64>;
}

impl<S: RobotServer + ?Sized> RobotServer for &mut S {
    fn set_state(&mut self, msg: &StateMsg) -> bool { (**self).set_state(msg) }
    fn send_action(&mut self, joint_positions: &[f64; NUM_JOINTS]) -> bool { (**self).send_action(joint_positions) }
    fn get_state(&mut self) -> Vec<f64> { (**self).get_state() }
}

impl<S: RobotServer + ?Sized> RobotServer for Box<S> {
    fn set_state(&mut self, msg: &StateMsg) -> bool { (**self).set_state(msg) }
    fn send_action(&mut self, joint_positions: &[f64; NUM_JOINTS]) -> bool { (**self).send_action(joint_positions) }
    fn get_state(&mut self) -> Vec<f64> { (**self).get_state() }
}
