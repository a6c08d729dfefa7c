//! Reward shaping and termination for the avoidance task.
//!
//! The arm should hold its start configuration, move as little as possible
//! and keep at least `MINIMUM_DISTANCE` from the obstacle.

use std::fmt;

use super::telemetry::{OBSERVATION_LEN, Observation, Telemetry, obs};

/// Closer than this to the obstacle is penalized, in meters.
pub const MINIMUM_DISTANCE: f64 = 0.3;
/// Farther than this is tracked in diagnostics but not penalized, in meters.
pub const MAXIMUM_DISTANCE: f64 = 0.6;

/// Gate on the summed absolute joint deltas for the stay-still bonus.
const DELTA_GATE: f64 = 0.5;
/// Scale of the per-step shaping terms.
const SHAPING_SCALE: f64 = 1.0 / 1000.0;

/// How an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalStatus {
    Collision,
    Success,
}

impl FinalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FinalStatus::Collision => "collision",
            FinalStatus::Success => "success",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Every reward term for one step, including the ones left out of the total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardBreakdown {
    /// Bonus for staying close to the start configuration.
    pub dr: f64,
    /// Bonus for small actions.
    pub act_r: f64,
    /// Penalty for being closer than `MINIMUM_DISTANCE`.
    pub dist: f64,
    /// Penalty for being farther than `MAXIMUM_DISTANCE`. Not part of the total.
    pub dist_max: f64,
    /// Reward for pointing at the target (polar angle). Not part of the total.
    pub p1_r: f64,
    /// Reward for pointing at the target (azimuth). Not part of the total.
    pub p2_r: f64,
    pub distance_to_target: f64,
}

impl RewardBreakdown {
    pub fn total(&self) -> f64 { self.dr + self.act_r + self.dist }
}

/// Reward and termination for one step.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub reward: RewardBreakdown,
    pub final_status: Option<FinalStatus>,
    pub target_coord: [f64; 3],
}

impl Evaluation {
    pub fn done(&self) -> bool { self.final_status.is_some() }
}

/// Score one step from the raw telemetry, the observation derived from it and
/// the action that produced it. Pure: equal inputs give equal outputs.
pub fn evaluate(
    telemetry: &Telemetry,
    observation: &Observation,
    action: &[f64],
    elapsed_steps: u32,
    max_episode_steps: u32,
) -> Evaluation {
    let target_coord = telemetry.target_position();
    let distance_to_target = telemetry.distance_to_target();

    let polar_1 = observation[1].to_degrees().abs();
    let polar_2 = observation[2].to_degrees().abs();
    let p1_r = (1.0 - polar_1 / 90.0) * SHAPING_SCALE;
    let p2_r = (1.0 - polar_2 / 90.0) * SHAPING_SCALE;

    // The gate reads the trailing six components, the magnitude reads the delta slice.
    let gate: f64 = observation[OBSERVATION_LEN - 6..].iter().map(|v| v.abs()).sum();
    let delta_joint_pos: f64 = observation[obs::JOINT_DELTAS].iter().map(|v| v.abs()).sum();
    let dr = if gate < DELTA_GATE { (1.0 - delta_joint_pos / DELTA_GATE) * SHAPING_SCALE } else { 0.0 };

    let dim = action.len() as f64;
    let act_abs: f64 = action.iter().map(|a| a.abs()).sum();
    let act_sq: f64 = action.iter().map(|a| a * a).sum();
    let act_r = if act_abs <= dim { (1.0 - act_sq / dim) * SHAPING_SCALE } else { 0.0 };

    let per_step = 1.0 / max_episode_steps as f64;
    let dist = if distance_to_target < MINIMUM_DISTANCE { -2.0 * per_step } else { 0.0 };
    let dist_max = if distance_to_target > MAXIMUM_DISTANCE { -per_step } else { 0.0 };

    let final_status = if telemetry.collision() {
        Some(FinalStatus::Collision)
    } else if elapsed_steps >= max_episode_steps {
        Some(FinalStatus::Success)
    } else {
        None
    };

    Evaluation {
        reward: RewardBreakdown { dr, act_r, dist, dist_max, p1_r, p2_r, distance_to_target },
        final_status,
        target_coord,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::ur5::telemetry::{TELEMETRY_LEN, layout};

    fn telemetry(target: [f64; 3], ee: [f64; 3], collision: bool) -> Telemetry {
        let mut raw = vec![0.0; TELEMETRY_LEN];
        raw[layout::TARGET_POSITION].copy_from_slice(&target);
        raw[layout::EE_POSITION].copy_from_slice(&ee);
        raw[layout::EE_ORIENTATION].copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
        raw[layout::COLLISION] = if collision { 1.0 } else { 0.0 };
        Telemetry::from_raw(raw).unwrap()
    }

    #[test]
    fn resting_at_start_earns_full_shaping() {
        let t = telemetry([1.0, 0.0, 0.0], [0.0; 3], false);
        let e = evaluate(&t, &[0.0; OBSERVATION_LEN], &[0.0; 6], 1, 1000);
        assert!((e.reward.dr - 0.001).abs() < 1e-15);
        assert!((e.reward.act_r - 0.001).abs() < 1e-15);
        assert_eq!(e.reward.dist, 0.0);
        assert!((e.reward.total() - 0.002).abs() < 1e-15);
        assert!(!e.done());
    }

    #[test]
    fn large_deltas_disable_the_bonus() {
        let t = telemetry([1.0, 0.0, 0.0], [0.0; 3], false);
        let mut o = [0.0; OBSERVATION_LEN];
        o[9] = 0.3;
        o[10] = -0.3;
        let e = evaluate(&t, &o, &[0.0; 3], 1, 1000);
        assert_eq!(e.reward.dr, 0.0);
        o[10] = 0.0;
        let e = evaluate(&t, &o, &[0.0; 3], 1, 1000);
        assert!((e.reward.dr - 0.4 * 0.001).abs() < 1e-15);
    }

    #[test]
    fn saturated_action_earns_nothing() {
        let t = telemetry([1.0, 0.0, 0.0], [0.0; 3], false);
        let e = evaluate(&t, &[0.0; OBSERVATION_LEN], &[1.0, -1.0, 1.0, -1.0, 1.0], 1, 1000);
        assert!(e.reward.act_r.abs() < 1e-15);
    }

    #[test]
    fn distance_penalties_use_strict_inequalities() {
        let o = [0.0; OBSERVATION_LEN];
        let at_min = evaluate(&telemetry([0.3, 0.0, 0.0], [0.0; 3], false), &o, &[0.0; 6], 1, 1000);
        assert_eq!(at_min.reward.dist, 0.0);
        let at_max = evaluate(&telemetry([0.6, 0.0, 0.0], [0.0; 3], false), &o, &[0.0; 6], 1, 1000);
        assert_eq!(at_max.reward.dist_max, 0.0);

        let close = evaluate(&telemetry([0.1, 0.0, 0.0], [0.0; 3], false), &o, &[0.0; 6], 1, 1000);
        assert!((close.reward.dist + 0.002).abs() < 1e-15);
        let far = evaluate(&telemetry([0.9, 0.0, 0.0], [0.0; 3], false), &o, &[0.0; 6], 1, 1000);
        assert!((far.reward.dist_max + 0.001).abs() < 1e-15);
        // dist_max never reaches the total.
        assert!((far.reward.total() - 0.002).abs() < 1e-15);
    }

    #[test]
    fn collision_and_step_limit_end_the_episode() {
        let o = [0.0; OBSERVATION_LEN];
        let hit = evaluate(&telemetry([1.0, 0.0, 0.0], [0.0; 3], true), &o, &[0.0; 6], 3, 1000);
        assert_eq!(hit.final_status, Some(FinalStatus::Collision));
        assert_eq!(hit.target_coord, [1.0, 0.0, 0.0]);

        let limit = evaluate(&telemetry([1.0, 0.0, 0.0], [0.0; 3], false), &o, &[0.0; 6], 1000, 1000);
        assert_eq!(limit.final_status, Some(FinalStatus::Success));
        assert_eq!(limit.final_status.unwrap().to_string(), "success");
    }

    #[test]
    fn pointing_terms_follow_the_polar_angles() {
        let t = telemetry([1.0, 0.0, 0.0], [0.0; 3], false);
        let mut o = [0.0; OBSERVATION_LEN];
        o[1] = std::f64::consts::FRAC_PI_4;
        o[2] = -std::f64::consts::PI;
        let e = evaluate(&t, &o, &[0.0; 6], 1, 1000);
        assert!((e.reward.p1_r - 0.5 * 0.001).abs() < 1e-15);
        assert!((e.reward.p2_r + 0.001).abs() < 1e-15);
        // Reported only; the total is the same as when looking straight at the target.
        let straight = evaluate(&t, &[0.0; OBSERVATION_LEN], &[0.0; 6], 1, 1000);
        assert!((straight.reward.p1_r - 0.001).abs() < 1e-15);
        assert_eq!(e.reward.total(), straight.reward.total());
    }

    #[test]
    fn collision_wins_over_step_limit() {
        let o = [0.0; OBSERVATION_LEN];
        let e = evaluate(&telemetry([1.0, 0.0, 0.0], [0.0; 3], true), &o, &[0.0; 6], 1000, 1000);
        assert_eq!(e.final_status, Some(FinalStatus::Collision));
    }
}
