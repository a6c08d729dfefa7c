mod common;

use proptest::prelude::*;

use common::telemetry;
use ur5_avoidance_gym::envs::ur5::reward::evaluate;
use ur5_avoidance_gym::envs::ur5::telemetry::{StateTransform, Telemetry};
use ur5_avoidance_gym::envs::ur5::config::DEFAULT_JOINT_POSITIONS;
use ur5_avoidance_gym::robots::Ur5;
use ur5_avoidance_gym::utils::geometry::{cartesian_to_polar_3d, polar_to_cartesian_3d};

fn joints() -> impl Strategy<Value = [f64; 6]> {
    prop::array::uniform6(-6.28f64..=6.28)
}

fn point() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-2.0f64..2.0)
}

proptest! {
    // Swapping into ROS order twice is the identity.
    #[test]
    fn joint_remapping_is_an_involution(q in joints()) {
        prop_assert_eq!(Ur5::ros_to_standard(&Ur5::standard_to_ros(&q)), q);
        prop_assert_eq!(Ur5::standard_to_ros(&Ur5::standard_to_ros(&q)), q);
    }

    // Normalization maps the joint range onto [-1, 1] and inverts cleanly.
    #[test]
    fn normalization_round_trips(q in joints()) {
        let ur5 = Ur5::new();
        let n = ur5.normalize_joint_values(&q);
        prop_assert!(n.iter().all(|v| (-1.0..=1.0).contains(v)));
        let back = ur5.denormalize_joint_values(&n);
        for i in 0..6 {
            prop_assert!((back[i] - q[i]).abs() < 1e-9);
        }
    }

    // Polar coordinates convert back to the same point for nonzero radius.
    #[test]
    fn polar_round_trips(p in point()) {
        let r = p.iter().map(|v| v * v).sum::<f64>().sqrt();
        prop_assume!(r > 1e-6);
        let polar = cartesian_to_polar_3d(p);
        prop_assert!((polar[0] - r).abs() < 1e-12);
        prop_assert!(polar[1] >= 0.0 && polar[1] <= std::f64::consts::PI);
        prop_assert!(polar[2] >= -std::f64::consts::PI && polar[2] <= std::f64::consts::PI);
        let back = polar_to_cartesian_3d(polar);
        for i in 0..3 {
            prop_assert!((back[i] - p[i]).abs() < 1e-9);
        }
    }

    // The distance to the target in the end-effector frame matches the base frame
    // when the end effector is not rotated.
    #[test]
    fn unrotated_polar_radius_is_base_distance(target in point(), ee in point()) {
        let tf = StateTransform::new(Ur5::new(), &DEFAULT_JOINT_POSITIONS);
        let t = Telemetry::from_raw(telemetry(DEFAULT_JOINT_POSITIONS, target, ee, false)).unwrap();
        let obs = tf.observe(&t).unwrap();
        prop_assert!((obs[0] - t.distance_to_target()).abs() < 1e-9);
    }

    // Reward and termination depend on nothing but their inputs.
    #[test]
    fn reward_is_deterministic(
        target in point(),
        ee in point(),
        collision in any::<bool>(),
        action in prop::collection::vec(-1.0f64..=1.0, 6),
        steps in 0u32..1200,
    ) {
        let tf = StateTransform::new(Ur5::new(), &DEFAULT_JOINT_POSITIONS);
        let t = Telemetry::from_raw(telemetry(DEFAULT_JOINT_POSITIONS, target, ee, collision)).unwrap();
        let obs = tf.observe(&t).unwrap();
        let a = evaluate(&t, &obs, &action, steps, 1000);
        let b = evaluate(&t.clone(), &obs, &action.clone(), steps, 1000);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.done(), collision || steps >= 1000);
    }
}
