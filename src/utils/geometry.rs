//! Frame and coordinate helpers built on nalgebra.
//!
//! Quaternions are passed around in `[x, y, z, w]` order, the layout used by
//! the robot server.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Smallest quaternion norm accepted as a valid orientation.
const MIN_QUATERNION_NORM: f64 = 1e-9;

/// Build a unit quaternion from `[x, y, z, w]`, normalizing it.
/// Returns `None` for zero-length or non-finite inputs.
pub fn unit_quaternion_xyzw(q: [f64; 4]) -> Option<UnitQuaternion<f64>> {
    if q.iter().any(|c| !c.is_finite()) {
        return None;
    }
    UnitQuaternion::try_new(Quaternion::new(q[3], q[0], q[1], q[2]), MIN_QUATERNION_NORM)
}

/// Express `point` in another frame: rotate it by `rotation`, then add `translation`.
pub fn change_reference_frame(point: [f64; 3], translation: [f64; 3], rotation: &UnitQuaternion<f64>) -> [f64; 3] {
    let p = rotation * Vector3::from(point) + Vector3::from(translation);
    [p.x, p.y, p.z]
}

/// Cartesian `[x, y, z]` to polar `[r, theta, phi]`.
///
/// `theta = acos(z / r)` lies in `[0, pi]`, `phi = atan2(y, x)` in `(-pi, pi]`.
/// At the origin both angles are reported as zero.
pub fn cartesian_to_polar_3d(p: [f64; 3]) -> [f64; 3] {
    let [x, y, z] = p;
    let r = (x * x + y * y + z * z).sqrt();
    if r == 0.0 {
        return [0.0, 0.0, 0.0];
    }
    let theta = (z / r).clamp(-1.0, 1.0).acos();
    let phi = y.atan2(x);
    [r, theta, phi]
}

/// Polar `[r, theta, phi]` back to Cartesian `[x, y, z]`.
pub fn polar_to_cartesian_3d(p: [f64; 3]) -> [f64; 3] {
    let [r, theta, phi] = p;
    [r * theta.sin() * phi.cos(), r * theta.sin() * phi.sin(), r * theta.cos()]
}
