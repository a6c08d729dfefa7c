pub mod geometry;
pub mod rng;

pub use geometry::{cartesian_to_polar_3d, change_reference_frame, polar_to_cartesian_3d};
pub use rng::{RngStream, rng_from_optional_seed, rng_from_seed};
