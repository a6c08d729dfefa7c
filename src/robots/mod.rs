pub mod ur5;

pub use ur5::{NUM_JOINTS, Ur5};
