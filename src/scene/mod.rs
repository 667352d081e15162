//! Scene management
//!
//! Transforms, cameras and the hierarchy seam the snapping core reads and
//! writes through.

mod camera;
mod hierarchy;
mod transform;

pub use camera::*;
pub use hierarchy::*;
pub use transform::*;
