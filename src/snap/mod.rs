//! Per-frame transform snapping
//!
//! Before a camera renders, every registered entity is moved onto a
//! camera-aligned grid whose cell is one screen pixel, and scene objects
//! may have their rotation quantized. After rendering the exact original
//! transforms are restored, so snapping never accumulates into the
//! authoritative scene state.

mod entity;
mod grid;
mod orchestrator;
mod registry;

pub use entity::*;
pub use grid::*;
pub use orchestrator::*;
pub use registry::*;
