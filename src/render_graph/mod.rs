//! Pass Sequence System
//!
//! A declarative description of the pixelization passes. Each pass declares
//! which frame resources it reads and writes; the sequence is validated so
//! that no resource is sampled before it has been written in the same frame.

pub mod executor;
pub mod graph;
pub mod pass;
pub mod resource;

pub use executor::*;
pub use graph::*;
pub use pass::*;
pub use resource::*;
