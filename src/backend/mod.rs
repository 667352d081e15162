//! Backend abstraction layer
//!
//! Provides the trait the host render engine implements, the shared types
//! passed through it, and a recording backend for headless use.

pub mod recording;
pub mod traits;
pub mod types;

pub use recording::*;
pub use traits::*;
pub use types::*;
