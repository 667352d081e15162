//! Pixelsnap - pixel-art rendering for orthographic 3D scenes
//!
//! Two cooperating systems run around every camera render:
//! - **Snapping**: scene entities are moved onto a camera-aligned grid whose
//!   cell is exactly one screen pixel (and optionally have their rotation
//!   quantized), then restored once the frame is rendered
//! - **Pixelization**: a fixed pass sequence resamples color and outline
//!   metadata through one shared pixelization map and composites the result
//!
//! The host provides its scene hierarchy through [`scene::SceneGraph`] and its
//! render engine through [`backend::GraphicsBackend`].

pub mod backend;
pub mod engine;
pub mod pipeline;
pub mod render_graph;
pub mod scene;
pub mod snap;

use thiserror::Error;

pub use backend::RecordingBackend;
pub use engine::{FrameStats, PixelRenderer};
pub use pipeline::{PixelizationPipeline, PixelizeConfig};
pub use snap::{SnapConfig, SnapOrchestrator, SnapRegistry};

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("pixel size must be positive and finite, got {0}")]
    PixelSize(f32),
    #[error("angle resolution must be positive and finite, got {0}")]
    AngleResolution(f32),
    #[error("outline depth threshold must be non-negative and finite, got {0}")]
    DepthTestThreshold(f32),
    #[error("render scale must be positive and finite, got {0}")]
    RenderScale(f32),
}

/// Configuration for a [`PixelRenderer`]
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    /// Camera snapping
    pub snap: SnapConfig,
    /// Pixelization passes
    pub pixelize: PixelizeConfig,
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.snap.validate()?;
        self.pixelize.validate()
    }
}
