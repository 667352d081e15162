//! Pixelization pipeline
//!
//! A fixed sequence of passes injected into the host's render loop:
//! 1. Capture - point-filtered copy of the camera color
//! 2. Pixelization map - how source texels collapse into output pixels
//! 3. Color pixelize - scene color resampled through the map
//! 4. Depth reconstruct - pixelized depth into its own attachment
//! 5. Outline raster - per-object ids of outline-tagged geometry
//! 6. Outline pixelize - outline ids resampled through the same map
//! 7. Composite - final image into the camera target, then depth write-back
//!
//! Each frame runs configure, execute and cleanup in that order.

pub mod apply_map;
pub mod capture;
pub mod composite;
pub mod depth_copy;
pub mod outline_pass;
pub mod pixelization_map;
pub mod shaders;

pub use apply_map::ApplyMapPass;
pub use capture::CapturePass;
pub use composite::{CompositeParams, CompositePass, OutlineDepthTest};
pub use depth_copy::{DepthReconstructPass, DepthWriteBackPass};
pub use outline_pass::OutlineRasterPass;
pub use pixelization_map::PixelizationMapPass;
pub use shaders::{ShaderId, ShaderLibrary, ShaderSet};

use glam::Vec4;
use thiserror::Error;

use crate::backend::{BackendError, GraphicsBackend, InjectionPoint, TextureHandle};
use crate::render_graph::{
    CameraTarget, FrameResources, GraphError, PassExecutor, PassId, PassSequence,
};
use crate::scene::CameraMatrices;
use crate::ConfigError;

/// Shader keyword selecting orthographic pixel footprints
pub const ORTHO_PROJECTION: &str = "ORTHO_PROJECTION";
/// Shader keyword enabling the outline depth test
pub const DEPTH_TEST_OUTLINES_ON: &str = "DEPTH_TEST_OUTLINES_ON";
/// Shader float holding the outline depth threshold
pub const OUTLINE_DEPTH_TEST_THRESHOLD: &str = "_OutlineDepthTestThreshold";

/// Configuration for the pixelization pipeline
#[derive(Debug, Clone)]
pub struct PixelizeConfig {
    /// Suppress outlines across small depth steps
    pub depth_test_outlines: bool,
    /// Depth step below which outlines are suppressed
    pub depth_test_threshold: f32,
    /// Where in the host's frame the passes are scheduled
    pub injection_point: InjectionPoint,
}

impl Default for PixelizeConfig {
    fn default() -> Self {
        Self {
            depth_test_outlines: true,
            depth_test_threshold: 0.001,
            injection_point: InjectionPoint::BeforeTransparents,
        }
    }
}

impl PixelizeConfig {
    pub fn with_depth_test(mut self, enabled: bool, threshold: f32) -> Self {
        self.depth_test_outlines = enabled;
        self.depth_test_threshold = threshold;
        self
    }

    pub fn with_injection_point(mut self, injection_point: InjectionPoint) -> Self {
        self.injection_point = injection_point;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.depth_test_threshold.is_finite() || self.depth_test_threshold < 0.0 {
            return Err(ConfigError::DepthTestThreshold(self.depth_test_threshold));
        }
        Ok(())
    }

    pub fn outline_depth_test(&self) -> OutlineDepthTest {
        OutlineDepthTest {
            enabled: self.depth_test_outlines,
            threshold: self.depth_test_threshold,
        }
    }
}

/// Pipeline error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to acquire frame resources: {0}")]
    Configure(#[from] BackendError),
    #[error("invalid pass sequence: {0}")]
    Graph(#[from] GraphError),
    #[error("camera target is {width}x{height}")]
    EmptyTarget { width: u32, height: u32 },
    #[error("{stage} called in phase {phase:?}")]
    OutOfPhase {
        stage: &'static str,
        phase: PipelinePhase,
    },
}

/// Where the pipeline is within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// No frame resources held
    Idle,
    /// Resources acquired, passes not yet run
    Configured,
    /// Passes recorded, awaiting cleanup
    Executed,
}

struct FrameState {
    resources: FrameResources,
    shaders: ShaderSet,
    texel_size: Vec4,
}

/// Per-camera pixelization pipeline.
pub struct PixelizationPipeline {
    config: PixelizeConfig,
    sequence: PassSequence,
    executor: PassExecutor,
    shaders: ShaderLibrary,
    frame: Option<FrameState>,
    phase: PipelinePhase,
    /// Scene depth handed over from the previous frame
    scene_depth: Option<TextureHandle>,
    frames: u64,
}

impl PixelizationPipeline {
    pub fn new(config: PixelizeConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let sequence = Self::build_sequence(&config);
        sequence.validate()?;
        log::debug!(
            "Pixelization pipeline with {} passes at {:?}",
            sequence.len(),
            config.injection_point
        );

        Ok(Self {
            config,
            sequence,
            executor: PassExecutor::new(),
            shaders: ShaderLibrary::new(),
            frame: None,
            phase: PipelinePhase::Idle,
            scene_depth: None,
            frames: 0,
        })
    }

    fn build_sequence(config: &PixelizeConfig) -> PassSequence {
        let mut sequence = PassSequence::new();
        sequence.add_pass(CapturePass);
        sequence.add_pass(PixelizationMapPass);
        sequence.add_pass(ApplyMapPass::color());
        sequence.add_pass(DepthReconstructPass);
        sequence.add_pass(OutlineRasterPass);
        sequence.add_pass(ApplyMapPass::outlines());
        sequence.add_pass(CompositePass::new(config.outline_depth_test()));
        sequence.add_pass(DepthWriteBackPass);
        sequence
    }

    pub fn config(&self) -> &PixelizeConfig {
        &self.config
    }

    pub fn injection_point(&self) -> InjectionPoint {
        self.config.injection_point
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn sequence(&self) -> &PassSequence {
        &self.sequence
    }

    /// Passes run by the last `execute`, in order
    pub fn executed_passes(&self) -> &[PassId] {
        self.executor.executed()
    }

    /// Texel size of the configured frame
    pub fn texel_size(&self) -> Option<Vec4> {
        self.frame.as_ref().map(|f| f.texel_size)
    }

    /// Scene depth kept alive after cleanup for downstream consumers
    pub fn scene_depth(&self) -> Option<TextureHandle> {
        self.scene_depth
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Acquire this frame's resources and resolve shaders.
    ///
    /// Releases the scene depth kept from the previous frame once the new
    /// frame's resources are in hand. On failure nothing acquired by this
    /// call is left live and the previous scene depth stays published.
    pub fn configure(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        target: &CameraTarget,
    ) -> Result<(), PipelineError> {
        if self.phase != PipelinePhase::Idle {
            log::warn!("configure called in phase {:?}; cleaning up previous frame", self.phase);
            self.cleanup(backend);
        }
        if target.width == 0 || target.height == 0 {
            return Err(PipelineError::EmptyTarget {
                width: target.width,
                height: target.height,
            });
        }

        let resources = FrameResources::acquire(backend, target)?;
        self.release_scene_depth(backend);
        let shaders = self.shaders.resolve_all(backend);
        let (width, height) = (target.width as f32, target.height as f32);
        let texel_size = Vec4::new(1.0 / width, 1.0 / height, width, height);

        log::trace!("Configured pixelization frame {}x{}", target.width, target.height);
        self.frame = Some(FrameState {
            resources,
            shaders,
            texel_size,
        });
        self.phase = PipelinePhase::Configured;
        Ok(())
    }

    /// Record every pass for the configured frame.
    pub fn execute(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        camera: &CameraMatrices,
    ) -> Result<(), PipelineError> {
        let phase = self.phase;
        let frame = match (phase, self.frame.as_mut()) {
            (PipelinePhase::Configured, Some(frame)) => frame,
            _ => {
                log::error!("execute called in phase {:?}; frame skipped", phase);
                return Err(PipelineError::OutOfPhase {
                    stage: "execute",
                    phase,
                });
            }
        };

        Self::set_keywords(backend, &frame.shaders, &self.config, camera.orthographic);
        self.executor.execute(
            &self.sequence,
            backend,
            &mut frame.resources,
            &frame.shaders,
            camera,
            frame.texel_size,
        );
        self.phase = PipelinePhase::Executed;
        self.frames += 1;
        Ok(())
    }

    /// Release this frame's resources, keeping the scene depth.
    ///
    /// Safe to call in any phase; a no-op when nothing is held.
    pub fn cleanup(&mut self, backend: &mut dyn GraphicsBackend) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        if let Some(depth) = frame.resources.release(backend) {
            self.scene_depth = Some(depth);
        }
        self.phase = PipelinePhase::Idle;
    }

    /// Release everything, including the kept scene depth.
    pub fn shutdown(&mut self, backend: &mut dyn GraphicsBackend) {
        self.cleanup(backend);
        self.release_scene_depth(backend);
        self.shaders.clear();
    }

    fn release_scene_depth(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(depth) = self.scene_depth.take() {
            backend.release_texture(depth);
        }
    }

    fn set_keywords(
        backend: &mut dyn GraphicsBackend,
        shaders: &ShaderSet,
        config: &PixelizeConfig,
        orthographic: bool,
    ) {
        if let Some(composite) = shaders.get(ShaderId::Composite) {
            backend.set_shader_keyword(composite, DEPTH_TEST_OUTLINES_ON, config.depth_test_outlines);
            if config.depth_test_outlines {
                backend.set_shader_float(
                    composite,
                    OUTLINE_DEPTH_TEST_THRESHOLD,
                    config.depth_test_threshold,
                );
            }
        }
        for id in [ShaderId::PixelizationMap, ShaderId::ColorPixelize] {
            if let Some(shader) = shaders.get(id) {
                backend.set_shader_keyword(shader, ORTHO_PROJECTION, orthographic);
            }
        }
    }
}
