//! Per-camera frame driver

use crate::backend::traits::*;
use crate::pipeline::{PipelineError, PixelizationPipeline};
use crate::render_graph::CameraTarget;
use crate::scene::{Camera, CameraMatrices, SceneGraph};
use crate::snap::{OrchestratorState, SnapOrchestrator, SnapRegistry};
use crate::RendererConfig;

/// What happened during one [`PixelRenderer::render_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Transforms were snapped (and restored) this frame
    pub snapped: bool,
    /// Entities in the snap order
    pub snapped_entities: usize,
    /// The pixelization passes were recorded
    pub pixelized: bool,
}

/// Drives snapping and pixelization for one camera.
///
/// Each frame: snap every registered entity, let the host draw the scene,
/// run the pixelization passes, then restore every transform. Restore runs
/// even when the pipeline fails.
pub struct PixelRenderer {
    orchestrator: SnapOrchestrator,
    pipeline: PixelizationPipeline,
}

impl PixelRenderer {
    pub fn new<S: SceneGraph + ?Sized>(
        scene: &S,
        registry: &mut SnapRegistry,
        camera: &Camera,
        config: RendererConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let pipeline = PixelizationPipeline::new(config.pixelize)?;
        let orchestrator = SnapOrchestrator::new(scene, registry, camera, config.snap)?;
        log::info!("Pixel renderer bound to camera {:?}", camera.node);
        Ok(Self {
            orchestrator,
            pipeline,
        })
    }

    pub fn orchestrator(&self) -> &SnapOrchestrator {
        &self.orchestrator
    }

    pub fn pipeline(&self) -> &PixelizationPipeline {
        &self.pipeline
    }

    /// Render one frame.
    ///
    /// `draw_scene` records the host's own scene rendering into the camera
    /// target; it runs with transforms snapped and receives the camera
    /// matrices for the snapped camera.
    pub fn render_frame<S, F>(
        &mut self,
        scene: &mut S,
        registry: &mut SnapRegistry,
        camera: &mut Camera,
        backend: &mut dyn GraphicsBackend,
        target: &CameraTarget,
        draw_scene: F,
    ) -> Result<FrameStats, PipelineError>
    where
        S: SceneGraph + ?Sized,
        F: FnOnce(&mut dyn GraphicsBackend, &CameraMatrices),
    {
        let snapped = self.orchestrator.begin_frame(scene, registry, camera);
        let snapped_entities = self.orchestrator.snap_order().len();

        let result = if self.orchestrator.state() == OrchestratorState::Detached {
            Ok(false)
        } else {
            let matrices = camera.matrices(scene);
            draw_scene(&mut *backend, &matrices);
            self.pixelize(backend, target, &matrices)
        };

        self.orchestrator.end_frame(scene, registry);

        let pixelized = result?;
        Ok(FrameStats {
            snapped,
            snapped_entities,
            pixelized,
        })
    }

    fn pixelize(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        target: &CameraTarget,
        matrices: &CameraMatrices,
    ) -> Result<bool, PipelineError> {
        self.pipeline.configure(backend, target)?;
        let executed = self.pipeline.execute(backend, matrices);
        self.pipeline.cleanup(backend);
        executed.map(|()| true)
    }

    /// Release everything the renderer holds on the backend.
    pub fn shutdown(&mut self, backend: &mut dyn GraphicsBackend) {
        self.pipeline.shutdown(backend);
    }
}
