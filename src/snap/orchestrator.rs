//! Per-frame snap/release driver for one camera

use crate::scene::{Camera, NodeId, SceneGraph};
use crate::snap::{GridBasis, GridProjector, SnapHandle, SnapKind, SnapRegistry};
use crate::ConfigError;

/// Configuration for camera snapping
#[derive(Debug, Clone)]
pub struct SnapConfig {
    /// World-space size of one screen pixel
    pub pixel_size: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self { pixel_size: 0.032 }
    }
}

impl SnapConfig {
    pub fn with_pixel_size(mut self, pixel_size: f32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pixel_size.is_finite() || self.pixel_size <= 0.0 {
            return Err(ConfigError::PixelSize(self.pixel_size));
        }
        Ok(())
    }
}

/// Lifecycle state of a [`SnapOrchestrator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Snapping every frame
    Active,
    /// Camera is not orthographic; frames pass through untouched
    Disabled,
    /// Camera node was destroyed; permanently inert
    Detached,
}

/// Snaps every registered entity before a camera renders and restores
/// them afterwards.
///
/// Entities are snapped parents-first (ascending depth) and restored in
/// exactly the reverse order, so nested snapped transforms come back
/// bit-for-bit.
pub struct SnapOrchestrator {
    config: SnapConfig,
    camera_node: NodeId,
    anchor: SnapHandle,
    state: OrchestratorState,
    /// Snap order of the frame awaiting release
    in_flight: Option<Vec<SnapHandle>>,
    last_grid: Option<GridBasis>,
    frames_snapped: u64,
}

impl SnapOrchestrator {
    /// Bind to `camera` and register its node as a world anchor.
    pub fn new<S: SceneGraph + ?Sized>(
        scene: &S,
        registry: &mut SnapRegistry,
        camera: &Camera,
        config: SnapConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if camera.render_scale <= 0.0 || !camera.render_scale.is_finite() {
            return Err(ConfigError::RenderScale(camera.render_scale));
        }

        let anchor = registry.register(scene, camera.node, SnapKind::WorldAnchor)?;
        let state = if camera.is_orthographic() {
            OrchestratorState::Active
        } else {
            Self::warn_perspective();
            OrchestratorState::Disabled
        };

        Ok(Self {
            config,
            camera_node: camera.node,
            anchor,
            state,
            in_flight: None,
            last_grid: None,
            frames_snapped: 0,
        })
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn camera_node(&self) -> NodeId {
        self.camera_node
    }

    /// Registry handle of the camera's own anchor entity
    pub fn anchor(&self) -> SnapHandle {
        self.anchor
    }

    /// Whether a snapped frame is awaiting [`end_frame`](Self::end_frame)
    pub fn is_frame_open(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Snap order of the open frame, empty if none
    pub fn snap_order(&self) -> &[SnapHandle] {
        self.in_flight.as_deref().unwrap_or(&[])
    }

    /// Grid used by the most recent snapped frame
    pub fn last_grid(&self) -> Option<&GridBasis> {
        self.last_grid.as_ref()
    }

    pub fn frames_snapped(&self) -> u64 {
        self.frames_snapped
    }

    /// Snap all registered entities for this frame.
    ///
    /// Returns `true` if transforms were modified and a matching
    /// [`end_frame`](Self::end_frame) is required.
    pub fn begin_frame<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        registry: &mut SnapRegistry,
        camera: &mut Camera,
    ) -> bool {
        if self.in_flight.is_some() {
            log::warn!("begin_frame with previous frame still snapped; restoring it first");
            self.end_frame(scene, registry);
        }

        if !self.check_camera(scene, camera) {
            return false;
        }

        // Keep one screen pixel equal to `pixel_size` world units
        let size = GridProjector::orthographic_size(camera.viewport.height, self.config.pixel_size);
        camera.projection.set_orthographic_size(size);

        registry.prune(scene);
        let order = registry.snap_order();

        for &handle in &order {
            if let Some(entity) = registry.get_mut(handle) {
                entity.save_transform(scene);
            }
        }
        for &handle in &order {
            if let Some(entity) = registry.get(handle) {
                entity.snap_angles(scene);
            }
        }

        let grid = GridProjector::project(camera, scene);
        match &grid {
            Some(grid) => {
                for &handle in &order {
                    if let Some((entity, origins)) = registry.entity_and_origins(handle) {
                        entity.snap_position_to_grid(scene, grid);
                        entity.on_snap(scene, origins);
                    }
                }
            }
            None => log::debug!("Viewport has no pixels; skipping position snap"),
        }

        log::trace!("Snapped {} entities", order.len());
        self.last_grid = grid;
        self.in_flight = Some(order);
        self.frames_snapped += 1;
        true
    }

    /// Restore every entity snapped by the last [`begin_frame`](Self::begin_frame),
    /// in reverse snap order. A no-op if no frame is open.
    pub fn end_frame<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, registry: &mut SnapRegistry) {
        let Some(order) = self.in_flight.take() else {
            return;
        };
        for &handle in order.iter().rev() {
            let Some(entity) = registry.restorable_mut(handle) else {
                continue;
            };
            if scene.contains(entity.node()) {
                entity.restore_transform(scene);
            }
        }
        registry.clear_retired();
        log::trace!("Restored {} entities", order.len());
    }

    /// Returns `true` if this frame should be snapped.
    fn check_camera<S: SceneGraph + ?Sized>(&mut self, scene: &S, camera: &Camera) -> bool {
        if self.state == OrchestratorState::Detached {
            return false;
        }
        if !scene.contains(self.camera_node) {
            log::info!("Camera node {:?} destroyed; detaching snapping", self.camera_node);
            self.state = OrchestratorState::Detached;
            return false;
        }
        if camera.node != self.camera_node {
            log::error!(
                "begin_frame called with camera {:?}, bound to {:?}",
                camera.node,
                self.camera_node
            );
            return false;
        }

        match (self.state, camera.is_orthographic()) {
            (OrchestratorState::Active, false) => {
                Self::warn_perspective();
                self.state = OrchestratorState::Disabled;
                false
            }
            (OrchestratorState::Disabled, true) => {
                log::info!("Camera is orthographic again; snapping re-enabled");
                self.state = OrchestratorState::Active;
                true
            }
            (_, orthographic) => orthographic,
        }
    }

    fn warn_perspective() {
        log::warn!(
            "Camera snapping requires an orthographic projection; \
             pixel size is not constant under perspective. Snapping disabled."
        );
    }
}
