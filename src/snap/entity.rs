//! Snappable scene entities

use std::collections::HashMap;

use glam::{EulerRot, Quat, Vec3, Vec4};

use crate::scene::{NodeId, SceneGraph, MAX_HIERARCHY_DEPTH};
use crate::snap::GridBasis;
use crate::ConfigError;

/// Where a scene object's pixel grid is anchored when it is shaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelGridOrigin {
    /// Each object uses its own position
    #[default]
    Object,
    /// All objects of a hierarchy share the root's position
    Root,
}

/// Settings for a snapped scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObjectSettings {
    /// Round world Euler angles to `angle_resolution`
    pub snap_angles: bool,
    /// Angle step in degrees
    pub angle_resolution: f32,
    pub grid_origin: PixelGridOrigin,
}

impl Default for SceneObjectSettings {
    fn default() -> Self {
        Self {
            snap_angles: true,
            angle_resolution: 30.0,
            grid_origin: PixelGridOrigin::Object,
        }
    }
}

impl SceneObjectSettings {
    pub fn with_snap_angles(mut self, snap_angles: bool) -> Self {
        self.snap_angles = snap_angles;
        self
    }

    pub fn with_angle_resolution(mut self, degrees: f32) -> Self {
        self.angle_resolution = degrees;
        self
    }

    pub fn with_grid_origin(mut self, grid_origin: PixelGridOrigin) -> Self {
        self.grid_origin = grid_origin;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.angle_resolution.is_finite() || self.angle_resolution <= 0.0 {
            return Err(ConfigError::AngleResolution(self.angle_resolution));
        }
        Ok(())
    }
}

/// Behaviour variant of a snap entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapKind {
    /// Snaps to grid corners and keeps its rotation. Used for the camera.
    WorldAnchor,
    /// Snaps to cell centers and optionally quantizes its rotation.
    SceneObject(SceneObjectSettings),
}

impl SnapKind {
    /// Offset, in cells, of the lattice the entity snaps to
    pub fn offset_bias(&self) -> f32 {
        match self {
            SnapKind::WorldAnchor => 0.0,
            SnapKind::SceneObject(_) => 0.5,
        }
    }

    /// Angle step in degrees, `None` if rotation is left alone
    pub fn angle_resolution(&self) -> Option<f32> {
        match self {
            SnapKind::SceneObject(settings) if settings.snap_angles => {
                Some(settings.angle_resolution)
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SnapKind::WorldAnchor => Ok(()),
            SnapKind::SceneObject(settings) => settings.validate(),
        }
    }

    pub fn grid_origin(&self) -> Option<PixelGridOrigin> {
        match self {
            SnapKind::WorldAnchor => None,
            SnapKind::SceneObject(settings) => Some(settings.grid_origin),
        }
    }
}

/// Material-side grid anchoring published for one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOriginBinding {
    /// State of the `USE_OBJECT_POSITION` material keyword
    pub use_object_position: bool,
    /// Root world position (w = 1), set on snap when anchored at the root
    pub origin: Option<Vec4>,
}

/// Grid-origin bindings the host applies to each node's materials
#[derive(Debug, Default)]
pub struct PixelGridOrigins {
    bindings: HashMap<NodeId, GridOriginBinding>,
}

impl PixelGridOrigins {
    /// Material keyword selecting per-object grid anchoring
    pub const KEYWORD: &'static str = "USE_OBJECT_POSITION";
    /// Material vector receiving the shared origin
    pub const ORIGIN_PROPERTY: &'static str = "_PixelGridOrigin";

    pub fn get(&self, node: NodeId) -> Option<&GridOriginBinding> {
        self.bindings.get(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &GridOriginBinding)> {
        self.bindings.iter().map(|(node, binding)| (*node, binding))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn bind(&mut self, node: NodeId, mode: PixelGridOrigin) {
        let use_object_position = mode == PixelGridOrigin::Object;
        self.bindings.insert(
            node,
            GridOriginBinding {
                use_object_position,
                origin: None,
            },
        );
    }

    pub(crate) fn publish(&mut self, node: NodeId, origin: Vec3) {
        if let Some(binding) = self.bindings.get_mut(&node) {
            binding.origin = Some(origin.extend(1.0));
        }
    }

    pub(crate) fn unbind(&mut self, node: NodeId) {
        self.bindings.remove(&node);
    }
}

/// Pre-snap transform, written back on restore
#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedTransform {
    local_position: Vec3,
    local_rotation: Quat,
    world_rotation: Quat,
}

/// A scene node whose transform is snapped for the duration of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapEntity {
    node: NodeId,
    kind: SnapKind,
    depth: u32,
    saved: Option<SavedTransform>,
}

impl SnapEntity {
    pub fn new<S: SceneGraph + ?Sized>(scene: &S, node: NodeId, kind: SnapKind) -> Self {
        Self {
            node,
            kind,
            depth: Self::compute_depth(scene, node),
            saved: None,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> &SnapKind {
        &self.kind
    }

    /// Depth computed at registration
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether a transform is cached and awaiting restore
    pub fn has_saved_transform(&self) -> bool {
        self.saved.is_some()
    }

    /// Number of ancestors of `node`, capped at [`MAX_HIERARCHY_DEPTH`]
    pub fn compute_depth<S: SceneGraph + ?Sized>(scene: &S, node: NodeId) -> u32 {
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = scene.parent(current) {
            depth += 1;
            if depth >= MAX_HIERARCHY_DEPTH {
                break;
            }
            current = parent;
        }
        depth
    }

    pub fn save_transform<S: SceneGraph + ?Sized>(&mut self, scene: &S) {
        self.saved = Some(SavedTransform {
            local_position: scene.local_position(self.node),
            local_rotation: scene.local_rotation(self.node),
            world_rotation: scene.world_rotation(self.node),
        });
    }

    /// Quantize world rotation, starting from the rotation cached by
    /// [`save_transform`](Self::save_transform).
    pub fn snap_angles<S: SceneGraph + ?Sized>(&self, scene: &mut S) {
        let Some(resolution) = self.kind.angle_resolution() else {
            return;
        };
        let Some(saved) = self.saved else {
            log::debug!("snap_angles on {:?} without a saved transform", self.node);
            return;
        };
        let (y, x, z) = saved.world_rotation.to_euler(EulerRot::YXZ);
        let degrees = Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees());
        let snapped = snap_euler_degrees(degrees, resolution);
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            snapped.y.to_radians(),
            snapped.x.to_radians(),
            snapped.z.to_radians(),
        );
        scene.set_world_rotation(self.node, rotation);
    }

    pub fn snap_position_to_grid<S: SceneGraph + ?Sized>(&self, scene: &mut S, grid: &GridBasis) {
        let position = scene.world_position(self.node);
        let snapped = grid.snap(position, self.kind.offset_bias());
        scene.set_world_position(self.node, snapped);
    }

    /// Write the cached local transform back and drop the cache.
    pub fn restore_transform<S: SceneGraph + ?Sized>(&mut self, scene: &mut S) {
        if let Some(saved) = self.saved.take() {
            scene.set_local_position(self.node, saved.local_position);
            scene.set_local_rotation(self.node, saved.local_rotation);
        }
    }

    /// Post-snap hook
    pub fn on_snap<S: SceneGraph + ?Sized>(&self, scene: &S, origins: &mut PixelGridOrigins) {
        if self.kind.grid_origin() == Some(PixelGridOrigin::Root) {
            let root = scene.root(self.node);
            origins.publish(self.node, scene.world_position(root));
        }
    }
}

/// Round each angle, normalized into [0, 360), to a multiple of `resolution`.
pub fn snap_euler_degrees(euler: Vec3, resolution: f32) -> Vec3 {
    let snap = |angle: f32| (angle.rem_euclid(360.0) / resolution).round() * resolution;
    Vec3::new(snap(euler.x), snap(euler.y), snap(euler.z))
}
