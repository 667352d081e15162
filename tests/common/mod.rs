//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use glam::{Quat, Vec3};

use pixelsnap::backend::{GraphicsBackend, RecordingBackend};
use pixelsnap::render_graph::CameraTarget;
use pixelsnap::scene::{Camera, NodeId, Projection, SceneGraph, SceneTree, Transform, Viewport};
use pixelsnap::snap::{SceneObjectSettings, SnapKind, SnapRegistry};

/// Viewport used by every fixture
pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 180;

pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Scene with an orthographic camera and a registry.
pub struct TestScene {
    pub scene: SceneTree,
    pub registry: SnapRegistry,
    pub camera: Camera,
}

impl TestScene {
    pub fn orthographic() -> Self {
        Self::with_projection(Projection::orthographic(5.0, 0.1, 100.0))
    }

    pub fn perspective() -> Self {
        Self::with_projection(Projection::perspective(60.0, 0.1, 100.0))
    }

    pub fn with_projection(projection: Projection) -> Self {
        init_logging();
        let mut scene = SceneTree::new();
        let node = scene.spawn(Transform::from_position_rotation(
            Vec3::new(0.013, 2.071, 10.0),
            Quat::from_rotation_x(-0.35),
        ));
        let camera = Camera::new(node, projection, Viewport::new(WIDTH, HEIGHT));
        Self {
            scene,
            registry: SnapRegistry::new(),
            camera,
        }
    }

    /// Spawn a node and register it as a snapped scene object
    pub fn object(&mut self, parent: Option<NodeId>, transform: Transform) -> NodeId {
        self.object_with(parent, transform, SceneObjectSettings::default())
    }

    pub fn object_with(
        &mut self,
        parent: Option<NodeId>,
        transform: Transform,
        settings: SceneObjectSettings,
    ) -> NodeId {
        let node = match parent {
            Some(parent) => self.scene.spawn_child(parent, transform),
            None => self.scene.spawn(transform),
        };
        self.registry
            .register(&self.scene, node, SnapKind::SceneObject(settings))
            .unwrap();
        node
    }

    /// Local position and rotation of every live node, in id order
    pub fn snapshot(&self, nodes: &[NodeId]) -> Vec<(Vec3, Quat)> {
        nodes
            .iter()
            .map(|&n| (self.scene.local_position(n), self.scene.local_rotation(n)))
            .collect()
    }
}

/// Recording backend plus the camera target it owns
pub fn backend_with_target() -> (RecordingBackend, CameraTarget) {
    let mut backend = RecordingBackend::new();
    let color = backend.create_external_texture("camera color");
    (backend, CameraTarget::new(color, WIDTH, HEIGHT))
}

/// Host scene draw used by frame tests
pub fn draw_nothing(_: &mut dyn GraphicsBackend, _: &pixelsnap::scene::CameraMatrices) {}
