//! Registry of snap entities
//!
//! Entities register on activation and deregister on deactivation or
//! destruction. The orchestrator snapshots the registry at the start of each
//! frame, so changes between frames are picked up without any ordering
//! bookkeeping on the host side. An entity removed while its frame is still
//! snapped is held back until that frame is released, so its node still gets
//! its transform restored.

use std::collections::BTreeMap;

use crate::scene::{NodeId, SceneGraph};
use crate::snap::{PixelGridOrigins, SnapEntity, SnapKind};
use crate::ConfigError;

/// Handle to a registered snap entity. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapHandle(pub(crate) u64);

impl SnapHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SnapRegistry {
    entities: BTreeMap<SnapHandle, SnapEntity>,
    /// Removed mid-frame, still holding a transform to restore
    retired: BTreeMap<SnapHandle, SnapEntity>,
    origins: PixelGridOrigins,
    next_handle: u64,
}

impl SnapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`, computing its hierarchy depth now.
    pub fn register<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        node: NodeId,
        kind: SnapKind,
    ) -> Result<SnapHandle, ConfigError> {
        kind.validate()?;
        let handle = SnapHandle(self.next_handle);
        self.next_handle += 1;

        if let Some(mode) = kind.grid_origin() {
            self.origins.bind(node, mode);
        }
        let entity = SnapEntity::new(scene, node, kind);
        log::debug!(
            "Registered snap entity {:?} for {:?} at depth {}",
            handle,
            node,
            entity.depth()
        );
        self.entities.insert(handle, entity);
        Ok(handle)
    }

    /// Returns `false` if `handle` was not registered.
    pub fn deregister(&mut self, handle: SnapHandle) -> bool {
        let Some(entity) = self.entities.remove(&handle) else {
            return false;
        };
        let node = entity.node();
        if !self.entities.values().any(|e| e.node() == node) {
            self.origins.unbind(node);
        }
        log::debug!("Deregistered snap entity {:?} for {:?}", handle, node);
        self.retire(handle, entity);
        true
    }

    /// Drop every entity attached to `node`
    pub fn deregister_node(&mut self, node: NodeId) -> usize {
        let handles: Vec<SnapHandle> = self
            .entities
            .iter()
            .filter(|(_, e)| e.node() == node)
            .map(|(h, _)| *h)
            .collect();
        for &handle in &handles {
            if let Some(entity) = self.entities.remove(&handle) {
                self.retire(handle, entity);
            }
        }
        self.origins.unbind(node);
        handles.len()
    }

    fn retire(&mut self, handle: SnapHandle, entity: SnapEntity) {
        if entity.has_saved_transform() {
            log::debug!("Holding {:?} until its snapped frame is released", handle);
            self.retired.insert(handle, entity);
        }
    }

    /// Drop entities whose node no longer exists. Returns how many were removed.
    pub fn prune<S: SceneGraph + ?Sized>(&mut self, scene: &S) -> usize {
        let dead: Vec<NodeId> = self
            .entities
            .values()
            .map(SnapEntity::node)
            .filter(|node| !scene.contains(*node))
            .collect();
        let removed: usize = dead.into_iter().map(|n| self.deregister_node(n)).sum();
        if removed > 0 {
            log::debug!("Pruned {} snap entities with destroyed nodes", removed);
        }
        removed
    }

    pub fn get(&self, handle: SnapHandle) -> Option<&SnapEntity> {
        self.entities.get(&handle)
    }

    pub fn get_mut(&mut self, handle: SnapHandle) -> Option<&mut SnapEntity> {
        self.entities.get_mut(&handle)
    }

    pub fn contains(&self, handle: SnapHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SnapHandle, &SnapEntity)> {
        self.entities.iter().map(|(h, e)| (*h, e))
    }

    pub fn origins(&self) -> &PixelGridOrigins {
        &self.origins
    }

    /// Handles ordered by ascending depth; registration order breaks ties.
    pub fn snap_order(&self) -> Vec<SnapHandle> {
        let mut order: Vec<(u32, SnapHandle)> = self
            .entities
            .iter()
            .map(|(handle, entity)| (entity.depth(), *handle))
            .collect();
        order.sort_by_key(|(depth, _)| *depth);
        order.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Live or retired entity still awaiting restore in the open frame
    pub(crate) fn restorable_mut(&mut self, handle: SnapHandle) -> Option<&mut SnapEntity> {
        match self.entities.get_mut(&handle) {
            Some(entity) => Some(entity),
            None => self.retired.get_mut(&handle),
        }
    }

    /// Forget entities removed during the frame that was just released
    pub(crate) fn clear_retired(&mut self) {
        self.retired.clear();
    }

    pub(crate) fn entity_and_origins(
        &mut self,
        handle: SnapHandle,
    ) -> Option<(&mut SnapEntity, &mut PixelGridOrigins)> {
        let entity = self.entities.get_mut(&handle)?;
        Some((entity, &mut self.origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneTree, Transform};
    use crate::snap::{PixelGridOrigin, SceneObjectSettings};

    #[test]
    fn snap_order_is_by_depth_then_registration() {
        let mut scene = SceneTree::new();
        let root = scene.spawn(Transform::new());
        let child = scene.spawn_child(root, Transform::new());
        let grandchild = scene.spawn_child(child, Transform::new());
        let other_root = scene.spawn(Transform::new());

        let mut registry = SnapRegistry::new();
        let g = registry.register(&scene, grandchild, SnapKind::WorldAnchor).unwrap();
        let c = registry.register(&scene, child, SnapKind::WorldAnchor).unwrap();
        let r = registry.register(&scene, root, SnapKind::WorldAnchor).unwrap();
        let o = registry.register(&scene, other_root, SnapKind::WorldAnchor).unwrap();

        assert_eq!(registry.snap_order(), vec![r, o, c, g]);
    }

    #[test]
    fn prune_drops_destroyed_nodes() {
        let mut scene = SceneTree::new();
        let a = scene.spawn(Transform::new());
        let b = scene.spawn_child(a, Transform::new());
        let keep = scene.spawn(Transform::new());

        let mut registry = SnapRegistry::new();
        registry.register(&scene, a, SnapKind::WorldAnchor).unwrap();
        registry.register(&scene, b, SnapKind::WorldAnchor).unwrap();
        let kept = registry.register(&scene, keep, SnapKind::WorldAnchor).unwrap();

        scene.despawn(a);
        assert_eq!(registry.prune(&scene), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(kept));
    }

    #[test]
    fn grid_origin_binding_follows_registration() {
        let mut scene = SceneTree::new();
        let node = scene.spawn(Transform::new());
        let mut registry = SnapRegistry::new();

        let settings = SceneObjectSettings::default().with_grid_origin(PixelGridOrigin::Root);
        let handle = registry
            .register(&scene, node, SnapKind::SceneObject(settings))
            .unwrap();
        assert_eq!(
            registry.origins().get(node).map(|b| b.use_object_position),
            Some(false)
        );

        assert!(registry.deregister(handle));
        assert!(registry.origins().get(node).is_none());
        assert!(!registry.deregister(handle));
    }

    #[test]
    fn invalid_angle_resolution_is_not_registered() {
        let mut scene = SceneTree::new();
        let node = scene.spawn(Transform::new());
        let mut registry = SnapRegistry::new();

        let settings = SceneObjectSettings::default().with_angle_resolution(0.0);
        let err = registry
            .register(&scene, node, SnapKind::SceneObject(settings))
            .unwrap_err();
        assert_eq!(err, ConfigError::AngleResolution(0.0));
        assert!(registry.is_empty());
        assert!(registry.origins().get(node).is_none());

        // Angle snapping switched off still needs a usable resolution
        let settings = settings.with_snap_angles(false);
        assert!(registry
            .register(&scene, node, SnapKind::SceneObject(settings))
            .is_err());
    }

    #[test]
    fn entity_removed_mid_frame_stays_restorable() {
        let mut scene = SceneTree::new();
        let node = scene.spawn(Transform::new());
        let idle = scene.spawn(Transform::new());
        let mut registry = SnapRegistry::new();
        let snapped = registry.register(&scene, node, SnapKind::WorldAnchor).unwrap();
        let unsnapped = registry.register(&scene, idle, SnapKind::WorldAnchor).unwrap();

        registry.get_mut(snapped).unwrap().save_transform(&scene);
        assert!(registry.deregister(snapped));
        assert!(registry.deregister(unsnapped));

        assert!(!registry.contains(snapped));
        assert!(registry.restorable_mut(snapped).is_some());
        assert!(registry.restorable_mut(unsnapped).is_none());
        registry.clear_retired();
        assert!(registry.restorable_mut(snapped).is_none());
    }
}
