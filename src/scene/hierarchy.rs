//! Scene hierarchy seam
//!
//! The snapping core only needs a handful of per-node operations from the
//! host's scene graph. [`SceneGraph`] names them; [`SceneTree`] is a small
//! arena implementation for hosts without their own hierarchy and for tests.

use glam::{Mat4, Quat, Vec3};

use crate::scene::Transform;

/// Ceiling on parent-link traversal. Deeper (or cyclic) chains are truncated.
pub const MAX_HIERARCHY_DEPTH: u32 = 100;

/// Identifier of a node in the host scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Per-node transform access the snapping core consumes.
pub trait SceneGraph {
    /// Whether the node is still alive
    fn contains(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn local_position(&self, node: NodeId) -> Vec3;
    fn set_local_position(&mut self, node: NodeId, position: Vec3);

    fn local_rotation(&self, node: NodeId) -> Quat;
    fn set_local_rotation(&mut self, node: NodeId, rotation: Quat);

    fn world_position(&self, node: NodeId) -> Vec3;
    fn set_world_position(&mut self, node: NodeId, position: Vec3);

    fn world_rotation(&self, node: NodeId) -> Quat;
    fn set_world_rotation(&mut self, node: NodeId, rotation: Quat);

    /// Rigid world transform (rotation and translation only)
    fn world_matrix(&self, node: NodeId) -> Mat4 {
        Mat4::from_rotation_translation(self.world_rotation(node), self.world_position(node))
    }

    /// Topmost ancestor, following at most [`MAX_HIERARCHY_DEPTH`] links.
    fn root(&self, node: NodeId) -> NodeId {
        let mut current = node;
        let mut depth = 0;
        while let Some(parent) = self.parent(current) {
            if depth >= MAX_HIERARCHY_DEPTH {
                break;
            }
            current = parent;
            depth += 1;
        }
        current
    }
}

#[derive(Debug, Clone)]
struct Node {
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed scene hierarchy.
///
/// Node ids are never reused, so a despawned id stays invalid.
#[derive(Debug, Default)]
pub struct SceneTree {
    nodes: Vec<Option<Node>>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node
    pub fn spawn(&mut self, local: Transform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            local,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    /// Add a node under `parent`. A dead parent yields a root node.
    pub fn spawn_child(&mut self, parent: NodeId, local: Transform) -> NodeId {
        let id = self.spawn(local);
        if !self.set_parent(id, Some(parent)) {
            log::warn!("spawn_child: parent {parent:?} is not alive, spawned {id:?} as root");
        }
        id
    }

    /// Re-parent a node, keeping its local transform.
    ///
    /// Returns `false` if either node is dead or the link would form a cycle.
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> bool {
        if !self.contains(node) {
            return false;
        }
        if let Some(parent) = parent {
            if !self.contains(parent) || self.is_ancestor_or_self(node, parent) {
                return false;
            }
        }

        if let Some(old) = self.node(node).and_then(|n| n.parent) {
            if let Some(old_node) = self.node_mut(old) {
                old_node.children.retain(|&c| c != node);
            }
        }
        if let Some(parent) = parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.push(node);
            }
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = parent;
        }
        true
    }

    /// Remove a node and all of its descendants
    pub fn despawn(&mut self, node: NodeId) {
        let Some(removed) = self.nodes.get_mut(node.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(parent) = removed.parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|&c| c != node);
            }
        }
        for child in removed.children {
            self.despawn(child);
        }
    }

    pub fn local(&self, node: NodeId) -> Option<&Transform> {
        self.node(node).map(|n| &n.local)
    }

    pub fn local_mut(&mut self, node: NodeId) -> Option<&mut Transform> {
        self.node_mut(node).map(|n| &mut n.local)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.0 as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node.0 as usize).and_then(Option::as_mut)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Full world matrix of the parent (identity for roots)
    fn parent_matrix(&self, node: NodeId) -> Mat4 {
        match self.parent(node) {
            Some(parent) => self.full_world_matrix(parent),
            None => Mat4::IDENTITY,
        }
    }

    fn full_world_matrix(&self, node: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(node);
        let mut depth = 0;
        while let Some(id) = current {
            let Some(n) = self.node(id) else { break };
            matrix = n.local.matrix() * matrix;
            depth += 1;
            if depth > MAX_HIERARCHY_DEPTH {
                break;
            }
            current = n.parent;
        }
        matrix
    }

    fn parent_rotation(&self, node: NodeId) -> Quat {
        match self.parent(node) {
            Some(parent) => self.world_rotation(parent),
            None => Quat::IDENTITY,
        }
    }
}

impl SceneGraph for SceneTree {
    fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn local_position(&self, node: NodeId) -> Vec3 {
        self.node(node).map(|n| n.local.position).unwrap_or(Vec3::ZERO)
    }

    fn set_local_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.node_mut(node) {
            n.local.position = position;
        }
    }

    fn local_rotation(&self, node: NodeId) -> Quat {
        self.node(node)
            .map(|n| n.local.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_local_rotation(&mut self, node: NodeId, rotation: Quat) {
        if let Some(n) = self.node_mut(node) {
            n.local.rotation = rotation;
        }
    }

    fn world_position(&self, node: NodeId) -> Vec3 {
        self.parent_matrix(node)
            .transform_point3(self.local_position(node))
    }

    fn set_world_position(&mut self, node: NodeId, position: Vec3) {
        let local = self.parent_matrix(node).inverse().transform_point3(position);
        self.set_local_position(node, local);
    }

    fn world_rotation(&self, node: NodeId) -> Quat {
        let mut rotation = Quat::IDENTITY;
        let mut current = Some(node);
        let mut depth = 0;
        while let Some(id) = current {
            let Some(n) = self.node(id) else { break };
            rotation = n.local.rotation * rotation;
            depth += 1;
            if depth > MAX_HIERARCHY_DEPTH {
                break;
            }
            current = n.parent;
        }
        rotation
    }

    fn set_world_rotation(&mut self, node: NodeId, rotation: Quat) {
        let local = (self.parent_rotation(node).inverse() * rotation).normalize();
        self.set_local_rotation(node, local);
    }
}
