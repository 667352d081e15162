//! Render pass definitions for the pass sequence

use glam::Vec4;

use crate::backend::traits::*;
use crate::pipeline::shaders::{ShaderId, ShaderSet};
use crate::render_graph::resource::*;
use crate::scene::CameraMatrices;

/// Unique identifier for a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(pub(crate) u32);

/// Context for declaring pass resources
pub struct PassSetupContext<'a> {
    pub(crate) inputs: &'a mut Vec<ResourceAccess>,
    pub(crate) outputs: &'a mut Vec<ResourceAccess>,
}

impl<'a> PassSetupContext<'a> {
    /// Declare that this pass reads from a resource
    pub fn read(&mut self, resource: ResourceSlot, usage: ResourceUsage) {
        self.inputs.push(ResourceAccess { resource, usage });
    }

    /// Declare that this pass writes to a resource
    pub fn write(&mut self, resource: ResourceSlot, usage: ResourceUsage) {
        self.outputs.push(ResourceAccess { resource, usage });
    }
}

/// Context for executing a render pass
pub struct PassExecuteContext<'a> {
    pub backend: &'a mut dyn GraphicsBackend,
    pub resources: &'a FrameResources,
    pub shaders: &'a ShaderSet,
    pub camera: &'a CameraMatrices,
    /// (1/width, 1/height, width, height)
    pub texel_size: Vec4,
    pub(crate) pass_name: &'a str,
}

impl<'a> PassExecuteContext<'a> {
    /// Sample a resource written earlier this frame.
    ///
    /// Returns `None` (and logs) if the slot has not been written yet.
    pub fn read(&self, slot: ResourceSlot) -> Option<TextureBinding> {
        self.read_aspect(slot, false)
    }

    /// Sample the depth aspect of a resource written earlier this frame.
    pub fn read_depth(&self, slot: ResourceSlot) -> Option<TextureBinding> {
        self.read_aspect(slot, true)
    }

    fn read_aspect(&self, slot: ResourceSlot, depth: bool) -> Option<TextureBinding> {
        if !self.resources.is_written(slot) {
            log::error!(
                "Pass '{}' reads {} before it was written this frame",
                self.pass_name,
                slot.name()
            );
            return None;
        }
        let texture = self.resources.get(slot)?;
        Some(if depth {
            TextureBinding::depth(texture)
        } else {
            TextureBinding::color(texture)
        })
    }

    /// Texture to render into.
    pub fn target(&self, slot: ResourceSlot) -> Option<TextureHandle> {
        let texture = self.resources.get(slot);
        if texture.is_none() {
            log::error!(
                "Pass '{}' targets {} which is not bound",
                self.pass_name,
                slot.name()
            );
        }
        texture
    }

    /// Resolved shader, or `None` if it is missing.
    pub fn shader(&self, id: ShaderId) -> Option<ShaderHandle> {
        self.shaders.get(id)
    }

    /// Copy `source` into `target` through `shader`, or plainly if the shader
    /// is missing.
    pub fn blit_or_copy(
        &mut self,
        source: TextureBinding,
        target: TextureHandle,
        shader: ShaderId,
    ) {
        let shader = self.shader(shader);
        self.backend.blit(source, target, shader);
    }
}

/// Trait for render passes
pub trait RenderPass {
    /// Get the pass name for debugging
    fn name(&self) -> &str;

    /// Setup phase - declare resources and dependencies
    fn setup(&mut self, ctx: &mut PassSetupContext);

    /// Execute phase - record commands
    fn execute(&self, ctx: &mut PassExecuteContext);
}

/// Metadata about a pass in the sequence
#[derive(Debug)]
pub struct PassNode {
    pub id: PassId,
    pub name: String,
    pub inputs: Vec<ResourceAccess>,
    pub outputs: Vec<ResourceAccess>,
}

impl PassNode {
    pub fn reads_resource(&self, resource: ResourceSlot) -> bool {
        self.inputs.iter().any(|a| a.resource == resource)
    }

    pub fn writes_resource(&self, resource: ResourceSlot) -> bool {
        self.outputs.iter().any(|a| a.resource == resource)
    }
}
