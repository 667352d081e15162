//! Core backend abstraction traits
//!
//! These traits define the interface the host render engine must implement
//! for the pixelization pipeline to record its passes.

use crate::backend::types::*;
use glam::{Mat4, Vec4};
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

impl TextureHandle {
    /// Wrap a host-side texture identifier.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Handle to a compiled shader program (material)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) u64);

impl ShaderHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A texture as seen by a shader: the texture plus which aspect is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub texture: TextureHandle,
    pub aspect: TextureAspect,
}

impl TextureBinding {
    pub fn color(texture: TextureHandle) -> Self {
        Self {
            texture,
            aspect: TextureAspect::Color,
        }
    }

    pub fn depth(texture: TextureHandle) -> Self {
        Self {
            texture,
            aspect: TextureAspect::Depth,
        }
    }
}

/// Color attachment for render pass
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAttachment {
    pub texture: TextureHandle,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

/// Depth stencil attachment for render pass
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilAttachment {
    pub texture: TextureHandle,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub depth_clear_value: f32,
}

/// Render pass descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

impl RenderPassDescriptor {
    /// Single color target, contents loaded.
    pub fn color(label: &str, texture: TextureHandle) -> Self {
        Self {
            label: Some(label.to_string()),
            color_attachments: vec![ColorAttachment {
                texture,
                load_op: LoadOp::Load,
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: None,
        }
    }

    /// Depth-only target, cleared to the far plane.
    pub fn depth(label: &str, texture: TextureHandle) -> Self {
        Self {
            label: Some(label.to_string()),
            color_attachments: vec![],
            depth_stencil_attachment: Some(DepthStencilAttachment {
                texture,
                depth_load_op: LoadOp::Clear([1.0, 0.0, 0.0, 0.0]),
                depth_store_op: StoreOp::Store,
                depth_clear_value: 1.0,
            }),
        }
    }

    pub fn with_clear(mut self, color: [f32; 4]) -> Self {
        for attachment in &mut self.color_attachments {
            attachment.load_op = LoadOp::Clear(color);
        }
        self
    }
}

/// Host render engine consumed by the pixelization pipeline.
///
/// Everything recorded through this trait is expected to execute in call
/// order on a single queue.
pub trait GraphicsBackend {
    // Resource lifetime

    /// Acquire a temporary render target for the current frame
    fn acquire_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    /// Return a temporary render target
    fn release_texture(&mut self, texture: TextureHandle);

    // Shaders

    /// Resolve a shader program by name
    fn find_shader(&mut self, name: &str) -> Option<ShaderHandle>;

    /// Enable or disable a shader keyword (variant switch)
    fn set_shader_keyword(&mut self, shader: ShaderHandle, keyword: &str, enabled: bool);

    /// Set a float property on a shader
    fn set_shader_float(&mut self, shader: ShaderHandle, name: &str, value: f32);

    // Global bindings

    /// Bind a texture globally under a shader-visible name
    fn set_global_texture(&mut self, name: &str, binding: TextureBinding);

    /// Bind a vector globally under a shader-visible name
    fn set_global_vector(&mut self, name: &str, value: Vec4);

    /// Upload a uniform block
    fn write_uniform(&mut self, name: &str, data: &[u8]);

    /// Set the view and projection matrices used by subsequent draws
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);

    // Command recording

    /// Begin a render pass
    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor);

    /// End the current render pass
    fn end_render_pass(&mut self);

    /// Copy `source` into `target`, optionally through a shader
    fn blit(&mut self, source: TextureBinding, target: TextureHandle, shader: Option<ShaderHandle>);

    /// Draw a full-screen triangle with the given shader into the current pass
    fn draw_fullscreen(&mut self, shader: ShaderHandle);

    /// Draw every scene renderer whose material carries the given pass tag
    fn draw_tagged_renderers(&mut self, tag: &str);
}
