//! Final composite pass

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::backend::RenderPassDescriptor;
use crate::pipeline::shaders::ShaderId;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

/// Outline suppression between nearly coplanar surfaces.
///
/// An outline pixel is dropped when the depth step across the pixel
/// boundary is strictly below `threshold`. A step equal to the threshold
/// still draws the outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineDepthTest {
    pub enabled: bool,
    pub threshold: f32,
}

impl OutlineDepthTest {
    pub fn suppresses(&self, depth: f32, neighbour_depth: f32) -> bool {
        self.enabled && (depth - neighbour_depth).abs() < self.threshold
    }
}

/// Uniform block read by the composite shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompositeParams {
    /// (1/width, 1/height, width, height)
    pub texel_size: [f32; 4],
    pub depth_test_threshold: f32,
    pub depth_test_enabled: u32,
    _padding: [u32; 2],
}

impl CompositeParams {
    pub const UNIFORM_NAME: &'static str = "CompositeParams";

    pub fn new(texel_size: Vec4, depth_test: &OutlineDepthTest) -> Self {
        Self {
            texel_size: texel_size.to_array(),
            depth_test_threshold: depth_test.threshold,
            depth_test_enabled: depth_test.enabled as u32,
            _padding: [0; 2],
        }
    }
}

/// Combines pixelized color, outlines and depth into the camera target.
pub struct CompositePass {
    depth_test: OutlineDepthTest,
}

impl CompositePass {
    pub fn new(depth_test: OutlineDepthTest) -> Self {
        Self { depth_test }
    }

    pub fn depth_test(&self) -> &OutlineDepthTest {
        &self.depth_test
    }
}

impl RenderPass for CompositePass {
    fn name(&self) -> &str {
        "Composite"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(ResourceSlot::PixelatedScene, ResourceUsage::TextureRead);
        ctx.read(ResourceSlot::Outlines, ResourceUsage::TextureRead);
        ctx.read(ResourceSlot::DepthAttachmentTemp, ResourceUsage::DepthRead);
        ctx.write(ResourceSlot::CameraColor, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let (Some(pixelated), Some(outlines), Some(depth)) = (
            ctx.read(ResourceSlot::PixelatedScene),
            ctx.read(ResourceSlot::Outlines),
            ctx.read_depth(ResourceSlot::DepthAttachmentTemp),
        ) else {
            return;
        };
        let Some(target) = ctx.target(ResourceSlot::CameraColor) else {
            return;
        };

        let Some(shader) = ctx.shader(ShaderId::Composite) else {
            ctx.backend.blit(pixelated, target, None);
            return;
        };

        let backend = &mut *ctx.backend;
        backend.set_global_texture(ResourceSlot::Outlines.name(), outlines);
        backend.set_global_texture("_MainTex", pixelated);
        backend.set_global_texture("_Pixelised", pixelated);
        backend.set_global_vector("_TexelSize", ctx.texel_size);
        backend.set_global_texture("_Depth", depth);
        let params = CompositeParams::new(ctx.texel_size, &self.depth_test);
        backend.write_uniform(CompositeParams::UNIFORM_NAME, bytemuck::bytes_of(&params));

        backend.set_view_projection(ctx.camera.view, ctx.camera.projection);
        backend.begin_render_pass(&RenderPassDescriptor::color(self.name(), target));
        backend.draw_fullscreen(shader);
        backend.end_render_pass();
    }
}
