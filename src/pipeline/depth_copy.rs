//! Depth passes
//!
//! [`DepthReconstructPass`] copies the pixelized depth into a standalone
//! depth attachment so outline depth tests agree with the pixelized
//! silhouette. [`DepthWriteBackPass`] publishes that depth to the camera
//! after the composite.

use glam::Mat4;

use crate::backend::{RenderPassDescriptor, TextureBinding};
use crate::pipeline::shaders::ShaderId;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

pub struct DepthReconstructPass;

impl RenderPass for DepthReconstructPass {
    fn name(&self) -> &str {
        "DepthReconstruct"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(ResourceSlot::PixelatedScene, ResourceUsage::DepthRead);
        ctx.write(
            ResourceSlot::DepthAttachmentTemp,
            ResourceUsage::DepthStencilWrite,
        );
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(source) = ctx.read_depth(ResourceSlot::PixelatedScene) else {
            return;
        };
        let Some(target) = ctx.target(ResourceSlot::DepthAttachmentTemp) else {
            return;
        };

        let Some(shader) = ctx.shader(ShaderId::CopyDepth) else {
            ctx.backend.blit(source, target, None);
            return;
        };

        ctx.backend.set_global_texture("_MainTex", source);
        ctx.backend.set_view_projection(Mat4::IDENTITY, Mat4::IDENTITY);
        ctx.backend
            .begin_render_pass(&RenderPassDescriptor::depth(self.name(), target));
        ctx.backend.draw_fullscreen(shader);
        ctx.backend.end_render_pass();
        ctx.backend
            .set_view_projection(ctx.camera.view, ctx.camera.projection);
    }
}

/// Copies the pixelized depth into the scene depth texture and the camera
/// depth attachment, then exposes the scene depth globally.
pub struct DepthWriteBackPass;

impl RenderPass for DepthWriteBackPass {
    fn name(&self) -> &str {
        "DepthWriteBack"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(ResourceSlot::DepthAttachmentTemp, ResourceUsage::DepthRead);
        ctx.write(ResourceSlot::SceneDepth, ResourceUsage::DepthStencilWrite);
        ctx.write(
            ResourceSlot::DepthAttachment,
            ResourceUsage::DepthStencilWrite,
        );
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(source) = ctx.read_depth(ResourceSlot::DepthAttachmentTemp) else {
            return;
        };
        let (Some(scene_depth), Some(attachment)) = (
            ctx.target(ResourceSlot::SceneDepth),
            ctx.target(ResourceSlot::DepthAttachment),
        ) else {
            return;
        };

        ctx.blit_or_copy(source, scene_depth, ShaderId::CopyDepth);
        ctx.blit_or_copy(source, attachment, ShaderId::CopyDepth);
        ctx.backend.set_global_texture(
            ResourceSlot::SceneDepth.name(),
            TextureBinding::depth(scene_depth),
        );
        ctx.backend
            .set_view_projection(ctx.camera.view, ctx.camera.projection);
    }
}
