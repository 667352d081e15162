//! Pixelization map pass
//!
//! Renders a lookup describing how groups of source texels collapse into
//! single output pixels. The shader switches on `ORTHO_PROJECTION`, set by
//! the pipeline each frame.

use crate::pipeline::shaders::ShaderId;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

pub struct PixelizationMapPass;

impl RenderPass for PixelizationMapPass {
    fn name(&self) -> &str {
        "PixelizationMap"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(ResourceSlot::OriginalScene, ResourceUsage::TextureRead);
        ctx.write(ResourceSlot::PixelizationMap, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(source) = ctx.read(ResourceSlot::OriginalScene) else {
            return;
        };
        let Some(target) = ctx.target(ResourceSlot::PixelizationMap) else {
            return;
        };
        ctx.backend.set_global_texture("_MainTex", source);
        ctx.blit_or_copy(source, target, ShaderId::PixelizationMap);
    }
}
