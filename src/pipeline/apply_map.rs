//! Resampling through the pixelization map
//!
//! The same pass type pixelizes both the scene color and the outline
//! metadata, so both are quantized by one map and their pixel boundaries
//! coincide.

use crate::pipeline::shaders::ShaderId;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

pub struct ApplyMapPass {
    name: &'static str,
    source: ResourceSlot,
    target: ResourceSlot,
    shader: ShaderId,
}

impl ApplyMapPass {
    /// Live camera color into the pixelized color (and co-located depth) target
    pub fn color() -> Self {
        Self {
            name: "ColorPixelize",
            source: ResourceSlot::CameraColor,
            target: ResourceSlot::PixelatedScene,
            shader: ShaderId::ColorPixelize,
        }
    }

    /// Raw outline metadata into pixelized outlines
    pub fn outlines() -> Self {
        Self {
            name: "OutlinePixelize",
            source: ResourceSlot::OutlinesTemp,
            target: ResourceSlot::Outlines,
            shader: ShaderId::OutlinePixelize,
        }
    }

    pub fn source(&self) -> ResourceSlot {
        self.source
    }

    pub fn target(&self) -> ResourceSlot {
        self.target
    }
}

impl RenderPass for ApplyMapPass {
    fn name(&self) -> &str {
        self.name
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.source, ResourceUsage::TextureRead);
        ctx.read(ResourceSlot::PixelizationMap, ResourceUsage::TextureRead);
        ctx.write(self.target, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let (Some(source), Some(map)) = (
            ctx.read(self.source),
            ctx.read(ResourceSlot::PixelizationMap),
        ) else {
            return;
        };
        let Some(target) = ctx.target(self.target) else {
            return;
        };
        ctx.backend.set_global_texture("_MainTex", source);
        ctx.backend
            .set_global_texture(ResourceSlot::PixelizationMap.name(), map);
        ctx.blit_or_copy(source, target, self.shader);
    }
}
