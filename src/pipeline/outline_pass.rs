//! Outline metadata raster

use crate::backend::RenderPassDescriptor;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

/// Pass tag carried by materials that contribute outline ids
pub const OUTLINE_TAG: &str = "Outlines";

/// Value the outline target is cleared to before drawing: no object
pub const OUTLINE_CLEAR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Draws tagged scene geometry with the camera's own view and projection,
/// writing per-object ids instead of shaded color.
pub struct OutlineRasterPass;

impl RenderPass for OutlineRasterPass {
    fn name(&self) -> &str {
        "OutlineRaster"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.write(ResourceSlot::OutlinesTemp, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(target) = ctx.target(ResourceSlot::OutlinesTemp) else {
            return;
        };
        ctx.backend.begin_render_pass(
            &RenderPassDescriptor::color(self.name(), target).with_clear(OUTLINE_CLEAR),
        );
        ctx.backend.draw_tagged_renderers(OUTLINE_TAG);
        ctx.backend.end_render_pass();
    }
}
