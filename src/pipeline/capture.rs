//! Scene capture pass

use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

/// Copies the live camera color into a point-filtered target so later
/// stages sample unfiltered texels.
pub struct CapturePass;

impl RenderPass for CapturePass {
    fn name(&self) -> &str {
        "Capture"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(ResourceSlot::CameraColor, ResourceUsage::TextureRead);
        ctx.write(ResourceSlot::OriginalScene, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(source) = ctx.read(ResourceSlot::CameraColor) else {
            return;
        };
        let Some(target) = ctx.target(ResourceSlot::OriginalScene) else {
            return;
        };
        ctx.backend.blit(source, target, None);
    }
}
