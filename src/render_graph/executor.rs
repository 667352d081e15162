//! Pass sequence executor

use glam::Vec4;

use crate::backend::traits::*;
use crate::pipeline::shaders::ShaderSet;
use crate::render_graph::graph::*;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::scene::CameraMatrices;

/// Runs a [`PassSequence`] against the current frame's resources
#[derive(Debug, Default)]
pub struct PassExecutor {
    /// Passes executed during the most recent frame, in order
    executed: Vec<PassId>,
}

impl PassExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute every pass in order, marking declared outputs as written
    /// once the pass has recorded its commands.
    pub fn execute(
        &mut self,
        sequence: &PassSequence,
        backend: &mut dyn GraphicsBackend,
        resources: &mut FrameResources,
        shaders: &ShaderSet,
        camera: &CameraMatrices,
        texel_size: Vec4,
    ) {
        self.executed.clear();

        for (pass, node) in sequence.passes().iter().zip(sequence.pass_nodes()) {
            log::trace!("Executing pass '{}'", node.name);
            {
                let mut ctx = PassExecuteContext {
                    backend: &mut *backend,
                    resources: &*resources,
                    shaders,
                    camera,
                    texel_size,
                    pass_name: &node.name,
                };
                pass.execute(&mut ctx);
            }
            for output in &node.outputs {
                resources.mark_written(output.resource);
            }
            self.executed.push(node.id);
        }
    }

    pub fn executed(&self) -> &[PassId] {
        &self.executed
    }
}
