//! Pass sequence definition and validation

use std::collections::HashSet;

use thiserror::Error;

use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

/// Structural problem in a pass sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("pass '{pass}' reads {slot:?} before any earlier pass writes it")]
    ReadBeforeWrite { pass: String, slot: ResourceSlot },
    #[error("pass '{pass}' writes external resource {slot:?} before it was captured")]
    ExternalClobbered { pass: String, slot: ResourceSlot },
}

/// Strictly ordered list of passes.
///
/// Unlike a general render graph there is no reordering: passes run in the
/// order they were added and each may only read slots written by an earlier
/// pass (or external slots).
pub struct PassSequence {
    passes: Vec<Box<dyn RenderPass>>,
    pass_nodes: Vec<PassNode>,
    next_pass_id: u32,
}

impl PassSequence {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            pass_nodes: Vec::new(),
            next_pass_id: 0,
        }
    }

    /// Append a render pass
    pub fn add_pass<P: RenderPass + 'static>(&mut self, pass: P) -> PassId {
        let id = PassId(self.next_pass_id);
        self.next_pass_id += 1;

        let name = pass.name().to_string();
        let mut boxed_pass = Box::new(pass);

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        {
            let mut ctx = PassSetupContext {
                inputs: &mut inputs,
                outputs: &mut outputs,
            };
            boxed_pass.setup(&mut ctx);
        }

        self.passes.push(boxed_pass);
        self.pass_nodes.push(PassNode {
            id,
            name,
            inputs,
            outputs,
        });

        id
    }

    /// Check that every read is preceded by a write.
    ///
    /// External slots count as written at frame start, but may not be
    /// overwritten before some pass has read them.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut written: HashSet<ResourceSlot> = HashSet::new();
        let mut read_external: HashSet<ResourceSlot> = HashSet::new();

        for node in &self.pass_nodes {
            for input in &node.inputs {
                if input.resource.is_external() {
                    read_external.insert(input.resource);
                } else if !written.contains(&input.resource) {
                    return Err(GraphError::ReadBeforeWrite {
                        pass: node.name.clone(),
                        slot: input.resource,
                    });
                }
            }
            for output in &node.outputs {
                if output.resource.is_external() && !read_external.contains(&output.resource) {
                    return Err(GraphError::ExternalClobbered {
                        pass: node.name.clone(),
                        slot: output.resource,
                    });
                }
                written.insert(output.resource);
            }
        }
        Ok(())
    }

    pub fn passes(&self) -> &[Box<dyn RenderPass>] {
        &self.passes
    }

    pub fn pass_nodes(&self) -> &[PassNode] {
        &self.pass_nodes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn get_pass_node(&self, id: PassId) -> Option<&PassNode> {
        self.pass_nodes.iter().find(|n| n.id == id)
    }
}

impl Default for PassSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Declared {
        name: &'static str,
        reads: Vec<ResourceSlot>,
        writes: Vec<ResourceSlot>,
    }

    impl RenderPass for Declared {
        fn name(&self) -> &str {
            self.name
        }

        fn setup(&mut self, ctx: &mut PassSetupContext) {
            for &slot in &self.reads {
                ctx.read(slot, ResourceUsage::TextureRead);
            }
            for &slot in &self.writes {
                ctx.write(slot, ResourceUsage::RenderTarget);
            }
        }

        fn execute(&self, _ctx: &mut PassExecuteContext) {}
    }

    fn pass(
        name: &'static str,
        reads: &[ResourceSlot],
        writes: &[ResourceSlot],
    ) -> Declared {
        Declared {
            name,
            reads: reads.to_vec(),
            writes: writes.to_vec(),
        }
    }

    #[test]
    fn ordered_sequence_validates() {
        let mut seq = PassSequence::new();
        seq.add_pass(pass(
            "capture",
            &[ResourceSlot::CameraColor],
            &[ResourceSlot::OriginalScene],
        ));
        seq.add_pass(pass(
            "map",
            &[ResourceSlot::OriginalScene],
            &[ResourceSlot::PixelizationMap],
        ));
        assert_eq!(seq.len(), 2);
        assert!(seq.validate().is_ok());
        assert!(seq.pass_nodes()[1].reads_resource(ResourceSlot::OriginalScene));
    }

    #[test]
    fn read_before_write_is_rejected() {
        let mut seq = PassSequence::new();
        seq.add_pass(pass(
            "map",
            &[ResourceSlot::OriginalScene],
            &[ResourceSlot::PixelizationMap],
        ));
        seq.add_pass(pass(
            "capture",
            &[ResourceSlot::CameraColor],
            &[ResourceSlot::OriginalScene],
        ));
        assert_eq!(
            seq.validate(),
            Err(GraphError::ReadBeforeWrite {
                pass: "map".into(),
                slot: ResourceSlot::OriginalScene,
            })
        );
    }

    #[test]
    fn external_overwrite_before_capture_is_rejected() {
        let mut seq = PassSequence::new();
        seq.add_pass(pass("composite", &[], &[ResourceSlot::CameraColor]));
        assert!(matches!(
            seq.validate(),
            Err(GraphError::ExternalClobbered { .. })
        ));
    }
}
