use glam::Mat4;

use crate::geometry::{GeometryStore, MeshId};
use crate::scene::Instance;

/// One indexed draw of a scene instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub mesh: MeshId,
    pub model: Mat4,
    /// Slot of the instance in the per-object uniform buffer.
    pub slot: u32,
    pub index_count: u32,
}

/// Receives the draws of a render pass.
pub trait DrawSink {
    fn draw(&mut self, command: &DrawCommand);
}

/// Draws of one frame. Both passes replay the same list, so they agree on
/// geometry and on model matrices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Builds the list, skipping instances whose mesh is unknown.
    pub fn build(instances: &[Instance], store: &GeometryStore) -> Self {
        let mut commands = Vec::with_capacity(instances.len());
        for instance in instances {
            let Some(mesh) = store.get(instance.mesh) else {
                log::warn!("instance references unknown mesh {:?}", instance.mesh);
                continue;
            };
            commands.push(DrawCommand {
                mesh: instance.mesh,
                model: instance.model,
                slot: commands.len() as u32,
                index_count: mesh.index_count(),
            });
        }
        Self { commands }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn replay(&self, sink: &mut impl DrawSink) {
        for command in &self.commands {
            sink.draw(command);
        }
    }
}

/// Sink that keeps every command, for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<DrawCommand>,
}

impl DrawSink for RecordingSink {
    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(*command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;

    #[test]
    fn both_passes_see_identical_draws() {
        let (store, cube, ground) = GeometryStore::builtin();
        let instances = SceneGraph::demo(cube, ground).evaluate(1.25);
        let draws = DrawList::build(&instances, &store);

        let mut shadow = RecordingSink::default();
        let mut lighting = RecordingSink::default();
        draws.replay(&mut shadow);
        draws.replay(&mut lighting);

        assert_eq!(shadow.commands, lighting.commands);
        assert_eq!(shadow.commands.len(), instances.len());
        for (command, instance) in shadow.commands.iter().zip(&instances) {
            assert_eq!(command.model, instance.model);
            let mesh = store.get(command.mesh).unwrap();
            assert_eq!(command.index_count as usize, mesh.indices().len());
        }
    }

    #[test]
    fn slots_are_dense_when_meshes_are_missing() {
        let (store, cube, _) = GeometryStore::builtin();
        let instances = [
            Instance {
                mesh: cube,
                model: Mat4::IDENTITY,
            },
            Instance {
                mesh: MeshId(42),
                model: Mat4::IDENTITY,
            },
            Instance {
                mesh: cube,
                model: Mat4::IDENTITY,
            },
        ];
        let draws = DrawList::build(&instances, &store);
        let slots: Vec<u32> = draws.commands().iter().map(|c| c.slot).collect();
        assert_eq!(slots, vec![0, 1]);
    }
}
