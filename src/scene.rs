use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::MeshId;

/// Rotation angle of a transform step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Angle {
    /// Constant angle in degrees.
    Degrees(f32),
    /// Angle in degrees that grows with elapsed seconds.
    DegreesPerSecond(f32),
}

impl Angle {
    pub fn radians_at(self, elapsed: f32) -> f32 {
        match self {
            Angle::Degrees(degrees) => degrees.to_radians(),
            Angle::DegreesPerSecond(rate) => (elapsed * rate).to_radians(),
        }
    }
}

/// One operation of a transform recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformStep {
    Scale(Vec3),
    Translate(Vec3),
    Rotate { axis: Vec3, angle: Angle },
}

impl TransformStep {
    pub fn uniform_scale(factor: f32) -> Self {
        Self::Scale(Vec3::splat(factor))
    }

    pub fn rotate_degrees(axis: Vec3, degrees: f32) -> Self {
        Self::Rotate {
            axis,
            angle: Angle::Degrees(degrees),
        }
    }

    pub fn spin(axis: Vec3, degrees_per_second: f32) -> Self {
        Self::Rotate {
            axis,
            angle: Angle::DegreesPerSecond(degrees_per_second),
        }
    }

    fn matrix(&self, elapsed: f32) -> Mat4 {
        match *self {
            TransformStep::Scale(factor) => Mat4::from_scale(factor),
            TransformStep::Translate(offset) => Mat4::from_translation(offset),
            TransformStep::Rotate { axis, angle } => {
                let axis = axis.normalize_or_zero();
                if axis == Vec3::ZERO {
                    Mat4::IDENTITY
                } else {
                    Mat4::from_axis_angle(axis, angle.radians_at(elapsed))
                }
            }
        }
    }
}

/// Composes a recipe into a model matrix.
///
/// Every step right-multiplies the accumulated matrix, so the last step of the
/// recipe is the first one applied to the mesh vertices.
pub fn compose_transform(recipe: &[TransformStep], elapsed: f32) -> Mat4 {
    recipe
        .iter()
        .fold(Mat4::IDENTITY, |model, step| model * step.matrix(elapsed))
}

/// Declarative placement of a mesh in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub name: String,
    pub mesh: MeshId,
    pub recipe: Vec<TransformStep>,
}

impl InstanceDescriptor {
    pub fn new(name: impl Into<String>, mesh: MeshId, recipe: Vec<TransformStep>) -> Self {
        Self {
            name: name.into(),
            mesh,
            recipe,
        }
    }
}

/// Mesh placement evaluated for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub mesh: MeshId,
    pub model: Mat4,
}

/// Flat list of instances; there is no parenting between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    instances: Vec<InstanceDescriptor>,
}

impl SceneGraph {
    pub fn new(instances: Vec<InstanceDescriptor>) -> Self {
        Self { instances }
    }

    /// The five cubes over a ground plane shown by the demo.
    pub fn demo(cube: MeshId, ground: MeshId) -> Self {
        use TransformStep::*;
        Self::new(vec![
            InstanceDescriptor::new(
                "large-cube",
                cube,
                vec![
                    TransformStep::uniform_scale(2.0),
                    Translate(Vec3::new(0.0, 0.5, 0.0)),
                    TransformStep::rotate_degrees(Vec3::Y, 23.0),
                ],
            ),
            InstanceDescriptor::new(
                "tipped-cube",
                cube,
                vec![
                    TransformStep::uniform_scale(1.5),
                    Translate(Vec3::new(1.5, 0.5, 1.5)),
                    TransformStep::rotate_degrees(Vec3::Z, 90.0),
                ],
            ),
            InstanceDescriptor::new(
                "spinning-cube",
                cube,
                vec![
                    TransformStep::uniform_scale(1.0),
                    Translate(Vec3::new(2.5, 2.0, -2.0)),
                    TransformStep::spin(Vec3::ONE, 40.0),
                ],
            ),
            InstanceDescriptor::new(
                "small-cube",
                cube,
                vec![
                    TransformStep::uniform_scale(0.5),
                    Translate(Vec3::new(5.0, 3.5, 5.0)),
                    TransformStep::rotate_degrees(Vec3::Y, 45.0),
                    TransformStep::rotate_degrees(Vec3::Z, -90.0),
                ],
            ),
            InstanceDescriptor::new(
                "pillar",
                cube,
                vec![
                    Scale(Vec3::new(0.5, 2.0, 0.5)),
                    Translate(Vec3::new(-2.0, 0.8, -5.0)),
                    TransformStep::rotate_degrees(Vec3::new(1.0, 1.0, 0.0), 23.0),
                    TransformStep::spin(Vec3::X, 60.0),
                ],
            ),
            InstanceDescriptor::new(
                "ground",
                ground,
                vec![
                    Scale(Vec3::new(10.0, 1.0, 10.0)),
                    Translate(Vec3::new(0.0, -0.5, 0.0)),
                ],
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Evaluates every instance transform at `elapsed` seconds.
    pub fn evaluate(&self, elapsed: f32) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|descriptor| Instance {
                mesh: descriptor.mesh,
                model: compose_transform(&descriptor.recipe, elapsed),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn steps_apply_last_first() {
        let recipe = [
            TransformStep::uniform_scale(2.0),
            TransformStep::Translate(Vec3::new(0.0, 0.5, 0.0)),
        ];
        let model = compose_transform(&recipe, 0.0);
        // translate first, then scale: (0, 0, 0) -> (0, 0.5, 0) -> (0, 1, 0)
        assert_close(model.transform_point3(Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn rotation_happens_in_object_space() {
        let recipe = [
            TransformStep::Translate(Vec3::new(1.0, 0.0, 0.0)),
            TransformStep::rotate_degrees(Vec3::Y, 90.0),
        ];
        let model = compose_transform(&recipe, 0.0);
        assert_close(
            model.transform_point3(Vec3::X),
            Vec3::new(1.0, 0.0, -1.0),
        );
    }

    #[test]
    fn animated_rotation_depends_on_elapsed_time() {
        let recipe = [TransformStep::spin(Vec3::Y, 90.0)];
        let at_zero = compose_transform(&recipe, 0.0);
        let at_one = compose_transform(&recipe, 1.0);
        assert_eq!(at_zero, Mat4::IDENTITY);
        assert_close(at_one.transform_point3(Vec3::X), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn rotation_axis_is_normalized() {
        let short = compose_transform(&[TransformStep::rotate_degrees(Vec3::ONE, 30.0)], 0.0);
        let long = compose_transform(
            &[TransformStep::rotate_degrees(Vec3::splat(7.0), 30.0)],
            0.0,
        );
        assert!(short.abs_diff_eq(long, 1e-6));
    }

    #[test]
    fn demo_ground_sits_at_zero_height() {
        let graph = SceneGraph::demo(MeshId(0), MeshId(1));
        let instances = graph.evaluate(0.0);
        assert_eq!(instances.len(), 6);
        let ground = instances.last().unwrap();
        assert_eq!(ground.mesh, MeshId(1));
        // plane vertices sit at y = 0.5 in mesh space
        let corner = ground.model.transform_point3(Vec3::new(0.5, 0.5, 0.5));
        assert_close(corner, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn static_instances_do_not_move_over_time() {
        let graph = SceneGraph::demo(MeshId(0), MeshId(1));
        let early = graph.evaluate(0.5);
        let late = graph.evaluate(3.0);
        assert_eq!(early[0], late[0]);
        assert_ne!(early[2], late[2]);
    }
}
