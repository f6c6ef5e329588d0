use std::time::Instant;

use crate::camera::{CameraController, CameraInput, CameraState, Projection};
use crate::config::DemoConfig;
use crate::frame::DrawList;
use crate::geometry::GeometryStore;
use crate::light::{DirectionalLight, LightError, LightSpace};
use crate::render::{CameraParams, LightParams};
use crate::scene::SceneGraph;

/// Mutable state carried from one frame to the next.
///
/// The light never moves, so its light space is built once here and reused by
/// every frame.
#[derive(Debug)]
pub struct FrameState {
    pub camera: CameraState,
    controller: CameraController,
    projection: Projection,
    light: DirectionalLight,
    light_space: LightSpace,
    store: GeometryStore,
    scene: SceneGraph,
    elapsed: f32,
}

/// What the renderer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub camera: CameraParams,
    pub light: LightParams,
    pub draws: DrawList,
}

impl FrameState {
    pub fn new(config: &DemoConfig) -> Result<Self, LightError> {
        let (store, cube, ground) = GeometryStore::builtin();
        let light_space = LightSpace::new(&config.light)?;
        Ok(Self {
            camera: config.camera.start,
            controller: config.camera.controller,
            projection: config.camera.projection,
            light: config.light,
            light_space,
            store,
            scene: SceneGraph::demo(cube, ground),
            elapsed: 0.0,
        })
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn light(&self) -> &DirectionalLight {
        &self.light
    }

    pub fn light_space(&self) -> &LightSpace {
        &self.light_space
    }

    /// Seconds of animation time accumulated so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Applies one frame of input and evaluates the scene at the new time.
    pub fn advance(&mut self, input: &CameraInput, dt: f32, aspect: f32) -> FrameSnapshot {
        let dt = dt.max(0.0);
        self.controller.update(&mut self.camera, input, dt);
        self.elapsed += dt;

        let instances = self.scene.evaluate(self.elapsed);
        FrameSnapshot {
            camera: camera_params(&self.camera, &self.projection, aspect),
            light: light_params(&self.light, &self.light_space),
            draws: DrawList::build(&instances, &self.store),
        }
    }
}

pub fn camera_params(camera: &CameraState, projection: &Projection, aspect: f32) -> CameraParams {
    CameraParams {
        view: camera.view_matrix(),
        projection: projection.matrix(aspect),
        position: camera.position,
    }
}

pub fn light_params(light: &DirectionalLight, space: &LightSpace) -> LightParams {
    LightParams {
        light_space: space.matrix,
        direction: light.direction(),
        ambient: light.ambient,
        diffuse: light.diffuse,
        specular: light.specular,
        shininess: light.shininess,
        shadow_bias: light.shadow_bias,
    }
}

/// Measures wall-clock time between frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::input::MoveKeys;

    #[test]
    fn light_space_is_cached_across_frames() {
        let mut state = FrameState::new(&DemoConfig::default()).unwrap();
        let first = state.advance(&CameraInput::default(), 0.016, 1.0);
        let second = state.advance(&CameraInput::default(), 0.016, 1.0);
        assert_eq!(first.light.light_space, second.light.light_space);
        assert_eq!(first.light.light_space, state.light_space().matrix);
    }

    #[test]
    fn advance_moves_camera_and_animation() {
        let mut state = FrameState::new(&DemoConfig::default()).unwrap();
        let input = CameraInput {
            cursor_delta: Vec2::ZERO,
            keys: MoveKeys {
                forward: true,
                ..MoveKeys::default()
            },
        };
        let snapshot = state.advance(&input, 0.5, 1.0);
        assert!((state.camera.position - Vec3::new(0.0, 3.0, 3.0)).length() < 1e-5);
        assert_eq!(snapshot.camera.position, state.camera.position);
        assert_eq!(state.elapsed(), 0.5);
        assert_eq!(snapshot.draws.len(), state.scene().len());
    }

    #[test]
    fn invalid_light_is_reported() {
        let mut config = DemoConfig::default();
        config.light.set_direction(Vec3::NEG_Y);
        assert!(matches!(
            FrameState::new(&config),
            Err(LightError::ParallelToUp(_))
        ));
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut clock = FrameClock::start();
        assert!(clock.tick() >= 0.0);
    }
}
