use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Up reference used to orient the light's view.
pub const LIGHT_UP: Vec3 = Vec3::Y;

#[derive(Debug, Error, PartialEq)]
pub enum LightError {
    #[error("light direction must be non-zero")]
    ZeroDirection,
    #[error("light direction {0} is parallel to the up reference")]
    ParallelToUp(Vec3),
    #[error("orthographic bounds are empty: {0:?}")]
    EmptyBounds(OrthoBounds),
}

/// Fixed orthographic volume of the light, in light view space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }

    fn is_empty(&self) -> bool {
        !(self.left < self.right && self.bottom < self.top && self.near < self.far)
    }
}

impl Default for OrthoBounds {
    fn default() -> Self {
        Self {
            left: -15.0,
            right: 10.0,
            bottom: -5.0,
            top: 10.0,
            near: 0.0,
            far: 20.0,
        }
    }
}

/// Directional light with a shadow-casting orthographic volume.
///
/// `position` only anchors the light's view; there is no attenuation.
/// Serialize only: `direction` is normalized by the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalLight {
    pub position: Vec3,
    direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub bounds: OrthoBounds,
    /// Subtracted from the fragment depth before the shadow comparison.
    pub shadow_bias: f32,
}

impl DirectionalLight {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            ..Self::default()
        }
    }

    /// Unit vector pointing from the light toward the scene.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize_or_zero();
    }

    pub fn with_bounds(mut self, bounds: OrthoBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_shadow_bias(mut self, bias: f32) -> Self {
        self.shadow_bias = bias;
        self
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(3.0, 3.0, -7.0),
            direction: Vec3::new(-1.0, -1.0, 1.0).normalize(),
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.75),
            specular: Vec3::splat(0.5),
            shininess: 32.0,
            bounds: OrthoBounds::default(),
            shadow_bias: 0.005,
        }
    }
}

/// The light's view, projection and combined light-space matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpace {
    pub view: Mat4,
    pub projection: Mat4,
    /// `projection * view`, maps world positions to light clip space.
    pub matrix: Mat4,
}

impl LightSpace {
    pub fn new(light: &DirectionalLight) -> Result<Self, LightError> {
        let direction = light.direction();
        if direction == Vec3::ZERO {
            return Err(LightError::ZeroDirection);
        }
        if direction.cross(LIGHT_UP).length_squared() <= f32::EPSILON {
            return Err(LightError::ParallelToUp(direction));
        }
        if light.bounds.is_empty() {
            return Err(LightError::EmptyBounds(light.bounds));
        }

        let view = Mat4::look_at_rh(light.position, light.position + direction, LIGHT_UP);
        let projection = light.bounds.projection();
        Ok(Self {
            view,
            projection,
            matrix: projection * view,
        })
    }

    /// Projects a world position to shadow-map coordinates.
    ///
    /// Returns `(u, v, depth)` with `u, v` in texture space (v grows
    /// downward) and depth in `[0, 1]` inside the volume.
    pub fn project(&self, world: Vec3) -> Vec3 {
        let clip = self.matrix * world.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        Vec3::new(ndc.x * 0.5 + 0.5, ndc.y * -0.5 + 0.5, ndc.z)
    }

    /// Whether a world position falls inside the orthographic volume.
    pub fn contains(&self, world: Vec3) -> bool {
        let p = self.project(world);
        (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y) && (0.0..=1.0).contains(&p.z)
    }
}
