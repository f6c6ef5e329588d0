use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

/// Camera parameters consumed by the lighting pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

/// Light state shared by the shadow and lighting passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    /// `projection * view` of the light. Both passes must receive the same
    /// matrix.
    pub light_space: Mat4,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub shadow_bias: f32,
}

/// Uniform of the depth-only pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct LightSpaceUniform {
    pub light_space: [[f32; 4]; 4],
}

impl LightSpaceUniform {
    pub fn new(light: &LightParams) -> Self {
        Self {
            light_space: light.light_space.to_cols_array_2d(),
        }
    }
}

/// Per-frame uniform of the lighting pass, laid out like `Globals` in
/// `lighting.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub light_direction: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    /// `w` carries the shininess exponent.
    pub light_specular: [f32; 4],
    /// `x` carries the depth bias.
    pub shadow_params: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraParams, light: &LightParams) -> Self {
        Self {
            view: camera.view.to_cols_array_2d(),
            projection: camera.projection.to_cols_array_2d(),
            light_space: light.light_space.to_cols_array_2d(),
            view_position: camera.position.extend(1.0).into(),
            light_direction: light.direction.extend(0.0).into(),
            light_ambient: light.ambient.extend(0.0).into(),
            light_diffuse: light.diffuse.extend(0.0).into(),
            light_specular: light.specular.extend(light.shininess).into(),
            shadow_params: [light.shadow_bias, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl ObjectConstants {
    pub fn new(model: Mat4) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<LightSpaceUniform>(), 64);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 3 * 64 + 6 * 16);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 64 + 48);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let constants = ObjectConstants::new(Mat4::from_scale(Vec3::new(0.5, 2.0, 0.5)));
        assert_eq!(constants.normal[0][0], 2.0);
        assert_eq!(constants.normal[1][1], 0.5);
        assert_eq!(constants.normal[2][3], 0.0);
    }

    #[test]
    fn shininess_and_bias_ride_in_spare_lanes() {
        let camera = CameraParams {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position: Vec3::ONE,
        };
        let light = LightParams {
            light_space: Mat4::IDENTITY,
            direction: Vec3::NEG_Z,
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.75),
            specular: Vec3::splat(0.5),
            shininess: 32.0,
            shadow_bias: 0.005,
        };
        let uniform = GlobalUniform::new(&camera, &light);
        assert_eq!(uniform.light_specular[3], 32.0);
        assert_eq!(uniform.shadow_params[0], 0.005);
        assert_eq!(uniform.light_direction, [0.0, 0.0, -1.0, 0.0]);
    }
}
