use glam::Vec3;

use crate::light::DirectionalLight;

/// World-space surface sample handed to [`shade`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub albedo: Vec3,
}

/// Separate contributions of the lighting model at one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingTerms {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub visibility: f32,
}

impl LightingTerms {
    /// Final colour: ambient is never shadowed, diffuse and specular are
    /// scaled by the visibility.
    pub fn color(&self) -> Vec3 {
        self.ambient + self.visibility * (self.diffuse + self.specular)
    }
}

pub fn shade(
    light: &DirectionalLight,
    view_position: Vec3,
    surface: &SurfacePoint,
    visibility: f32,
) -> LightingTerms {
    let normal = surface.normal.normalize_or_zero();
    let to_light = -light.direction();
    let n_dot_l = normal.dot(to_light);

    let ambient = light.ambient * surface.albedo;
    let diffuse = light.diffuse * n_dot_l.max(0.0) * surface.albedo;
    let specular = if n_dot_l > 0.0 {
        let to_view = (view_position - surface.position).normalize_or_zero();
        let reflected = reflect(-to_light, normal);
        light.specular * to_view.dot(reflected).max(0.0).powf(light.shininess)
    } else {
        Vec3::ZERO
    };

    LightingTerms {
        ambient,
        diffuse,
        specular,
        visibility,
    }
}

// Same convention as WGSL `reflect(e1, e2)`.
fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overhead_light() -> DirectionalLight {
        DirectionalLight::new(Vec3::new(0.0, 5.0, -5.0), Vec3::new(0.0, -1.0, 1.0))
    }

    fn floor_point() -> SurfacePoint {
        SurfacePoint {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            albedo: Vec3::ONE,
        }
    }

    #[test]
    fn shadowed_point_keeps_only_ambient() {
        let light = overhead_light();
        let terms = shade(&light, Vec3::new(0.0, 2.0, 2.0), &floor_point(), 0.0);
        assert!(terms.diffuse.x > 0.0);
        assert_eq!(terms.color(), light.ambient);
    }

    #[test]
    fn back_face_has_no_specular() {
        let light = overhead_light();
        let surface = SurfacePoint {
            normal: Vec3::NEG_Y,
            ..floor_point()
        };
        let terms = shade(&light, Vec3::new(0.0, -2.0, 2.0), &surface, 1.0);
        assert_eq!(terms.diffuse, Vec3::ZERO);
        assert_eq!(terms.specular, Vec3::ZERO);
    }

    #[test]
    fn mirror_direction_gets_full_specular() {
        let light = overhead_light();
        // the light travels along (0, -1, 1), so it bounces toward (0, 1, 1)
        let terms = shade(&light, Vec3::new(0.0, 3.0, 3.0), &floor_point(), 1.0);
        assert!((terms.specular - light.specular).length() < 1e-4);
    }
}
