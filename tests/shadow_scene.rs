use glam::Vec3;

use shadow_mapping::geometry::{ground_plane, unit_cube};
use shadow_mapping::light::{DirectionalLight, LightSpace, OrthoBounds};
use shadow_mapping::scene::{InstanceDescriptor, SceneGraph, TransformStep};
use shadow_mapping::shadow::{render_depth, visibility};
use shadow_mapping::{shade, DepthImage, DrawList, GeometryStore, SurfacePoint};

struct Fixture {
    light: DirectionalLight,
    space: LightSpace,
    image: DepthImage,
}

impl Fixture {
    fn visibility(&self, world: Vec3) -> f32 {
        visibility(&self.image, &self.space, world, self.light.shadow_bias)
    }
}

fn render(cube_at: Vec3, ground_scale: f32, light: DirectionalLight) -> Fixture {
    let mut store = GeometryStore::new();
    let cube = store.insert(unit_cube());
    let ground = store.insert(ground_plane());
    let scene = SceneGraph::new(vec![
        InstanceDescriptor::new("cube", cube, vec![TransformStep::Translate(cube_at)]),
        InstanceDescriptor::new(
            "ground",
            ground,
            vec![
                TransformStep::Scale(Vec3::new(ground_scale, 1.0, ground_scale)),
                TransformStep::Translate(Vec3::new(0.0, -1.0, 0.0)),
            ],
        ),
    ]);
    let draws = DrawList::build(&scene.evaluate(0.0), &store);
    let space = LightSpace::new(&light).expect("valid light");
    let mut image = DepthImage::new(1024, 1024);
    render_depth(&mut image, &draws, &store, &space);
    Fixture {
        light,
        space,
        image,
    }
}

fn side_light() -> DirectionalLight {
    DirectionalLight::new(Vec3::new(3.0, 4.0, 0.0), Vec3::new(-1.0, -1.0, 0.0)).with_bounds(
        OrthoBounds {
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.1,
            far: 20.0,
        },
    )
}

#[test]
fn ground_behind_the_cube_is_shadowed() {
    let fixture = render(Vec3::ZERO, 10.0, side_light());
    assert_eq!(fixture.visibility(Vec3::new(-1.0, -0.5, 0.0)), 0.0);
    assert_eq!(fixture.visibility(Vec3::new(2.0, -0.5, 0.0)), 1.0);
    assert_eq!(fixture.visibility(Vec3::new(0.0, -0.5, 2.0)), 1.0);
}

#[test]
fn light_facing_faces_are_fully_lit() {
    let fixture = render(Vec3::ZERO, 10.0, side_light());
    let view = Vec3::new(0.0, 3.0, 5.0);

    for (position, normal) in [
        (Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
        (Vec3::new(0.5, 0.0, 0.0), Vec3::X),
    ] {
        let visibility = fixture.visibility(position);
        assert_eq!(visibility, 1.0, "{position:?} should be lit");
        let surface = SurfacePoint {
            position,
            normal,
            albedo: Vec3::ONE,
        };
        let terms = shade(&fixture.light, view, &surface, visibility);
        assert!(terms.diffuse.x > 0.5);
        assert!(terms.color().x > terms.ambient.x + terms.diffuse.x - 1e-6);
    }
}

#[test]
fn far_side_shows_only_ambient() {
    let fixture = render(Vec3::ZERO, 10.0, side_light());
    let surface = SurfacePoint {
        position: Vec3::new(-0.5, 0.0, 0.0),
        normal: Vec3::NEG_X,
        albedo: Vec3::new(0.0, 0.0, 1.0),
    };
    let visibility = fixture.visibility(surface.position);
    let terms = shade(&fixture.light, Vec3::new(-4.0, 1.0, 0.0), &surface, visibility);
    assert_eq!(terms.color(), fixture.light.ambient * surface.albedo);
}

#[test]
fn geometry_outside_the_light_volume_is_unshadowed() {
    let fixture = render(Vec3::new(30.0, 0.0, 0.0), 100.0, DirectionalLight::default());
    let ground = Vec3::new(29.0, -0.5, 0.0);
    assert!(!fixture.space.contains(ground));
    assert_eq!(fixture.visibility(ground), 1.0);
}
