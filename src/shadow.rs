//! CPU depth pass and shadow test, for checking shadow placement without a GPU.

use glam::{Vec2, Vec3};

use crate::frame::{DrawCommand, DrawList, DrawSink};
use crate::geometry::GeometryStore;
use crate::light::LightSpace;

/// Cleared value of a depth image, the far plane.
pub const FAR_DEPTH: f32 = 1.0;

/// Single-channel depth image addressed like the GPU shadow texture: row 0 is
/// the top edge (`v = 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    texels: Vec<f32>,
}

impl DepthImage {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![FAR_DEPTH; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[f32] {
        &self.texels
    }

    pub fn clear(&mut self) {
        self.texels.fill(FAR_DEPTH);
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.texels[(y * self.width + x) as usize]
    }

    /// Nearest-texel lookup with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> f32 {
        let x = (uv.x * self.width as f32).floor().clamp(0.0, (self.width - 1) as f32) as u32;
        let y = (uv.y * self.height as f32).floor().clamp(0.0, (self.height - 1) as f32) as u32;
        self.get(x, y)
    }

    fn write_min(&mut self, x: u32, y: u32, depth: f32) {
        let index = (y * self.width + x) as usize;
        if depth < self.texels[index] {
            self.texels[index] = depth;
        }
    }
}

/// Depth-only rasterizer fed by a [`DrawList`].
pub struct DepthRasterizer<'a> {
    image: &'a mut DepthImage,
    store: &'a GeometryStore,
    light_space: &'a LightSpace,
}

impl<'a> DepthRasterizer<'a> {
    pub fn new(
        image: &'a mut DepthImage,
        store: &'a GeometryStore,
        light_space: &'a LightSpace,
    ) -> Self {
        Self {
            image,
            store,
            light_space,
        }
    }

    fn fill_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let area = edge(a, b, c.truncate());
        if area.abs() <= f32::EPSILON {
            return;
        }
        let (width, height) = (self.image.width as f32, self.image.height as f32);
        let min = a.truncate().min(b.truncate()).min(c.truncate());
        let max = a.truncate().max(b.truncate()).max(c.truncate());
        if max.x < 0.0 || max.y < 0.0 || min.x >= width || min.y >= height {
            return;
        }
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = max.x.ceil().min(width) as u32;
        let y1 = max.y.ceil().min(height) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * a.z + w1 * b.z + w2 * c.z;
                if (0.0..=FAR_DEPTH).contains(&depth) {
                    self.image.write_min(x, y, depth);
                }
            }
        }
    }
}

impl DrawSink for DepthRasterizer<'_> {
    fn draw(&mut self, command: &DrawCommand) {
        let store = self.store;
        let light_space = self.light_space;
        let Some(mesh) = store.get(command.mesh) else {
            return;
        };
        let size = Vec3::new(self.image.width as f32, self.image.height as f32, 1.0);
        let project = |position: Vec3| {
            light_space.project(command.model.transform_point3(position)) * size
        };
        for [a, b, c] in mesh.triangles() {
            self.fill_triangle(
                project(a.position()),
                project(b.position()),
                project(c.position()),
            );
        }
    }
}

fn edge(a: Vec3, b: Vec3, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Clears `image` and renders the depth of every draw from the light.
pub fn render_depth(
    image: &mut DepthImage,
    draws: &DrawList,
    store: &GeometryStore,
    light_space: &LightSpace,
) {
    image.clear();
    let mut rasterizer = DepthRasterizer::new(image, store, light_space);
    draws.replay(&mut rasterizer);
}

/// Fraction of light reaching `world`: 1.0 lit, 0.0 occluded.
///
/// Positions outside the light volume are always lit.
pub fn visibility(image: &DepthImage, light_space: &LightSpace, world: Vec3, bias: f32) -> f32 {
    let p = light_space.project(world);
    let inside = (0.0..=1.0).contains(&p.x)
        && (0.0..=1.0).contains(&p.y)
        && (0.0..=1.0).contains(&p.z);
    if !inside {
        return 1.0;
    }
    let stored = image.sample(p.truncate());
    if p.z - bias <= stored {
        1.0
    } else {
        0.0
    }
}
