use bytemuck::bytes_of;
use log::warn;
use wgpu::util::DeviceExt;

use crate::frame::{DrawCommand, DrawSink};
use crate::geometry::{GeometryStore, Mesh, Vertex};

use super::common::ObjectConstants;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Unorm8x4, 2 => Float32x3];

/// Buffer layout of [`Vertex`], shared by both pipelines.
pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: Vertex::STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

pub(crate) struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let label = mesh.name();
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.index_count(),
        }
    }

    /// Uploads every mesh of the store, in `MeshId` order.
    pub fn upload_all(device: &wgpu::Device, store: &GeometryStore) -> Vec<Self> {
        store
            .iter()
            .map(|(_, mesh)| Self::from_mesh(device, mesh))
            .collect()
    }
}

/// Model matrices of every instance, one aligned slot each, bound with a
/// dynamic offset.
pub(crate) struct ObjectUniforms {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
}

impl ObjectUniforms {
    pub fn new(device: &wgpu::Device, capacity: u32) -> Self {
        let size = std::mem::size_of::<ObjectConstants>() as u64;
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = wgpu::util::align_to(size, alignment);
        let capacity = capacity.max(1);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(size),
                },
                count: None,
            }],
        });
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object-uniforms"),
            size: stride * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
        });

        Self {
            buffer,
            layout,
            bind_group,
            stride,
            capacity,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    fn offset(&self, slot: u32) -> Option<u32> {
        (slot < self.capacity).then(|| (u64::from(slot) * self.stride) as u32)
    }

    pub fn write(&self, queue: &wgpu::Queue, draws: &[DrawCommand]) {
        for command in draws {
            let Some(offset) = self.offset(command.slot) else {
                warn!("no uniform slot for draw {}; skipping", command.slot);
                continue;
            };
            let constants = ObjectConstants::new(command.model);
            queue.write_buffer(&self.buffer, u64::from(offset), bytes_of(&constants));
        }
    }
}

/// Replays draw commands into an open render pass. The pass's pipeline and
/// frame-level bind groups must already be set.
pub(crate) struct PassSink<'a, 'enc> {
    pub pass: &'a mut wgpu::RenderPass<'enc>,
    pub meshes: &'a [MeshBuffers],
    pub objects: &'a ObjectUniforms,
    pub object_group: u32,
}

impl DrawSink for PassSink<'_, '_> {
    fn draw(&mut self, command: &DrawCommand) {
        let (Some(mesh), Some(offset)) = (
            self.meshes.get(command.mesh.0),
            self.objects.offset(command.slot),
        ) else {
            return;
        };
        self.pass.set_vertex_buffer(0, mesh.vertex.slice(..));
        self.pass
            .set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
        self.pass
            .set_bind_group(self.object_group, &self.objects.bind_group, &[offset]);
        self.pass
            .draw_indexed(0..command.index_count.min(mesh.index_count), 0, 0..1);
    }
}
