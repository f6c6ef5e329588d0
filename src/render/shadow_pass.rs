//! Depth-only pass rendered from the light into the shadow map.

use bytemuck::bytes_of;
use log::info;

use crate::frame::DrawList;

use super::common::{LightParams, LightSpaceUniform};
use super::resources::{vertex_layout, MeshBuffers, ObjectUniforms, PassSink};
use super::RenderError;

const REQUIRED_USAGES: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING);

/// Rejects a shadow map that could not be both rendered to and sampled.
fn check_target(allowed: wgpu::TextureUsages, resolution: u32, max: u32) -> Result<(), RenderError> {
    if !allowed.contains(REQUIRED_USAGES) {
        return Err(RenderError::ShadowTargetIncomplete(format!(
            "{:?} does not support {REQUIRED_USAGES:?}",
            ShadowTarget::FORMAT
        )));
    }
    if resolution == 0 || resolution > max {
        return Err(RenderError::ShadowTargetIncomplete(format!(
            "resolution {resolution} outside 1..={max}"
        )));
    }
    Ok(())
}

/// Off-screen depth texture sampled by the lighting pass. Allocated once and
/// never resized.
pub struct ShadowTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    resolution: u32,
}

impl ShadowTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates the depth texture and checks that it can be both rendered to and
    /// sampled.
    pub async fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        resolution: u32,
    ) -> Result<Self, RenderError> {
        let allowed = adapter.get_texture_format_features(Self::FORMAT).allowed_usages;
        check_target(allowed, resolution, device.limits().max_texture_dimension_2d)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow-map"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: REQUIRED_USAGES,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Some(err) = device.pop_error_scope().await {
            return Err(RenderError::ShadowTargetIncomplete(err.to_string()));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        info!("shadow map {resolution}x{resolution} {:?}", Self::FORMAT);
        Ok(Self {
            _texture: texture,
            view,
            sampler,
            resolution,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

pub struct ShadowPass {
    target: ShadowTarget,
    pipeline: wgpu::RenderPipeline,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
}

impl ShadowPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        target: ShadowTarget,
        shader: &wgpu::ShaderModule,
        objects: &ObjectUniforms,
    ) -> Self {
        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-light-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<LightSpaceUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow-light-uniform"),
            size: std::mem::size_of::<LightSpaceUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow-light-bind-group"),
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&light_layout, objects.layout()],
            push_constant_ranges: &[],
        });
        // No fragment stage: only depth is written.
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: ShadowTarget::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            multiview: None,
            cache: None,
        });

        Self {
            target,
            pipeline,
            light_buffer,
            light_bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, light: &LightParams) {
        queue.write_buffer(&self.light_buffer, 0, bytes_of(&LightSpaceUniform::new(light)));
    }

    pub(crate) fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draws: &DrawList,
        meshes: &[MeshBuffers],
        objects: &ObjectUniforms,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow-pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.target.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let size = self.target.resolution as f32;
        pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.light_bind_group, &[]);
        draws.replay(&mut PassSink {
            pass: &mut pass,
            meshes,
            objects,
            object_group: 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 8192;

    fn assert_incomplete(result: Result<(), RenderError>) {
        assert!(
            matches!(result, Err(RenderError::ShadowTargetIncomplete(_))),
            "{result:?}"
        );
    }

    #[test]
    fn accepts_a_usable_target() {
        assert!(check_target(REQUIRED_USAGES, 1024, MAX).is_ok());
        assert!(check_target(wgpu::TextureUsages::all(), MAX, MAX).is_ok());
    }

    #[test]
    fn zero_resolution_is_incomplete() {
        assert_incomplete(check_target(REQUIRED_USAGES, 0, MAX));
    }

    #[test]
    fn resolution_over_the_limit_is_incomplete() {
        assert_incomplete(check_target(REQUIRED_USAGES, MAX + 1, MAX));
    }

    #[test]
    fn format_that_cannot_be_sampled_is_incomplete() {
        let result = check_target(wgpu::TextureUsages::RENDER_ATTACHMENT, 1024, MAX);
        assert_incomplete(result);
    }
}
