mod common;
mod lighting_pass;
mod resources;
pub mod shaders;
mod shadow_pass;

use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::app::FrameSnapshot;
use crate::geometry::GeometryStore;

pub use common::{CameraParams, LightParams};
pub use lighting_pass::LightingPass;
pub use shaders::{ShaderError, ShaderSources};
pub use shadow_pass::{ShadowPass, ShadowTarget};

use lighting_pass::DepthBuffer;
use resources::{MeshBuffers, ObjectUniforms};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("window has zero area")]
    ZeroSizedWindow,
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to acquire GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface has no supported format")]
    NoSurfaceFormat,
    #[error("shadow map target is incomplete: {0}")]
    ShadowTargetIncomplete(String),
}

/// Renderer settings fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct RendererOptions<'a> {
    pub shadow_resolution: u32,
    pub shader_dir: &'a Path,
    /// Number of per-instance uniform slots.
    pub max_instances: u32,
}

/// Owns the surface, the device and both passes.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    meshes: Vec<MeshBuffers>,
    objects: ObjectUniforms,
    shadow: ShadowPass,
    lighting: LightingPass,
}

impl Renderer {
    /// Initializes the GPU, uploads the geometry and builds both passes.
    ///
    /// Shader problems are logged and do not fail initialization.
    pub async fn new(
        window: Arc<Window>,
        store: &GeometryStore,
        options: RendererOptions<'_>,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(RenderError::ZeroSizedWindow);
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("renderer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            error!("GPU validation error: {err}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        info!("surface format {surface_format:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth = DepthBuffer::create(&device, config.width, config.height);

        let target = ShadowTarget::new(&device, &adapter, options.shadow_resolution).await?;

        let sources = ShaderSources::load(options.shader_dir);
        let depth_shader =
            shaders::compile_or_log(&device, shaders::DEPTH_SHADER, &sources.depth).await;
        let lighting_shader =
            shaders::compile_or_log(&device, shaders::LIGHTING_SHADER, &sources.lighting).await;

        let meshes = MeshBuffers::upload_all(&device, store);
        let objects = ObjectUniforms::new(&device, options.max_instances);
        let lighting = LightingPass::new(&device, &lighting_shader, surface_format, &objects, &target);
        let shadow = ShadowPass::new(&device, target, &depth_shader, &objects);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            meshes,
            objects,
            shadow,
            lighting,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn aspect(&self) -> f32 {
        if self.size.height == 0 {
            1.0
        } else {
            self.size.width as f32 / self.size.height as f32
        }
    }

    /// Reconfigures the surface and the window depth buffer. The shadow map is
    /// left untouched.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        log::debug!("resize to {}x{}", new_size.width, new_size.height);
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Renders the shadow pass then the lighting pass and presents.
    pub fn render(&mut self, frame: &FrameSnapshot) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.objects.write(&self.queue, frame.draws.commands());
        self.shadow.write(&self.queue, &frame.light);
        self.lighting.write(&self.queue, &frame.camera, &frame.light);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        self.shadow
            .record(&mut encoder, &frame.draws, &self.meshes, &self.objects);
        self.lighting.record(
            &mut encoder,
            &view,
            &self.depth,
            self.size,
            &frame.draws,
            &self.meshes,
            &self.objects,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }

    /// Releases GPU resources in dependency order and hands the window back.
    pub fn teardown(self) -> Arc<Window> {
        let Self {
            window,
            surface,
            device,
            queue,
            config: _,
            size: _,
            depth,
            meshes,
            objects,
            shadow,
            lighting,
        } = self;

        drop(lighting);
        info!("released lighting pass");
        drop(shadow);
        info!("released shadow pass and shadow map");
        drop(objects);
        drop(meshes);
        info!("released geometry buffers");
        drop(depth);
        drop(surface);
        drop(queue);
        drop(device);
        info!("released GPU device");
        window
    }
}
