use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{debug, info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use shadow_mapping::render::RendererOptions;
use shadow_mapping::{
    CameraInput, DemoConfig, FrameClock, FrameState, InputState, MoveKey, Renderer,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = DemoConfig::from_env();
    let frame = FrameState::new(&config).context("invalid light configuration")?;

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let mut app = DemoApp {
        config,
        frame: Some(frame),
        running: None,
        last_error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    if let Some(running) = app.running.take() {
        running.shutdown();
    }
    if let Some(err) = app.last_error {
        return Err(err);
    }
    Ok(())
}

struct DemoApp {
    config: DemoConfig,
    /// Held until the window exists, then moved into [`Running`].
    frame: Option<FrameState>,
    running: Option<Running>,
    last_error: Option<anyhow::Error>,
}

struct Running {
    renderer: Renderer,
    frame: FrameState,
    input: InputState,
    clock: FrameClock,
}

impl DemoApp {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let window = self.config.window.clone();
        let attributes = Window::default_attributes()
            .with_title(window.title)
            .with_inner_size(LogicalSize::new(window.width, window.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        window.set_cursor_visible(false);

        let frame = self
            .frame
            .take()
            .ok_or_else(|| anyhow!("frame state already consumed"))?;
        let options = RendererOptions {
            shadow_resolution: self.config.shadow.resolution,
            shader_dir: &self.config.shadow.shader_dir,
            max_instances: frame.scene().len() as u32,
        };
        let renderer = block_on(Renderer::new(Arc::clone(&window), frame.store(), options))
            .context("failed to initialize renderer")?;

        let mut running = Running {
            renderer,
            frame,
            input: InputState::new(),
            clock: FrameClock::start(),
        };
        running.recenter_cursor();
        Ok(running)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Poll);
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if window_id != running.renderer.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => running.renderer.resize(size),
            WindowEvent::Focused(false) => running.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => running.handle_key(&event),
            WindowEvent::CursorMoved { position, .. } => {
                running
                    .input
                    .set_cursor_position(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = running.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_ref() {
            running.renderer.window().request_redraw();
        }
    }
}

impl Running {
    fn window_centre(&self) -> Vec2 {
        let size = self.renderer.size();
        Vec2::new(size.width as f32, size.height as f32) * 0.5
    }

    /// Moves the cursor back to the window centre, or re-anchors on the
    /// current cursor when the platform does not allow it.
    fn recenter_cursor(&mut self) {
        let centre = self.window_centre();
        let target = PhysicalPosition::new(f64::from(centre.x), f64::from(centre.y));
        if let Err(err) = self.renderer.window().set_cursor_position(target) {
            debug!("cursor warp unsupported: {err}");
            self.input.cursor_warp_failed();
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = MoveKey::from_keycode(code) else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.input.set_key_down(key),
            ElementState::Released => self.input.set_key_up(key),
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let dt = self.clock.tick();
        let input = CameraInput {
            cursor_delta: self.input.take_cursor_delta(self.window_centre()),
            keys: self.input.move_keys(),
        };
        self.recenter_cursor();

        let snapshot = self.frame.advance(&input, dt, self.renderer.aspect());
        match self.renderer.render(&snapshot) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.renderer.window().inner_size();
                self.renderer.resize(size);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(err) => warn!("skipping frame: {err}"),
        }
        Ok(())
    }

    fn shutdown(self) {
        let Running { renderer, .. } = self;
        let window = renderer.teardown();
        drop(window);
        info!("closed window");
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}
