//! Directional-light shadow mapping demo.

pub mod app;
pub mod camera;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod light;
pub mod render;
pub mod scene;
pub mod shading;
pub mod shadow;

pub use app::{FrameClock, FrameSnapshot, FrameState};
pub use camera::{CameraController, CameraInput, CameraState, Projection};
pub use config::DemoConfig;
pub use frame::{DrawCommand, DrawList, DrawSink};
pub use geometry::{GeometryStore, Mesh, MeshId, Vertex};
pub use input::{InputState, MoveKey};
pub use light::{DirectionalLight, LightError, LightSpace, OrthoBounds};
pub use render::{CameraParams, LightParams, RenderError, Renderer};
pub use scene::{Instance, InstanceDescriptor, SceneGraph, TransformStep};
pub use shadow::{DepthImage, FAR_DEPTH};
pub use shading::{shade, LightingTerms, SurfacePoint};
