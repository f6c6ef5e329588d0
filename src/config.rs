use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::camera::{CameraController, CameraState, Projection};
use crate::light::DirectionalLight;

/// Environment variable overriding [`ShadowConfig::shader_dir`].
pub const SHADER_DIR_ENV: &str = "SHADOW_MAPPING_SHADER_DIR";

/// Directory holding `depth.wgsl` and `lighting.wgsl` when no override is set.
pub const DEFAULT_SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Shadow Mapping".to_string(),
            width: 800,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CameraConfig {
    pub start: CameraState,
    pub controller: CameraController,
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Side of the square shadow map, in texels.
    pub resolution: u32,
    pub shader_dir: PathBuf,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            shader_dir: PathBuf::from(DEFAULT_SHADER_DIR),
        }
    }
}

/// Everything the demo needs before the first frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub shadow: ShadowConfig,
    pub light: DirectionalLight,
}

impl DemoConfig {
    /// Defaults with the shader directory taken from the environment, if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env::var_os(SHADER_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.shadow.shader_dir = PathBuf::from(dir);
        }
        config
    }
}
