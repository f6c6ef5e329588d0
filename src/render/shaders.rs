use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

pub const DEPTH_SHADER: &str = "depth.wgsl";
pub const LIGHTING_SHADER: &str = "lighting.wgsl";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader {} is empty", path.display())]
    Empty { path: PathBuf },
    #[error("shader {label} failed to compile: {message}")]
    Compile { label: String, message: String },
}

pub fn read_shader_source(path: &Path) -> Result<String, ShaderError> {
    let source = fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if source.trim().is_empty() {
        return Err(ShaderError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(source)
}

/// WGSL text of both passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderSources {
    pub depth: String,
    pub lighting: String,
}

impl ShaderSources {
    pub fn try_load(dir: &Path) -> Result<Self, ShaderError> {
        Ok(Self {
            depth: read_shader_source(&dir.join(DEPTH_SHADER))?,
            lighting: read_shader_source(&dir.join(LIGHTING_SHADER))?,
        })
    }

    /// Loads both files, logging failures and leaving the failed source empty.
    ///
    /// An empty source compiles into an invalid module; the demo keeps running
    /// with undefined output in that case.
    pub fn load(dir: &Path) -> Self {
        info!("loading shaders from {}", dir.display());
        Self {
            depth: read_or_log(&dir.join(DEPTH_SHADER)),
            lighting: read_or_log(&dir.join(LIGHTING_SHADER)),
        }
    }
}

fn read_or_log(path: &Path) -> String {
    read_shader_source(path).unwrap_or_else(|err| {
        error!("{err}");
        String::new()
    })
}

/// Compiles WGSL, reporting validation failures instead of raising them
/// through the device's error handler.
pub async fn compile_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> (wgpu::ShaderModule, Option<ShaderError>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let failure = device
        .pop_error_scope()
        .await
        .map(|err| ShaderError::Compile {
            label: label.to_string(),
            message: err.to_string(),
        });
    (module, failure)
}

/// [`compile_module`] that logs the failure and hands back the module anyway.
pub async fn compile_or_log(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    let (module, failure) = compile_module(device, label, source).await;
    if let Some(err) = failure {
        error!("{err}");
    }
    module
}
