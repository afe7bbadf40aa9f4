//! Resource configuration and compute selection.
//!
//! The model location and version arrive as explicit request fields — the
//! crate reads no environment variables or config files. The compute
//! device and numeric precision are chosen from the environment at
//! acquisition time: CUDA with BF16 weights when accelerator hardware is
//! present, otherwise CPU with F32.

use std::path::PathBuf;

use candle_core::{DType, Device};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration a [`GenerationResource`](crate::resource::GenerationResource)
/// is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Filesystem location of the pretrained model.
    pub model_path: PathBuf,

    /// Model version identifier, e.g. "3B".
    pub version: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            version: "3B".to_string(),
        }
    }
}

impl ResourceConfig {
    /// Check that the configuration points at a readable model location.
    ///
    /// Version compatibility beyond non-emptiness is the loader's concern —
    /// the loader sees the full model directory and this check does not.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::ResourceLoad("model version is empty".into()));
        }
        if !self.model_path.exists() {
            return Err(Error::ResourceLoad(format!(
                "model path {} does not exist",
                self.model_path.display()
            )));
        }
        Ok(())
    }
}

/// Return the preferred device: CUDA if available, otherwise CPU.
pub fn preferred_device(cuda_ordinal: usize) -> Device {
    Device::cuda_if_available(cuda_ordinal).unwrap_or(Device::Cpu)
}

/// Return the preferred weight dtype for a device: BF16 on CUDA, F32 on CPU.
pub fn preferred_dtype(device: &Device) -> DType {
    if matches!(device, Device::Cuda(_)) {
        DType::BF16
    } else {
        DType::F32
    }
}
