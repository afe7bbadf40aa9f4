//! The pipeline contract — the seam to the generative model runtime.
//!
//! The model is an external collaborator: it is constructed from a
//! (model location, device, dtype, version) configuration and exposes one
//! synchronous call that renders audio to a file. The control surface
//! never inspects its internal state, so tests substitute a fake that
//! writes a deterministic stub file.

use std::path::Path;

use candle_core::{DType, Device};
use serde::{Deserialize, Serialize};

use crate::config::ResourceConfig;
use crate::{Error, Result};

/// The prompt content of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptPayload {
    /// Lyrics text. May be empty for instrumental output.
    pub lyrics: String,

    /// Style tags, e.g. "pop, emotional, female vocal".
    pub tags: String,
}

/// Numeric generation parameters.
///
/// All four must be supplied; the handler applies no defaulting of its
/// own. `Default` carries the values the reference front end pre-fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum audio duration in milliseconds.
    pub max_audio_length_ms: u64,

    /// Sampling breadth (top-k).
    pub topk: usize,

    /// Sampling temperature.
    pub temperature: f64,

    /// Classifier-free guidance scale.
    pub cfg_scale: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_audio_length_ms: 240_000,
            topk: 50,
            temperature: 1.0,
            cfg_scale: 1.5,
        }
    }
}

impl GenerationParams {
    /// Check the parameters against the ranges the reference front end
    /// exposes. Interface layers call this before submitting;
    /// [`Generator::generate`](crate::generate::Generator::generate) does
    /// not — an out-of-range value that reaches the pipeline surfaces as
    /// [`Error::Generation`] from the render call itself.
    pub fn validate(&self) -> Result<()> {
        if !(10_000..=600_000).contains(&self.max_audio_length_ms) {
            return Err(Error::Generation(format!(
                "max_audio_length_ms must be between 10000 and 600000, got {}",
                self.max_audio_length_ms
            )));
        }
        if !(1..=200).contains(&self.topk) {
            return Err(Error::Generation(format!(
                "topk must be between 1 and 200, got {}",
                self.topk
            )));
        }
        if !(0.1..=2.0).contains(&self.temperature) {
            return Err(Error::Generation(format!(
                "temperature must be between 0.1 and 2.0, got {}",
                self.temperature
            )));
        }
        if !(0.1..=5.0).contains(&self.cfg_scale) {
            return Err(Error::Generation(format!(
                "cfg_scale must be between 0.1 and 5.0, got {}",
                self.cfg_scale
            )));
        }
        Ok(())
    }
}

/// A loaded pipeline able to render audio.
///
/// One synchronous operation: render the prompt with the given parameters
/// and persist the encoded audio at `save_path` as a side effect. Runs
/// inference-only — no training state is active during the call. The
/// implementation controls the actual encoding; the control surface names
/// files `.mp3`.
pub trait Pipeline: Send + Sync {
    fn render(
        &self,
        prompt: &PromptPayload,
        params: &GenerationParams,
        save_path: &Path,
    ) -> Result<()>;
}

/// Constructs a [`Pipeline`] from a configuration.
///
/// Injected into [`ResourceManager`](crate::resource::ResourceManager) so
/// first-use construction stays a black box. Loading may read weight
/// files from the configured location, allocate accelerator memory, and
/// take significant wall-clock time.
pub trait PipelineLoader: Send + Sync {
    type Pipeline: Pipeline;

    fn load(
        &self,
        config: &ResourceConfig,
        device: &Device,
        dtype: DType,
    ) -> Result<Self::Pipeline>;
}
