//! Generation request handler.
//!
//! Takes one structured request through the full lifecycle: ensure the
//! output directory exists, derive the deterministic output path, acquire
//! the resource, render synchronously, return the artifact location.
//!
//! The handler is blocking — [`Generator::generate`] does not return
//! until the pipeline call completes. There is no queue, cancellation, or
//! timeout; a caller that wants responsiveness runs the call off its
//! interaction thread.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::ResourceConfig;
use crate::output;
use crate::pipeline::{GenerationParams, Pipeline, PipelineLoader, PromptPayload};
use crate::resource::ResourceManager;
use crate::{Error, Result};

/// One user-submitted generation job.
///
/// Constructed per call and consumed immediately — never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model configuration the resource should be built from.
    pub model: ResourceConfig,

    /// Lyrics and style tags.
    pub prompt: PromptPayload,

    /// Numeric generation parameters.
    pub params: GenerationParams,
}

/// The produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Path of the rendered audio file. Owned by the output directory
    /// from here on; the handler never deletes or mutates it.
    pub path: PathBuf,
}

/// Handles generation requests against one [`ResourceManager`].
pub struct Generator<L: PipelineLoader> {
    resources: ResourceManager<L>,
    output_dir: PathBuf,
}

impl<L: PipelineLoader> Generator<L> {
    /// Create a handler writing artifacts under [`output::OUTPUT_DIR`].
    pub fn new(resources: ResourceManager<L>) -> Self {
        Self::with_output_dir(resources, output::OUTPUT_DIR)
    }

    /// Create a handler writing artifacts under `output_dir`.
    pub fn with_output_dir(resources: ResourceManager<L>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resources,
            output_dir: output_dir.into(),
        }
    }

    /// Run one request to completion and return the artifact location.
    ///
    /// On success the file at the returned path exists and contains the
    /// pipeline's encoded output. Every failure is terminal for the
    /// request and propagates as-is — no retries. A partial file from a
    /// failed render is left in place; an identical retry derives the
    /// same name and overwrites it.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.generate_at(request, Local::now())
    }

    fn generate_at(
        &self,
        request: &GenerationRequest,
        at: DateTime<Local>,
    ) -> Result<GenerationResult> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::Storage(format!(
                "could not create output directory {}: {e}",
                self.output_dir.display()
            ))
        })?;

        let file_name = output::file_name(&request.prompt.lyrics, &request.prompt.tags, at);
        let path = self.output_dir.join(file_name);

        let resource = self.resources.acquire(&request.model)?;

        tracing::info!(
            output = %path.display(),
            max_audio_length_ms = request.params.max_audio_length_ms,
            topk = request.params.topk,
            "generating"
        );

        resource
            .pipeline()
            .render(&request.prompt, &request.params, &path)?;

        tracing::info!(output = %path.display(), "done");

        Ok(GenerationResult { path })
    }
}
