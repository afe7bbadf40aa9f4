//! Resource manager — lazy, one-shot acquisition of the loaded pipeline.
//!
//! The manager owns the one-per-process [`GenerationResource`]. The
//! resource is built on the first [`acquire`](ResourceManager::acquire)
//! and retained for the life of the process; construction is guarded by
//! a one-shot cell, so concurrent first calls cannot double-construct or
//! observe a partially built resource. Later calls return the retained
//! instance even when their configuration differs — the mismatch is
//! logged, not honored.
//!
//! # Example
//!
//! ```no_run
//! use heartmula_rs::config::ResourceConfig;
//! use heartmula_rs::resource::ResourceManager;
//! # use std::path::Path;
//! # use candle_core::{DType, Device};
//! # use heartmula_rs::pipeline::{GenerationParams, Pipeline, PipelineLoader, PromptPayload};
//! # struct Stub;
//! # impl Pipeline for Stub {
//! #     fn render(&self, _: &PromptPayload, _: &GenerationParams, _: &Path) -> heartmula_rs::Result<()> { Ok(()) }
//! # }
//! # struct StubLoader;
//! # impl PipelineLoader for StubLoader {
//! #     type Pipeline = Stub;
//! #     fn load(&self, _: &ResourceConfig, _: &Device, _: DType) -> heartmula_rs::Result<Stub> { Ok(Stub) }
//! # }
//!
//! let manager = ResourceManager::new(StubLoader);
//! let config = ResourceConfig {
//!     model_path: "/models/heartmula".into(),
//!     version: "3B".into(),
//! };
//! let resource = manager.acquire(&config).unwrap();
//! ```

use std::sync::Arc;

use candle_core::{DType, Device};
use once_cell::sync::OnceCell;

use crate::config::{preferred_device, preferred_dtype, ResourceConfig};
use crate::pipeline::PipelineLoader;
use crate::Result;

/// The loaded, ready-to-use generative pipeline and the configuration it
/// was built from.
///
/// Immutable once constructed — a new configuration requires a new
/// instance, never in-place mutation. Held behind [`Arc`] for the life of
/// the process; cleanup, if ever needed, is at process exit.
#[derive(Debug)]
pub struct GenerationResource<P> {
    config: ResourceConfig,
    device: Device,
    dtype: DType,
    pipeline: P,
}

impl<P> GenerationResource<P> {
    /// Configuration this resource was built from.
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Compute device the pipeline runs on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Numeric precision of the pipeline weights.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// The underlying pipeline handle.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

/// Owns the lifecycle of the one-per-process [`GenerationResource`].
pub struct ResourceManager<L: PipelineLoader> {
    loader: L,
    cuda_ordinal: usize,
    cell: OnceCell<Arc<GenerationResource<L::Pipeline>>>,
}

impl<L: PipelineLoader> ResourceManager<L> {
    /// Create a manager that builds the resource with `loader` on first use.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cuda_ordinal: 0,
            cell: OnceCell::new(),
        }
    }

    /// Select a CUDA device ordinal for when accelerator hardware is present.
    pub fn with_cuda_ordinal(mut self, ordinal: usize) -> Self {
        self.cuda_ordinal = ordinal;
        self
    }

    /// Return the process-wide resource, constructing it on first call.
    ///
    /// The first successful call validates `config`, selects the device
    /// and dtype from the environment, and runs the loader — which may
    /// read weight files and take significant wall-clock time. A failed
    /// construction caches nothing, so the next call retries. Every later
    /// call returns the retained instance; a differing `config` is
    /// reported with a warning and otherwise ignored.
    pub fn acquire(&self, config: &ResourceConfig) -> Result<Arc<GenerationResource<L::Pipeline>>> {
        let resource = self.cell.get_or_try_init(|| {
            config.validate()?;
            let device = preferred_device(self.cuda_ordinal);
            let dtype = preferred_dtype(&device);
            tracing::info!(
                model_path = %config.model_path.display(),
                version = %config.version,
                device = ?device,
                dtype = ?dtype,
                "loading pipeline"
            );
            let pipeline = self.loader.load(config, &device, dtype)?;
            Ok(Arc::new(GenerationResource {
                config: config.clone(),
                device,
                dtype,
                pipeline,
            }))
        })?;

        if resource.config != *config {
            tracing::warn!(
                loaded_path = %resource.config.model_path.display(),
                loaded_version = %resource.config.version,
                requested_path = %config.model_path.display(),
                requested_version = %config.version,
                "pipeline already loaded with a different configuration — returning the loaded one"
            );
        }

        Ok(Arc::clone(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{GenerationParams, Pipeline, PromptPayload};
    use crate::Error;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct NullPipeline;

    impl Pipeline for NullPipeline {
        fn render(
            &self,
            _prompt: &PromptPayload,
            _params: &GenerationParams,
            _save_path: &Path,
        ) -> Result<()> {
            Ok(())
        }
    }

    /// Counts loads; fails the first `fail_first` of them.
    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl CountingLoader {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: 0,
            }
        }

        fn failing_once() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: 1,
            }
        }
    }

    impl PipelineLoader for CountingLoader {
        type Pipeline = NullPipeline;

        fn load(
            &self,
            _config: &ResourceConfig,
            _device: &Device,
            _dtype: DType,
        ) -> Result<NullPipeline> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(Error::ResourceLoad("weights are corrupt".into()));
            }
            Ok(NullPipeline)
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> ResourceConfig {
        ResourceConfig {
            model_path: dir.path().to_path_buf(),
            version: "3B".to_string(),
        }
    }

    #[test]
    fn test_acquire_constructs_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(CountingLoader::new());
        let config = config_in(&dir);

        let first = manager.acquire(&config).unwrap();
        let second = manager.acquire(&config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(CountingLoader::failing_once());
        let config = config_in(&dir);

        let err = manager.acquire(&config).unwrap_err();
        assert!(matches!(err, Error::ResourceLoad(_)));

        // The retry runs the loader again and succeeds.
        let resource = manager.acquire(&config).unwrap();
        assert_eq!(resource.config(), &config);
        assert_eq!(manager.loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unreadable_location_fails_before_loading() {
        let manager = ResourceManager::new(CountingLoader::new());
        let config = ResourceConfig {
            model_path: "/nonexistent/heartmula-model".into(),
            version: "3B".to_string(),
        };

        let err = manager.acquire(&config).unwrap_err();
        assert!(matches!(err, Error::ResourceLoad(_)));
        assert_eq!(manager.loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_changed_config_returns_loaded_resource() {
        let dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(CountingLoader::new());
        let config = config_in(&dir);

        let first = manager.acquire(&config).unwrap();

        let changed = ResourceConfig {
            model_path: other_dir.path().to_path_buf(),
            version: "7B".to_string(),
        };
        let second = manager.acquire(&changed).unwrap();

        // Still the original resource, built once from the first config.
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config(), &config);
        assert_eq!(manager.loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resource_records_compute_selection() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(CountingLoader::new());
        let resource = manager.acquire(&config_in(&dir)).unwrap();

        assert_eq!(resource.dtype(), preferred_dtype(resource.device()));
    }
}
