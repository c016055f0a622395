//! Run Configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use windowing::WindowAnchor;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "TSWIN";

/// Options controlling one extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Worker threads; `None` uses the host's parallelism, 0 or 1 runs in the calling thread
    pub worker_count: Option<usize>,
    /// Abort on the first function failure instead of recording an absent result
    pub fail_fast: bool,
    /// Minimum present samples per window when a window spec sets none
    pub min_occupancy: usize,
    /// Which point of a window labels its result
    pub window_anchor: WindowAnchor,
    /// Silence the warning for duration windows over gapped sequences
    pub approve_sparsity: bool,
    /// Log progress every this many completed work items (0 disables)
    pub progress_every: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            fail_fast: false,
            min_occupancy: 1,
            window_anchor: WindowAnchor::End,
            approve_sparsity: false,
            progress_every: 0,
        }
    }
}

impl ExtractionConfig {
    /// Load from an optional file, overridden by `TSWIN_*` environment variables
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config: ExtractionConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_occupancy == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "min_occupancy",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Worker threads the run will use; 1 means sequential
    pub fn effective_workers(&self) -> usize {
        self.worker_count
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    /// Set the worker count
    pub fn with_worker_count(mut self, workers: Option<usize>) -> Self {
        self.worker_count = workers;
        self
    }

    /// Set the fail-fast policy
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the default minimum occupancy
    pub fn with_min_occupancy(mut self, count: usize) -> Self {
        self.min_occupancy = count;
        self
    }

    /// Set the result timestamp anchor
    pub fn with_window_anchor(mut self, anchor: WindowAnchor) -> Self {
        self.window_anchor = anchor;
        self
    }

    /// Silence sparsity warnings
    pub fn with_approve_sparsity(mut self, approve: bool) -> Self {
        self.approve_sparsity = approve;
        self
    }

    /// Set the progress logging interval
    pub fn with_progress_every(mut self, items: usize) -> Self {
        self.progress_every = items;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ExtractionConfig::default();
        assert_eq!(config.worker_count, None);
        assert!(!config.fail_fast);
        assert_eq!(config.min_occupancy, 1);
        assert_eq!(config.window_anchor, WindowAnchor::End);
        assert!(config.validate().is_ok());
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_sequential_worker_counts() {
        assert_eq!(ExtractionConfig::default().with_worker_count(Some(0)).effective_workers(), 1);
        assert_eq!(ExtractionConfig::default().with_worker_count(Some(1)).effective_workers(), 1);
        assert_eq!(ExtractionConfig::default().with_worker_count(Some(4)).effective_workers(), 4);
    }

    #[test]
    fn test_zero_occupancy_rejected() {
        let err = ExtractionConfig::default().with_min_occupancy(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { field: "min_occupancy", .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("tswin-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "worker_count = 2").unwrap();
        writeln!(file, "fail_fast = true").unwrap();
        writeln!(file, "window_anchor = \"begin\"").unwrap();
        drop(file);

        let config = ExtractionConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.worker_count, Some(2));
        assert!(config.fail_fast);
        assert_eq!(config.window_anchor, WindowAnchor::Begin);
        assert_eq!(config.min_occupancy, 1);
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = std::env::temp_dir().join(format!("tswin-env-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "progress_every = 5").unwrap();
        drop(file);

        std::env::set_var("TSWIN_PROGRESS_EVERY", "7");
        std::env::set_var("TSWIN_APPROVE_SPARSITY", "true");
        let config = ExtractionConfig::load(&path);
        std::env::remove_var("TSWIN_PROGRESS_EVERY");
        std::env::remove_var("TSWIN_APPROVE_SPARSITY");
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.progress_every, 7);
        assert!(config.approve_sparsity);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ExtractionConfig::load("/nonexistent/tswin.toml").unwrap();
        assert_eq!(config.min_occupancy, ExtractionConfig::default().min_occupancy);
    }
}
