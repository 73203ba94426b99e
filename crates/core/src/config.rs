//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services as `Arc<CoreConfig>`. The intent is to avoid reading
//! process-wide environment variables during request handling, which can
//! lead to inconsistent behaviour in multi-threaded runtimes and test
//! harnesses.

use crate::{VitalsError, VitalsResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    /// Returns `VitalsError::DatasetMissing` if `data_file` does not exist or
    /// is not a regular file, so that a misconfigured service fails before it
    /// starts serving.
    pub fn new(data_file: PathBuf) -> VitalsResult<Self> {
        if !data_file.is_file() {
            return Err(VitalsError::DatasetMissing(data_file));
        }
        Ok(Self { data_file })
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nowhere.jsonl");

        let cfg = CoreConfig::new(missing.clone());
        assert!(matches!(cfg, Err(VitalsError::DatasetMissing(p)) if p == missing));
    }

    #[test]
    fn test_config_accepts_regular_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("patients.jsonl");
        std::fs::write(&file, "{}\n").unwrap();

        let cfg = CoreConfig::new(file.clone()).unwrap();
        assert_eq!(cfg.data_file(), file.as_path());
    }
}
