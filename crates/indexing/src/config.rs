use crate::{IndexingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackerConfig {
    /// Re-resolve non-delete targets against the session before hand-off.
    pub refresh_on_flush: bool,
    /// Bound of the asynchronous hand-off queue.
    pub queue_capacity: usize,
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self {
            refresh_on_flush: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl StackerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(IndexingError::Config(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = StackerConfig::from_toml_str("").expect("config");
        assert_eq!(config, StackerConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = StackerConfig::from_toml_str("refresh_on_flush = false").expect("config");
        assert!(!config.refresh_on_flush);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = StackerConfig::from_toml_str("queue_capacity = 0").expect_err("invalid");
        assert!(matches!(err, IndexingError::Config(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = StackerConfig::from_toml_str("queue_size = 3").expect_err("unknown key");
        assert!(matches!(err, IndexingError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp");
        writeln!(file, "queue_capacity = 8").expect("write");
        let config = StackerConfig::load(file.path()).expect("load");
        assert_eq!(config.queue_capacity, 8);
        assert!(config.refresh_on_flush);
    }
}
