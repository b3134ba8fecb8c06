//! Pass configuration.
//!
//! Pass count and hop budget are explicit parameters so they can be tuned to
//! image size and expected chain length. The defaults (11 generations, 6 hops)
//! flatten typical marker-sized blobs; long thin structures may need more.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the per-pixel work of one pass is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// Row-major sweep on the calling thread.
    Sequential,
    /// Rows split across a rayon pool, merges through atomic minimum.
    #[default]
    Parallel,
}

/// Configuration of a full labeling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelConfig {
    /// Number of generations, generation 0 included. `pass_count - 1`
    /// propagation passes run after preparation.
    pub pass_count: usize,
    /// Pointer-jumping hops per pixel per pass.
    pub hop_budget: usize,
    pub execution: Execution,
    /// Worker threads for [`Execution::Parallel`]. `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Stop once a pass leaves every label unchanged.
    ///
    /// Later passes could not change anything either, so the result is the
    /// same as running all passes.
    pub stop_when_stable: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            pass_count: 11,
            hop_budget: 6,
            execution: Execution::default(),
            threads: None,
            stop_when_stable: false,
        }
    }
}

impl LabelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pass_count == 0 {
            return Err(Error::InvalidConfig(
                "pass_count must be at least 1 (generation 0)".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig(
                "threads must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of propagation passes after preparation.
    #[inline]
    pub fn propagation_passes(&self) -> usize {
        self.pass_count.saturating_sub(1)
    }

    /// Loads and validates a configuration file, YAML or JSON by extension.
    /// Missing fields take their default values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = format.parse(&text, path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::UnsupportedConfigFormat {
                path: path.to_path_buf(),
            })?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(Error::UnsupportedConfigFormat {
                path: path.to_path_buf(),
            })
        }
    }

    /// Parses `text` without validating it. `path` is only used for error messages.
    pub fn parse(self, text: &str, path: &Path) -> Result<LabelConfig> {
        match self {
            Self::Yaml => serde_yml::from_str(text).map_err(|source| Error::ConfigYaml {
                path: path.to_path_buf(),
                source,
            }),
            Self::Json => serde_json::from_str(text).map_err(|source| Error::ConfigJson {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LabelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pass_count, 11);
        assert_eq!(config.hop_budget, 6);
        assert_eq!(config.propagation_passes(), 10);
        assert_eq!(config.execution, Execution::Parallel);
    }

    #[test]
    fn test_zero_pass_count_is_invalid() {
        let config = LabelConfig {
            pass_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_threads_is_invalid() {
        let config = LabelConfig {
            threads: Some(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_hop_budget_is_valid() {
        let config = LabelConfig {
            hop_budget: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/passes.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("passes.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("passes.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("passes.toml")),
            Err(Error::UnsupportedConfigFormat { .. })
        ));
        assert!(ConfigFormat::from_path(Path::new("passes")).is_err());
    }

    #[test]
    fn test_parse_yaml_with_defaults() {
        let yaml = "pass_count: 20\nexecution: sequential\n";
        let config = ConfigFormat::Yaml
            .parse(yaml, Path::new("passes.yaml"))
            .unwrap();
        assert_eq!(config.pass_count, 20);
        assert_eq!(config.hop_budget, 6);
        assert_eq!(config.execution, Execution::Sequential);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{ "hop_budget": 2, "threads": 3, "stop_when_stable": true }"#;
        let config = ConfigFormat::Json
            .parse(json, Path::new("passes.json"))
            .unwrap();
        assert_eq!(config.pass_count, 11);
        assert_eq!(config.hop_budget, 2);
        assert_eq!(config.threads, Some(3));
        assert!(config.stop_when_stable);
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let err = ConfigFormat::Json
            .parse(r#"{ "passes": 3 }"#, Path::new("bad.json"))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigJson { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_from_file_missing() {
        let path = std::env::temp_dir().join("ccl_config_does_not_exist.yaml");
        assert!(matches!(
            LabelConfig::from_file(&path),
            Err(Error::ConfigRead { .. })
        ));
    }

    #[test]
    fn test_from_file_validates() {
        let path = std::env::temp_dir().join(format!(
            "ccl_config_invalid_{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "pass_count: 0\n").unwrap();
        let result = LabelConfig::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
