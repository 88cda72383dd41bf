use crate::error::{ConfigError, Result};
use crate::providers::{ConfigSource, ENV_SEPARATOR};
use crate::validation::ValidateConfig;
use config::{Config, Environment, File};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

/// Layered configuration loader
///
/// Layers, lowest precedence first: `T::default()`, then each added source
/// in the order given. The merged result is deserialized and validated.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub fn load<T>(&self) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default + ValidateConfig,
    {
        let defaults = T::default();
        let mut builder = Config::builder().add_source(Config::try_from(&defaults)?);

        for source in &self.sources {
            builder = match source {
                ConfigSource::File { path, required } => {
                    if *required && !path.exists() {
                        return Err(ConfigError::SourceNotFound(path.clone()));
                    }
                    debug!(path = %path.display(), required, "adding configuration file");
                    builder.add_source(File::from(path.as_path()).required(*required))
                }
                ConfigSource::Environment { prefix } => {
                    debug!(prefix = %prefix, "adding environment configuration");
                    builder.add_source(
                        Environment::with_prefix(prefix)
                            .prefix_separator(ENV_SEPARATOR)
                            .separator(ENV_SEPARATOR)
                            .try_parsing(true),
                    )
                }
            };
        }

        let loaded: T = builder.build()?.try_deserialize()?;
        loaded.validate().map_err(ConfigError::ValidationError)?;

        info!(sources = self.sources.len(), "configuration loaded");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Violations;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thresholds {
        low: f64,
        high: f64,
        label: String,
    }

    impl Default for Thresholds {
        fn default() -> Self {
            Self { low: 0.6, high: 0.8, label: "default".into() }
        }
    }

    impl ValidateConfig for Thresholds {
        fn validate(&self) -> std::result::Result<(), Vec<String>> {
            let mut v = Violations::new();
            v.check(self.low < self.high, || format!("low {} must be below high {}", self.low, self.high));
            v.finish()
        }
    }

    #[test]
    fn defaults_only() {
        let loaded: Thresholds = ConfigLoader::new().load().unwrap();
        assert_eq!(loaded, Thresholds::default());
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "high: 0.9\nlabel: tuned").unwrap();

        let loaded: Thresholds = ConfigLoader::new()
            .add_source(ConfigSource::file(file.path()))
            .load()
            .unwrap();
        assert_eq!(loaded.low, 0.6);
        assert_eq!(loaded.high, 0.9);
        assert_eq!(loaded.label, "tuned");
    }

    #[test]
    fn missing_required_file_is_reported() {
        let err = ConfigLoader::new()
            .add_source(ConfigSource::file("/nonexistent/claimguard.yaml"))
            .load::<Thresholds>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotFound(_)));
    }

    #[test]
    fn missing_optional_file_is_skipped() {
        let loaded: Thresholds = ConfigLoader::new()
            .add_source(ConfigSource::optional_file("/nonexistent/claimguard.yaml"))
            .load()
            .unwrap();
        assert_eq!(loaded, Thresholds::default());
    }

    #[test]
    fn invariant_violations_fail_loading() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "low: 0.95").unwrap();

        let err = ConfigLoader::new()
            .add_source(ConfigSource::file(file.path()))
            .load::<Thresholds>()
            .unwrap_err();
        match err {
            ConfigError::ValidationError(msgs) => assert_eq!(msgs.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
