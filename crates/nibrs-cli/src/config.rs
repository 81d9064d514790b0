//! Command-line configuration file

use anyhow::{Context, Result};
use nibrs_catalog::{Catalog, CatalogLoader};
use nibrs_flatfile::DecoderConfig;
use nibrs_pipeline::PipelineConfig;
use nibrs_validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Error-report settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Name recorded as the source of every error; the input path otherwise
    pub source_name: Option<String>,
}

/// Settings read from `--config`, every section optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub decoder: DecoderConfig,
    pub validation: ValidationConfig,
    pub pipeline: PipelineConfig,
    /// Catalog overlay merged over the built-in catalog
    pub catalog: Option<PathBuf>,
    pub report: ReportConfig,
}

impl CliConfig {
    /// Read a YAML or JSON file, chosen by extension.
    ///
    /// A relative catalog path is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON config {}", path.display()))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML config {}", path.display()))?,
        };

        if let (Some(catalog), Some(dir)) = (&config.catalog, path.parent()) {
            if catalog.is_relative() {
                config.catalog = Some(dir.join(catalog));
            }
        }
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// The built-in catalog, with the configured overlay applied.
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        match &self.catalog {
            Some(path) => CatalogLoader::new()
                .load(path)
                .with_context(|| format!("failed to load catalog {}", path.display())),
            None => Ok(Arc::new(Catalog::builtin())),
        }
    }

    /// Decoder settings for one input file.
    pub fn decoder_for(&self, input: &Path) -> DecoderConfig {
        let name = self
            .report
            .source_name
            .clone()
            .unwrap_or_else(|| input.display().to_string());
        self.decoder.clone().with_source_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: CliConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.pipeline.max_concurrency, 4);
    }

    #[test]
    fn test_load_yaml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nibrs.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "validation:\n  suppressed_codes: [\"015\"]\npipeline:\n  max_concurrency: 2\ncatalog: overlay.yaml\nreport:\n  source_name: june.txt"
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert!(config.validation.suppressed_codes.contains("015"));
        assert_eq!(config.pipeline.max_concurrency, 2);
        assert_eq!(config.catalog, Some(dir.path().join("overlay.yaml")));
        assert_eq!(
            config.decoder_for(Path::new("input.txt")).source_name,
            "june.txt"
        );
    }

    #[test]
    fn test_source_name_defaults_to_input() {
        let config = CliConfig::default();
        assert_eq!(
            config.decoder_for(Path::new("data/input.txt")).source_name,
            "data/input.txt"
        );
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let config = CliConfig {
            catalog: Some(PathBuf::from("/nonexistent/catalog.yaml")),
            ..CliConfig::default()
        };
        assert!(config.catalog().is_err());
    }
}
