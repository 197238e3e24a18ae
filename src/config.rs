use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::annotation::{AnnotationSettings, MAX_BATCH_SIZE};
use crate::error::DisplayerError;
use crate::format::SeriesFormat;

pub const DEFAULT_CONFIG_FILE: &str = "gene-displayer.json";
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub annotation: AnnotationEntry,
    #[serde(default)]
    pub format: FormatEntry,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AnnotationEntry {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
    #[serde(default)]
    pub species: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FormatEntry {
    #[serde(default)]
    pub title_marker: Option<String>,
    #[serde(default)]
    pub comment_markers: Option<Vec<String>>,
    #[serde(default)]
    pub index_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_dir: Utf8PathBuf,
    pub annotation: AnnotationSettings,
    pub format: SeriesFormat,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            data_dir: Utf8PathBuf::from(DEFAULT_DATA_DIR),
            annotation: AnnotationSettings::default(),
            format: SeriesFormat::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DisplayerError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DisplayerError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DisplayerError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DisplayerError> {
        let defaults = ResolvedConfig::default();
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(DisplayerError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let entry = config.annotation;
        let batch_size = entry.batch_size.unwrap_or(defaults.annotation.batch_size);
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(DisplayerError::ConfigParse(format!(
                "annotation.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
            )));
        }
        let workers = entry.workers.unwrap_or(defaults.annotation.workers);
        if workers == 0 {
            return Err(DisplayerError::ConfigParse(
                "annotation.workers must be at least 1".to_string(),
            ));
        }
        let annotation = AnnotationSettings {
            endpoint: entry.endpoint.unwrap_or(defaults.annotation.endpoint),
            batch_size,
            workers,
            timeout_secs: entry.timeout_secs.unwrap_or(defaults.annotation.timeout_secs),
            max_retries: entry.max_retries.unwrap_or(defaults.annotation.max_retries),
            species: entry.species.or(defaults.annotation.species),
        };

        let mut format = defaults.format;
        if let Some(marker) = config.format.title_marker {
            format.title_marker = marker;
        }
        if let Some(markers) = config.format.comment_markers {
            format.comment_markers = markers;
        }
        if let Some(label) = config.format.index_label {
            format.index_label = label;
        }

        Ok(ResolvedConfig {
            schema_version,
            data_dir: config
                .data_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.data_dir),
            annotation,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.data_dir.as_str(), "data");
        assert_eq!(resolved.annotation, AnnotationSettings::default());
        assert_eq!(resolved.format, SeriesFormat::default());
    }
}
