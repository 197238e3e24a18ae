use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tempfile::Builder;
use tracing::info;

use crate::domain::DatasetName;
use crate::error::DisplayerError;
use crate::merge::AnnotatedTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: DatasetName,
    pub source: String,
    pub created_at: String,
    pub tool: String,
    pub table: AnnotatedTable,
}

impl Snapshot {
    pub fn new(name: DatasetName, source: &str, table: AnnotatedTable) -> Self {
        Self {
            name,
            source: source.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("gene-displayer/{}", env!("CARGO_PKG_VERSION")),
            table,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn snapshot_path(&self, name: &DatasetName) -> Utf8PathBuf {
        self.root.join(format!("{name}.json"))
    }

    pub fn csv_path(&self, name: &DatasetName) -> Utf8PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    pub fn ensure_root(&self) -> Result<(), DisplayerError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, name: &DatasetName) -> bool {
        self.snapshot_path(name).as_std_path().exists()
    }

    pub fn write_snapshot(
        &self,
        snapshot: &Snapshot,
        force: bool,
    ) -> Result<Utf8PathBuf, DisplayerError> {
        let path = self.snapshot_path(&snapshot.name);
        if !force && path.as_std_path().exists() {
            return Err(DisplayerError::DatasetExists(snapshot.name.to_string()));
        }
        let content = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(&path, &content)?;
        info!(dataset = snapshot.name.as_str(), path = path.as_str(), "stored dataset");
        Ok(path)
    }

    pub fn load(&self, name: &DatasetName) -> Result<Snapshot, DisplayerError> {
        let path = self.snapshot_path(name);
        if !path.as_std_path().exists() {
            return Err(DisplayerError::DatasetNotFound(name.to_string()));
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|err| DisplayerError::Filesystem(format!("{path}: {err}")))?;
        snapshot.table.check_shape(name.as_str())?;
        Ok(snapshot)
    }

    pub fn load_table(&self, name: &DatasetName) -> Result<AnnotatedTable, DisplayerError> {
        Ok(self.load(name)?.table)
    }

    pub fn list(&self) -> Result<Vec<DatasetName>, DisplayerError> {
        if !self.root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|err| DisplayerError::Filesystem(err.to_string()))?
                .path();
            let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
            if !path.is_file() || !is_json {
                continue;
            }
            if let Some(name) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<DatasetName>().ok())
            {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn export_csv(
        &self,
        name: &DatasetName,
        table: &AnnotatedTable,
    ) -> Result<Utf8PathBuf, DisplayerError> {
        let path = self.csv_path(name);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(table.header())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        for record in table.records() {
            writer
                .write_record(&record)
                .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        }
        let content = writer
            .into_inner()
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(&path, &content)?;
        Ok(path)
    }

    fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), DisplayerError> {
        let parent = path
            .parent()
            .ok_or_else(|| DisplayerError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".gene-displayer")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| DisplayerError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new(Utf8PathBuf::from("data"));
        let name: DatasetName = "GSE460_skin".parse().unwrap();
        assert!(store.snapshot_path(&name).ends_with("data/GSE460_skin.json"));
        assert!(store.csv_path(&name).ends_with("data/GSE460_skin.csv"));
    }
}
