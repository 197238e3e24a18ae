use std::path::PathBuf;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::info;

use crate::annotation::{AnnotationClient, Annotator};
use crate::compare::{Assembled, ComparisonAssembler};
use crate::domain::{DatasetName, GeneSelection, ReplicateMode, SampleType};
use crate::error::DisplayerError;
use crate::merge::{AnnotatedTable, MergeReport, TableMerger};
use crate::parser::{SeriesParser, read_series_file};
use crate::reshape::{ReplicateReshaper, ReshapedTable};
use crate::select::DatasetSelector;
use crate::store::{Snapshot, Store};

#[derive(Debug, Clone)]
pub struct AnnotateRequest {
    pub input: PathBuf,
    pub name: Option<DatasetName>,
    pub sample_types: Vec<SampleType>,
    pub csv: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotateResult {
    pub source: String,
    pub report: MergeReport,
    pub datasets: Vec<StoredDataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredDataset {
    pub name: DatasetName,
    pub genes: usize,
    pub columns: usize,
    pub path: Utf8PathBuf,
    pub csv_path: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub datasets: Vec<DatasetName>,
    pub genes: GeneSelection,
    pub replicate: ReplicateMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewResult {
    pub replicate: ReplicateMode,
    pub reshaped: Vec<ReshapedTable>,
    pub assembled: Assembled,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub datasets: Vec<ListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub name: DatasetName,
    pub source: String,
    pub created_at: String,
    pub genes: usize,
    pub columns: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: AnnotationClient> {
    store: Store,
    parser: SeriesParser,
    annotator: Annotator<C>,
}

impl<C: AnnotationClient> App<C> {
    pub fn new(store: Store, parser: SeriesParser, annotator: Annotator<C>) -> Self {
        Self {
            store,
            parser,
            annotator,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn annotate_text(
        &self,
        source_name: &str,
        text: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(AnnotatedTable, MergeReport), DisplayerError> {
        let started = Instant::now();
        let raw = self.parser.parse(source_name, text)?;
        sink.event(ProgressEvent {
            message: format!("phase=Parse; {} probes, {} samples", raw.len(), raw.columns.len()),
            elapsed: Some(started.elapsed()),
        });

        let annotations = self.annotator.annotate(&raw.probe_ids())?;
        sink.event(ProgressEvent {
            message: format!("phase=Annotate; {} probes resolved", annotations.len()),
            elapsed: Some(started.elapsed()),
        });

        let (table, report) = TableMerger::merge(&raw, &annotations);
        sink.event(ProgressEvent {
            message: format!("phase=Merge; {} genes kept", report.kept),
            elapsed: Some(started.elapsed()),
        });
        Ok((table, report))
    }

    pub fn annotate(
        &self,
        request: &AnnotateRequest,
        sink: &dyn ProgressSink,
    ) -> Result<AnnotateResult, DisplayerError> {
        let source = request.input.display().to_string();
        let name = match &request.name {
            Some(name) => name.clone(),
            None => dataset_name_from_path(&request.input)?,
        };
        info!(source = source.as_str(), dataset = name.as_str(), "annotating series file");

        let text = read_series_file(&request.input)?;
        let (table, report) = self.annotate_text(&source, &text, sink)?;

        // Build every artifact before writing any so a bad sample type stores nothing.
        let artifacts = if request.sample_types.len() > 1 {
            request
                .sample_types
                .iter()
                .map(|sample| {
                    let partition_name = format!("{name}_{sample}").parse::<DatasetName>()?;
                    Ok((partition_name, table.retain_sample_type(sample)?))
                })
                .collect::<Result<Vec<_>, DisplayerError>>()?
        } else {
            vec![(name, table)]
        };
        if !request.force {
            if let Some((existing, _)) = artifacts.iter().find(|(name, _)| self.store.exists(name)) {
                return Err(DisplayerError::DatasetExists(existing.to_string()));
            }
        }

        self.store.ensure_root()?;
        let mut datasets = Vec::with_capacity(artifacts.len());
        for (name, table) in artifacts {
            let csv_path = if request.csv {
                Some(self.store.export_csv(&name, &table)?)
            } else {
                None
            };
            let (genes, columns) = (table.len(), table.measurement_columns.len());
            let path = self
                .store
                .write_snapshot(&Snapshot::new(name.clone(), &source, table), request.force)?;
            sink.event(ProgressEvent {
                message: format!("phase=Store; {path}"),
                elapsed: None,
            });
            datasets.push(StoredDataset {
                name,
                genes,
                columns,
                path,
                csv_path,
            });
        }

        Ok(AnnotateResult {
            source,
            report,
            datasets,
        })
    }
}

pub struct Catalog {
    store: Store,
}

impl Catalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Select, reshape and assemble persisted datasets; the first failing dataset aborts the view.
    pub fn view(&self, request: ViewRequest) -> Result<ViewResult, DisplayerError> {
        if request.datasets.is_empty() {
            return Err(DisplayerError::DatasetNotFound(
                "no dataset selected".to_string(),
            ));
        }
        let mut reshaped = Vec::with_capacity(request.datasets.len());
        for name in &request.datasets {
            let table = self.store.load_table(name)?;
            let selected = DatasetSelector::select(name, &table, &request.genes)?;
            reshaped.push(ReplicateReshaper::reshape(name, &selected, request.replicate)?);
        }
        let assembled = ComparisonAssembler::assemble(&reshaped)?;
        info!(
            datasets = request.datasets.len(),
            genes = request.genes.len(),
            replicate = %request.replicate,
            "view assembled"
        );
        Ok(ViewResult {
            replicate: request.replicate,
            reshaped,
            assembled,
        })
    }

    pub fn list(&self) -> Result<ListResult, DisplayerError> {
        let datasets = self
            .store
            .list()?
            .into_iter()
            .map(|name| {
                let snapshot = self.store.load(&name)?;
                Ok(ListEntry {
                    name,
                    source: snapshot.source,
                    created_at: snapshot.created_at,
                    genes: snapshot.table.len(),
                    columns: snapshot.table.measurement_columns.len(),
                })
            })
            .collect::<Result<Vec<_>, DisplayerError>>()?;
        Ok(ListResult { datasets })
    }
}

/// `GSE460_series_matrix.txt.gz` -> `GSE460_series_matrix`.
pub fn dataset_name_from_path(path: &std::path::Path) -> Result<DatasetName, DisplayerError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| DisplayerError::InvalidDatasetName(path.display().to_string()))?;
    let without_gz = file_name.strip_suffix(".gz").unwrap_or(file_name);
    let stem = match without_gz.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => without_gz,
    };
    stem.parse()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn dataset_names_from_paths() {
        let name = dataset_name_from_path(Path::new("infiles/GSE460_series_matrix.txt.gz")).unwrap();
        assert_eq!(name.as_str(), "GSE460_series_matrix");
        let name = dataset_name_from_path(Path::new("GSE8056")).unwrap();
        assert_eq!(name.as_str(), "GSE8056");
    }
}
