use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::annotation::{AnnotationMap, GeneAnnotation};
use crate::domain::{ProbeId, SampleType};
use crate::error::DisplayerError;
use crate::parser::{RawRow, RawTable};

pub const GENE_NAME: &str = "Gene Name";
pub const HG_ID: &str = "HG ID";
pub const GENE_DESCRIPTION: &str = "Gene Description";
pub const REFSEQ: &str = "RefSeq";

pub const METADATA_COLUMNS: [&str; 4] = [GENE_NAME, HG_ID, GENE_DESCRIPTION, REFSEQ];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    pub annotation: GeneAnnotation,
    pub values: Vec<String>,
}

impl AnnotatedRow {
    pub fn gene_name(&self) -> &str {
        &self.annotation.gene_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedTable {
    pub measurement_columns: Vec<String>,
    pub rows: Vec<AnnotatedRow>,
}

impl AnnotatedTable {
    pub fn header(&self) -> Vec<String> {
        METADATA_COLUMNS
            .iter()
            .map(|label| label.to_string())
            .chain(self.measurement_columns.iter().cloned())
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            let annotation = &row.annotation;
            [
                annotation.gene_name.clone(),
                annotation.homologene_id.clone(),
                annotation.gene_description.clone(),
                annotation.refseq.clone(),
            ]
            .into_iter()
            .chain(row.values.iter().cloned())
            .collect()
        })
    }

    pub fn gene_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(AnnotatedRow::gene_name)
    }

    pub fn row(&self, gene: &str) -> Option<&AnnotatedRow> {
        self.rows.iter().find(|row| row.gene_name() == gene)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn check_shape(&self, dataset: &str) -> Result<(), DisplayerError> {
        let expected = self.measurement_columns.len();
        match self.rows.iter().find(|row| row.values.len() != expected) {
            Some(row) => Err(DisplayerError::CorruptSnapshot {
                dataset: dataset.to_string(),
                gene: row.gene_name().to_string(),
                expected,
                found: row.values.len(),
            }),
            None => Ok(()),
        }
    }

    pub fn retain_sample_type(&self, sample: &SampleType) -> Result<AnnotatedTable, DisplayerError> {
        let keep = self
            .measurement_columns
            .iter()
            .enumerate()
            .filter(|(_, label)| label.contains(sample.as_str()))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if keep.is_empty() {
            return Err(DisplayerError::InvalidSampleType(sample.to_string()));
        }
        Ok(AnnotatedTable {
            measurement_columns: keep
                .iter()
                .map(|&index| self.measurement_columns[index].clone())
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|row| AnnotatedRow {
                    annotation: row.annotation.clone(),
                    values: keep.iter().map(|&index| row.values[index].clone()).collect(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub parsed_rows: usize,
    pub annotated_probes: usize,
    pub dropped_unmatched: usize,
    pub dropped_incomplete: usize,
    pub dropped_duplicate: usize,
    pub kept: usize,
}

pub struct TableMerger;

impl TableMerger {
    /// Keys are visited in lexicographic probe-id order and raw rows keep file
    /// order within a key, so the first-occurrence gene dedup does not depend on
    /// the order the provider answered in.
    pub fn merge(raw: &RawTable, annotations: &AnnotationMap) -> (AnnotatedTable, MergeReport) {
        let mut raw_by_probe: BTreeMap<&ProbeId, Vec<&RawRow>> = BTreeMap::new();
        for row in &raw.rows {
            raw_by_probe.entry(&row.probe_id).or_default().push(row);
        }
        let keys = raw_by_probe
            .keys()
            .copied()
            .chain(annotations.keys())
            .collect::<BTreeSet<_>>();

        let mut report = MergeReport {
            parsed_rows: raw.rows.len(),
            annotated_probes: annotations.len(),
            ..MergeReport::default()
        };
        let mut seen_genes = HashSet::new();
        let mut rows = Vec::new();

        for key in keys {
            let raw_rows = raw_by_probe.get(key).map(Vec::as_slice).unwrap_or_default();
            let Some(annotation) = annotations.get(key) else {
                report.dropped_unmatched += raw_rows.len();
                continue;
            };
            if raw_rows.is_empty() {
                report.dropped_unmatched += 1;
                continue;
            }
            for raw_row in raw_rows {
                if raw_row.values.iter().any(|value| value.is_empty()) {
                    report.dropped_incomplete += 1;
                    continue;
                }
                if !seen_genes.insert(annotation.gene_name.clone()) {
                    report.dropped_duplicate += 1;
                    continue;
                }
                rows.push(AnnotatedRow {
                    annotation: annotation.clone(),
                    values: raw_row.values.clone(),
                });
            }
        }
        report.kept = rows.len();

        let dropped =
            report.dropped_unmatched + report.dropped_incomplete + report.dropped_duplicate;
        if dropped > 0 {
            warn!(
                source = raw.source_name.as_str(),
                unmatched = report.dropped_unmatched,
                incomplete = report.dropped_incomplete,
                duplicate = report.dropped_duplicate,
                "dropped rows during merge"
            );
        }
        info!(source = raw.source_name.as_str(), kept = report.kept, "merged annotations");

        (
            AnnotatedTable {
                measurement_columns: raw.columns.clone(),
                rows,
            },
            report,
        )
    }
}
