use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotation::GeneAnnotation;
use crate::domain::{DatasetName, GeneSelection, ReplicateMode};
use crate::error::DisplayerError;
use crate::merge::{AnnotatedTable, METADATA_COLUMNS};
use crate::time::{bucket_label, parse_hours};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReshapedRow {
    pub annotation: GeneAnnotation,
    pub values: Vec<f64>,
}

impl ReshapedRow {
    pub fn gene_name(&self) -> &str {
        &self.annotation.gene_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReshapedTable {
    pub dataset: DatasetName,
    pub mode: ReplicateMode,
    pub columns: Vec<String>,
    pub rows: Vec<ReshapedRow>,
}

impl ReshapedTable {
    pub fn header(&self) -> Vec<String> {
        METADATA_COLUMNS
            .iter()
            .map(|label| label.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn row(&self, gene: &str) -> Option<&ReshapedRow> {
        self.rows.iter().find(|row| row.gene_name() == gene)
    }

    pub fn value(&self, gene: &str, column: &str) -> Option<f64> {
        let index = self.columns.iter().position(|label| label == column)?;
        self.row(gene).and_then(|row| row.values.get(index).copied())
    }

    pub fn select(&self, genes: &GeneSelection) -> Result<ReshapedTable, DisplayerError> {
        let rows = genes
            .genes()
            .iter()
            .map(|gene| {
                self.row(gene)
                    .cloned()
                    .ok_or_else(|| DisplayerError::GeneNotFound {
                        gene: gene.clone(),
                        dataset: self.dataset.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, DisplayerError>>()?;
        Ok(ReshapedTable {
            dataset: self.dataset.clone(),
            mode: self.mode,
            columns: self.columns.clone(),
            rows,
        })
    }
}

pub struct ReplicateReshaper;

impl ReplicateReshaper {
    pub fn reshape(
        dataset: &DatasetName,
        table: &AnnotatedTable,
        mode: ReplicateMode,
    ) -> Result<ReshapedTable, DisplayerError> {
        table.check_shape(dataset.as_str())?;
        let reshaped = match mode.column_marker() {
            Some(marker) => Self::filter_replicate(dataset, table, mode, marker)?,
            None => Self::average(dataset, table)?,
        };
        debug!(
            dataset = dataset.as_str(),
            mode = %mode,
            columns = reshaped.columns.len(),
            rows = reshaped.rows.len(),
            "reshaped dataset"
        );
        Ok(reshaped)
    }

    fn filter_replicate(
        dataset: &DatasetName,
        table: &AnnotatedTable,
        mode: ReplicateMode,
        marker: &str,
    ) -> Result<ReshapedTable, DisplayerError> {
        let keep = table
            .measurement_columns
            .iter()
            .enumerate()
            .filter(|(_, label)| label.contains(marker))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if keep.is_empty() {
            warn!(dataset = dataset.as_str(), marker, "no measurement column matches replicate");
        }

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let values = keep
                    .iter()
                    .map(|&index| {
                        parse_value(
                            dataset,
                            row.gene_name(),
                            &table.measurement_columns[index],
                            &row.values[index],
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ReshapedRow {
                    annotation: row.annotation.clone(),
                    values,
                })
            })
            .collect::<Result<Vec<_>, DisplayerError>>()?;

        Ok(ReshapedTable {
            dataset: dataset.clone(),
            mode,
            columns: keep
                .iter()
                .map(|&index| table.measurement_columns[index].clone())
                .collect(),
            rows,
        })
    }

    fn average(
        dataset: &DatasetName,
        table: &AnnotatedTable,
    ) -> Result<ReshapedTable, DisplayerError> {
        let mut buckets: Vec<(u32, Vec<usize>)> = Vec::new();
        let mut bucket_of_hour: HashMap<u32, usize> = HashMap::new();
        for (index, label) in table.measurement_columns.iter().enumerate() {
            let hours = parse_hours(label).ok_or_else(|| DisplayerError::TimeLabel {
                dataset: dataset.to_string(),
                column: label.clone(),
            })?;
            let slot = *bucket_of_hour.entry(hours).or_insert_with(|| {
                buckets.push((hours, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(index);
        }

        let mut rows = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let numeric = row
                .values
                .iter()
                .zip(&table.measurement_columns)
                .map(|(value, column)| parse_value(dataset, row.gene_name(), column, value))
                .collect::<Result<Vec<_>, _>>()?;
            let values = buckets
                .iter()
                .map(|(_, members)| {
                    members.iter().map(|&index| numeric[index]).sum::<f64>() / members.len() as f64
                })
                .collect();
            rows.push(ReshapedRow {
                annotation: row.annotation.clone(),
                values,
            });
        }

        Ok(ReshapedTable {
            dataset: dataset.clone(),
            mode: ReplicateMode::Average,
            columns: buckets.iter().map(|(hours, _)| bucket_label(*hours)).collect(),
            rows,
        })
    }
}

fn parse_value(
    dataset: &DatasetName,
    gene: &str,
    column: &str,
    value: &str,
) -> Result<f64, DisplayerError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| DisplayerError::NumericConversion {
            dataset: dataset.to_string(),
            gene: gene.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}
