use std::collections::HashMap;

use crate::domain::{DatasetName, GeneSelection};
use crate::error::DisplayerError;
use crate::merge::{AnnotatedRow, AnnotatedTable};

pub struct DatasetSelector;

impl DatasetSelector {
    pub fn select(
        dataset: &DatasetName,
        table: &AnnotatedTable,
        genes: &GeneSelection,
    ) -> Result<AnnotatedTable, DisplayerError> {
        let index: HashMap<&str, &AnnotatedRow> = table
            .rows
            .iter()
            .map(|row| (row.gene_name(), row))
            .collect();

        let rows = genes
            .genes()
            .iter()
            .map(|gene| {
                index
                    .get(gene.as_str())
                    .map(|row| (*row).clone())
                    .ok_or_else(|| DisplayerError::GeneNotFound {
                        gene: gene.clone(),
                        dataset: dataset.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, DisplayerError>>()?;

        Ok(AnnotatedTable {
            measurement_columns: table.measurement_columns.clone(),
            rows,
        })
    }
}
