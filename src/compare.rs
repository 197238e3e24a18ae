use serde::{Deserialize, Serialize};

use crate::domain::DatasetName;
use crate::error::DisplayerError;
use crate::reshape::ReshapedTable;
use crate::time::parse_hours;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub hours: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSeries {
    pub label: String,
    pub gene: String,
    pub dataset: DatasetName,
    pub points: Vec<TimePoint>,
}

impl GeneSeries {
    pub fn value_at(&self, hours: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.hours == hours)
            .map(|point| point.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTable {
    pub dataset: DatasetName,
    pub hours: Vec<u32>,
    pub series: Vec<GeneSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub gene: String,
    pub dataset: DatasetName,
    pub hours: u32,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub hours: Vec<u32>,
    pub series: Vec<GeneSeries>,
}

impl ComparisonTable {
    pub fn series(&self, label: &str) -> Option<&GeneSeries> {
        self.series.iter().find(|series| series.label == label)
    }

    pub fn value(&self, label: &str, hours: u32) -> Option<f64> {
        self.series(label).and_then(|series| series.value_at(hours))
    }

    pub fn long_rows(&self) -> Vec<LongRow> {
        self.series
            .iter()
            .flat_map(|series| {
                series.points.iter().map(|point| LongRow {
                    gene: series.gene.clone(),
                    dataset: series.dataset.clone(),
                    hours: point.hours,
                    value: point.value,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Assembled {
    Single(SeriesTable),
    Comparison(ComparisonTable),
}

pub struct ComparisonAssembler;

impl ComparisonAssembler {
    pub fn align(table: &ReshapedTable) -> Result<SeriesTable, DisplayerError> {
        let mut columns = table
            .columns
            .iter()
            .enumerate()
            .map(|(index, label)| {
                parse_hours(label)
                    .map(|hours| (hours, index))
                    .ok_or_else(|| DisplayerError::TimeLabel {
                        dataset: table.dataset.to_string(),
                        column: label.clone(),
                    })
            })
            .collect::<Result<Vec<_>, DisplayerError>>()?;
        columns.sort_by_key(|(hours, _)| *hours);

        let series = table
            .rows
            .iter()
            .map(|row| GeneSeries {
                label: format!("{}_{}", row.gene_name(), table.dataset),
                gene: row.gene_name().to_string(),
                dataset: table.dataset.clone(),
                points: columns
                    .iter()
                    .map(|&(hours, index)| TimePoint {
                        hours,
                        value: row.values[index],
                    })
                    .collect(),
            })
            .collect();

        let mut hours = columns.iter().map(|(hours, _)| *hours).collect::<Vec<_>>();
        hours.dedup();
        Ok(SeriesTable {
            dataset: table.dataset.clone(),
            hours,
            series,
        })
    }

    pub fn assemble(tables: &[ReshapedTable]) -> Result<Assembled, DisplayerError> {
        let mut aligned = tables
            .iter()
            .map(Self::align)
            .collect::<Result<Vec<_>, DisplayerError>>()?;
        if aligned.len() == 1 {
            if let Some(single) = aligned.pop() {
                return Ok(Assembled::Single(single));
            }
        }

        let mut hours = aligned
            .iter()
            .flat_map(|table| table.hours.iter().copied())
            .collect::<Vec<_>>();
        hours.sort_unstable();
        hours.dedup();
        Ok(Assembled::Comparison(ComparisonTable {
            hours,
            series: aligned.into_iter().flat_map(|table| table.series).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::GeneAnnotation;
    use crate::domain::ReplicateMode;
    use crate::reshape::ReshapedRow;

    fn reshaped(dataset: &str, columns: &[&str], genes: &[(&str, &[f64])]) -> ReshapedTable {
        ReshapedTable {
            dataset: dataset.parse().unwrap(),
            mode: ReplicateMode::Average,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: genes
                .iter()
                .map(|(gene, values)| ReshapedRow {
                    annotation: GeneAnnotation {
                        gene_name: gene.to_string(),
                        gene_description: String::new(),
                        homologene_id: String::new(),
                        refseq: String::new(),
                    },
                    values: values.to_vec(),
                })
                .collect(),
        }
    }

    #[test]
    fn align_sorts_hours_with_their_values() {
        let table = reshaped("skinData", &["48hrs_average", "0hrs_average", "6hr_average"], &[("ABC1", &[3.0, 1.0, 2.0])]);
        let aligned = ComparisonAssembler::align(&table).unwrap();
        assert_eq!(aligned.hours, [0, 6, 48]);
        let series = &aligned.series[0];
        assert_eq!(series.label, "ABC1_skinData");
        assert_eq!(
            series.points.iter().map(|p| p.value).collect::<Vec<_>>(),
            [1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn single_dataset_is_not_concatenated() {
        let table = reshaped("skinData", &["0hrs_average"], &[("ABC1", &[1.0])]);
        let assembled = ComparisonAssembler::assemble(&[table]).unwrap();
        assert!(matches!(assembled, Assembled::Single(ref t) if t.series.len() == 1));
    }

    #[test]
    fn comparison_shares_hour_axis() {
        let skin = reshaped("skinData", &["0hrs_average", "24hrs_average"], &[("ABC1", &[1.0, 2.0])]);
        let liver = reshaped("liverData", &["0hrs_average", "12hrs_average"], &[("ABC1", &[5.0, 6.0])]);
        let Assembled::Comparison(table) = ComparisonAssembler::assemble(&[skin, liver]).unwrap()
        else {
            panic!("expected a comparison");
        };
        assert_eq!(table.hours, [0, 12, 24]);
        assert_eq!(table.value("ABC1_liverData", 12), Some(6.0));
        assert_eq!(table.value("ABC1_skinData", 12), None);
        assert_eq!(table.long_rows().len(), 4);
    }
}
