use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ProbeId, strip_quotes};
use crate::error::DisplayerError;
use crate::format::SeriesFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub probe_id: ProbeId,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub source_name: String,
    pub probe_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn probe_ids(&self) -> Vec<ProbeId> {
        self.rows.iter().map(|row| row.probe_id.clone()).collect()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == label)
    }

    pub fn value(&self, row: usize, label: &str) -> Option<&str> {
        let index = self.column_index(label)?;
        self.rows
            .get(row)
            .and_then(|row| row.values.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct SeriesParser {
    format: SeriesFormat,
}

impl SeriesParser {
    pub fn new(format: SeriesFormat) -> Self {
        Self { format }
    }

    pub fn parse(&self, source_name: &str, text: &str) -> Result<RawTable, DisplayerError> {
        let format = &self.format;
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if format.is_title(line) {
                if columns.is_some() {
                    return Err(DisplayerError::FileFormat {
                        source_name: source_name.to_string(),
                        reason: format!("second {} line at line {}", format.title_marker, line_no + 1),
                    });
                }
                let header = line
                    .split(format.delimiter)
                    .skip(1)
                    .map(strip_quotes)
                    .collect::<Vec<_>>();
                columns = Some(header);
                continue;
            }
            if format.is_comment(line) {
                continue;
            }

            let mut fields = line.split(format.delimiter);
            let first = strip_quotes(fields.next().unwrap_or_default());
            if format.is_index_row(&first) {
                continue;
            }
            let Some(header) = columns.as_ref() else {
                return Err(DisplayerError::FileFormat {
                    source_name: source_name.to_string(),
                    reason: format!(
                        "data row at line {} precedes the {} header",
                        line_no + 1,
                        format.title_marker
                    ),
                });
            };
            let Ok(probe_id) = first.parse::<ProbeId>() else {
                skipped += 1;
                continue;
            };
            let mut values = fields
                .take(header.len())
                .map(|value| value.trim().to_string())
                .collect::<Vec<_>>();
            values.resize(header.len(), String::new());
            rows.push(RawRow { probe_id, values });
        }

        let Some(columns) = columns else {
            return Err(DisplayerError::FileFormat {
                source_name: source_name.to_string(),
                reason: format!("no {} header line", format.title_marker),
            });
        };
        if rows.is_empty() {
            return Err(DisplayerError::NoData(source_name.to_string()));
        }
        debug!(
            source = source_name,
            rows = rows.len(),
            columns = columns.len(),
            skipped,
            "parsed series file"
        );

        Ok(RawTable {
            source_name: source_name.to_string(),
            probe_column: format.probe_column.clone(),
            columns,
            rows,
        })
    }
}

impl Default for SeriesParser {
    fn default() -> Self {
        Self::new(SeriesFormat::default())
    }
}

pub fn read_series_file(path: &Path) -> Result<String, DisplayerError> {
    let mut file = File::open(path)
        .map_err(|err| DisplayerError::Filesystem(format!("open {}: {err}", path.display())))?;
    let mut text = String::new();
    let is_gzip = path.extension().map(|ext| ext == "gz").unwrap_or(false);
    if is_gzip {
        MultiGzDecoder::new(file)
            .read_to_string(&mut text)
            .map_err(|err| DisplayerError::Filesystem(format!("inflate {}: {err}", path.display())))?;
    } else {
        file.read_to_string(&mut text)
            .map_err(|err| DisplayerError::Filesystem(format!("read {}: {err}", path.display())))?;
    }
    Ok(text)
}
