use serde::{Deserialize, Serialize};

pub const PROBE_COLUMN: &str = "affy_gene_probe_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFormat {
    pub delimiter: char,
    pub title_marker: String,
    pub comment_markers: Vec<String>,
    pub index_label: String,
    pub probe_column: String,
}

impl Default for SeriesFormat {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            title_marker: "!Sample_title".to_string(),
            comment_markers: vec!["!".to_string(), "#".to_string()],
            index_label: "ID_REF".to_string(),
            probe_column: PROBE_COLUMN.to_string(),
        }
    }
}

impl SeriesFormat {
    pub fn is_title(&self, line: &str) -> bool {
        line.starts_with(&self.title_marker)
    }

    pub fn is_comment(&self, line: &str) -> bool {
        self.comment_markers
            .iter()
            .any(|marker| !marker.is_empty() && line.starts_with(marker.as_str()))
    }

    pub fn is_index_row(&self, first_field: &str) -> bool {
        first_field == self.index_label
    }
}
