use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DisplayerError;

pub fn strip_quotes(value: &str) -> String {
    value.replace('"', "").trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeId(String);

impl ProbeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProbeId {
    type Err = DisplayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = strip_quotes(value);
        if normalized.is_empty() {
            return Err(DisplayerError::FileFormat {
                source_name: "probe id".to_string(),
                reason: format!("empty probe identifier {value:?}"),
            });
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReplicateMode {
    Replicate1,
    Replicate2,
    Replicate3,
    Average,
}

impl ReplicateMode {
    pub fn column_marker(&self) -> Option<&'static str> {
        match self {
            ReplicateMode::Replicate1 => Some("replicate1"),
            ReplicateMode::Replicate2 => Some("replicate2"),
            ReplicateMode::Replicate3 => Some("replicate3"),
            ReplicateMode::Average => None,
        }
    }
}

impl fmt::Display for ReplicateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicateMode::Replicate1 => write!(f, "replicate1"),
            ReplicateMode::Replicate2 => write!(f, "replicate2"),
            ReplicateMode::Replicate3 => write!(f, "replicate3"),
            ReplicateMode::Average => write!(f, "average"),
        }
    }
}

impl FromStr for ReplicateMode {
    type Err = DisplayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "replicate1" => Ok(ReplicateMode::Replicate1),
            "replicate2" => Ok(ReplicateMode::Replicate2),
            "replicate3" => Ok(ReplicateMode::Replicate3),
            "average" => Ok(ReplicateMode::Average),
            _ => Err(DisplayerError::InvalidReplicateMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneSelection(Vec<String>);

impl GeneSelection {
    pub fn new<I, S>(genes: I) -> Result<Self, DisplayerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for gene in genes {
            let name: String = gene
                .as_ref()
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .collect();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            return Err(DisplayerError::InvalidGeneSelection(
                "no gene names given".to_string(),
            ));
        }
        Ok(Self(names))
    }

    pub fn genes(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for GeneSelection {
    type Err = DisplayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value.split(','))
    }
}

impl fmt::Display for GeneSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetName(String);

impl DatasetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetName {
    type Err = DisplayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = !normalized.is_empty()
            && !normalized.starts_with('.')
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
        if !is_valid {
            return Err(DisplayerError::InvalidDatasetName(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleType(String);

impl SampleType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SampleType {
    type Err = DisplayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if normalized.is_empty() || normalized.contains(['/', '\\']) {
            return Err(DisplayerError::InvalidSampleType(value.to_string()));
        }
        Ok(Self(normalized))
    }
}
