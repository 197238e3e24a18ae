//! Hour extraction from free-text measurement column labels.
//!
//! A label carries a time point when it contains an integer followed by `hr` or
//! `hrs`, optionally separated by whitespace and a single `_` or `-`, in any
//! case: `24hrs_replicate1`, `0hr rep2`, `skin 48 hrs replicate3`, `6HR-rep1`,
//! `12_hrs`. The first such occurrence wins.

use std::sync::LazyLock;

use regex::Regex;

static HOUR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*[_-]?\s*hrs?").unwrap());

pub const AVERAGE_SUFFIX: &str = "average";

pub fn parse_hours(label: &str) -> Option<u32> {
    HOUR_PATTERN
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|hours| hours.as_str().parse().ok())
}

pub fn bucket_label(hours: u32) -> String {
    format!("{hours}hrs_{AVERAGE_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_header_variants() {
        let cases = [
            ("24hrs_replicate1", Some(24)),
            ("0hr_replicate2", Some(0)),
            ("\"48hrs_replicate3\"", Some(48)),
            ("skin 48 hrs replicate3", Some(48)),
            ("6HR-rep1", Some(6)),
            ("12_hrs", Some(12)),
            ("replicate1 96hrs", Some(96)),
            ("24hrs_average", Some(24)),
            ("baseline_replicate1", None),
            ("24hours", None),
        ];
        for (label, expected) in cases {
            assert_eq!(parse_hours(label), expected, "label {label:?}");
        }
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(bucket_label(24), "24hrs_average");
    }
}
