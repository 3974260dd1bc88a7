//! Identification labels file parsing.

use crate::error::{Error, Result};
use std::path::Path;

/// Read species labels, one per line, in model output order.
///
/// The scientific name is the first tab-separated column; further columns
/// (common names, taxonomy ranks) are ignored. Blank lines are skipped.
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let labels = parse_labels(&contents);
    if labels.is_empty() {
        return Err(Error::LabelsInvalid {
            path: path.to_path_buf(),
            reason: "no labels found".to_string(),
        });
    }

    Ok(labels)
}

fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| line.split('\t').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
