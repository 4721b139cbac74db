//! Loading of class index → label name tables.

use std::fs;
use std::path::Path;

use super::LabelerError;

/// Parses a label table with one class per line, in class index order.
///
/// Accepts both the ImageNet synset format (`n04399382 teddy, teddy bear`)
/// and plain names (`teddy`). Only the first comma-separated name is kept and
/// underscores become spaces, so `tin_can` and `n02747177 ashcan, trash can`
/// read as `tin can` and `ashcan`.
pub fn parse_labels(contents: &str) -> Result<Vec<String>, LabelerError> {
    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect();

    if labels.is_empty() {
        return Err(LabelerError::Labels("Label file contains no entries".into()));
    }
    if let Some(pos) = labels.iter().position(|l| l.is_empty()) {
        return Err(LabelerError::Labels(format!("Label {} is empty", pos + 1)));
    }
    Ok(labels)
}

pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>, LabelerError> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_labels(&contents)
}

fn parse_line(line: &str) -> String {
    let name = match line.split_once(' ') {
        Some((first, rest)) if is_synset_id(first) => rest,
        _ => line,
    };
    name.split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .replace('_', " ")
}

fn is_synset_id(token: &str) -> bool {
    token.len() == 9 && token.starts_with('n') && token[1..].chars().all(|c| c.is_ascii_digit())
}
