//! Offline accuracy evaluation against a labeled image folder.
//!
//! Expected layout:
//!
//! ```text
//! <root>/<split>/recyclable/*.jpg
//! <root>/<split>/non-recyclable/*.jpg   (or non_recyclable/)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::Serialize;

use crate::recycling::{Category, RecyclingClassifier};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const NON_RECYCLABLE_DIRS: &[&str] = &["non-recyclable", "non_recyclable"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub path: PathBuf,
    pub truth: Category,
}

/// Collects up to `max_per_class` images of each class from `root/split`,
/// in file name order. Missing class directories are skipped with a warning.
pub fn load_dataset(root: &Path, split: &str, max_per_class: usize) -> io::Result<Vec<LabeledImage>> {
    let split_dir = root.join(split);
    let mut images = Vec::new();

    let recyclable_dir = split_dir.join("recyclable");
    images.extend(collect_class(&recyclable_dir, Category::Recyclable, max_per_class)?);

    match NON_RECYCLABLE_DIRS.iter().map(|d| split_dir.join(d)).find(|d| d.is_dir()) {
        Some(dir) => images.extend(collect_class(&dir, Category::NonRecyclable, max_per_class)?),
        None => warn!("No non-recyclable directory under {:?}", split_dir),
    }

    info!("Loaded {} images from {:?}", images.len(), split_dir);
    Ok(images)
}

fn collect_class(dir: &Path, truth: Category, max_per_class: usize) -> io::Result<Vec<LabeledImage>> {
    if !dir.is_dir() {
        warn!("Class directory {:?} does not exist", dir);
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    paths.sort();
    paths.truncate(max_per_class);
    Ok(paths.into_iter().map(|path| LabeledImage { path, truth }).collect())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub image: String,
    pub truth: Category,
    pub predicted: Category,
    pub confidence: f32,
    pub top_label: String,
    pub correct: bool,
}

/// Counts with recyclable as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, truth: Category, predicted: Category) {
        match (truth.is_recyclable(), predicted.is_recyclable()) {
            (true, true) => self.true_positive += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (true, false) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

// 0 when the denominator is empty
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationFailure {
    pub image: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub model: String,
    pub policy: String,
    pub rows: Vec<EvaluationRow>,
    pub failures: Vec<EvaluationFailure>,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
}

/// Classifies every image. Images that fail are logged and listed in
/// `failures` but do not count toward accuracy.
pub fn evaluate(classifier: &RecyclingClassifier, images: &[LabeledImage]) -> EvaluationReport {
    let mut rows = Vec::with_capacity(images.len());
    let mut failures = Vec::new();
    let mut confusion = ConfusionMatrix::default();

    for (i, labeled) in images.iter().enumerate() {
        let image = display_name(&labeled.path);
        match classifier.classify_path(&labeled.path) {
            Ok(verdict) => {
                confusion.record(labeled.truth, verdict.category);
                let correct = verdict.category == labeled.truth;
                info!(
                    "[{}/{}] {} -> {} ({:.3}, top '{}') {}",
                    i + 1,
                    images.len(),
                    image,
                    verdict.category,
                    verdict.confidence,
                    verdict.top_label,
                    if correct { "correct" } else { "wrong" }
                );
                rows.push(EvaluationRow {
                    image,
                    truth: labeled.truth,
                    predicted: verdict.category,
                    confidence: verdict.confidence,
                    top_label: verdict.top_label,
                    correct,
                });
            }
            Err(e) => {
                error!("Error processing {:?}: {}", labeled.path, e);
                failures.push(EvaluationFailure {
                    image,
                    error: e.to_string(),
                });
            }
        }
    }

    let info = classifier.info();
    EvaluationReport {
        model: info.labeler,
        policy: format!("{:?}", info.policy),
        accuracy: confusion.accuracy(),
        rows,
        failures,
        confusion,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl EvaluationReport {
    pub fn correct(&self) -> usize {
        self.rows.iter().filter(|r| r.correct).count()
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Recycling Classifier Evaluation\n\n");
        md.push_str(&format!("**Model**: {}  \n", self.model));
        md.push_str(&format!("**Policy**: {}\n\n", self.policy));
        md.push_str("## Summary\n");
        md.push_str(&format!("- Images tested: {}\n", self.rows.len()));
        md.push_str(&format!("- Correct predictions: {}\n", self.correct()));
        md.push_str(&format!("- Failed images: {}\n", self.failures.len()));
        md.push_str(&format!("- **Accuracy**: {:.1}%\n", self.accuracy * 100.0));
        md.push_str(&format!("- Precision (recyclable): {:.1}%\n", self.confusion.precision() * 100.0));
        md.push_str(&format!("- Recall (recyclable): {:.1}%\n\n", self.confusion.recall() * 100.0));

        md.push_str("## Detailed Results\n\n");
        md.push_str("| # | Image | True Label | Predicted Label | Confidence | Top Prediction | Correct? |\n");
        md.push_str("|---|-------|------------|-----------------|------------|----------------|----------|\n");
        for (i, row) in self.rows.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.3} | {} | {} |\n",
                i + 1,
                markdown_cell(&row.image),
                row.truth,
                row.predicted,
                row.confidence,
                markdown_cell(&row.top_label),
                if row.correct { "Correct" } else { "Wrong" }
            ));
        }
        for failure in &self.failures {
            md.push_str(&format!(
                "| - | {} | - | ERROR | - | {} | Wrong |\n",
                markdown_cell(&failure.image),
                markdown_cell(&failure.error)
            ));
        }
        md
    }

    /// Writes `evaluation_results.md` and `evaluation_results.json` into
    /// `output_dir`, creating it if needed. Returns both paths.
    pub fn write_to(&self, output_dir: &Path) -> io::Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(output_dir)?;
        let md_path = output_dir.join("evaluation_results.md");
        let json_path = output_dir.join("evaluation_results.json");

        fs::write(&md_path, self.to_markdown())?;
        let json = serde_json::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(&json_path, json)?;

        info!("Results saved to {:?} and {:?}", md_path, json_path);
        Ok((md_path, json_path))
    }
}

/// Keeps free text inside a single table cell.
fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_metrics() {
        let mut confusion = ConfusionMatrix::default();
        confusion.record(Category::Recyclable, Category::Recyclable);
        confusion.record(Category::Recyclable, Category::NonRecyclable);
        confusion.record(Category::NonRecyclable, Category::Recyclable);
        confusion.record(Category::NonRecyclable, Category::NonRecyclable);
        assert_eq!(confusion.total(), 4);
        assert_eq!(confusion.accuracy(), 0.5);
        assert_eq!(confusion.precision(), 0.5);
        assert_eq!(confusion.recall(), 0.5);
    }

    #[test]
    fn test_empty_confusion_is_zero() {
        let confusion = ConfusionMatrix::default();
        assert_eq!(confusion.accuracy(), 0.0);
        assert_eq!(confusion.precision(), 0.0);
    }

    #[test]
    fn test_failure_text_stays_in_one_cell() {
        let report = EvaluationReport {
            model: "static".to_string(),
            policy: "weighted".to_string(),
            rows: Vec::new(),
            failures: vec![EvaluationFailure {
                image: "a|b.jpg".to_string(),
                error: "bad header | offset 3\nretry failed".to_string(),
            }],
            confusion: ConfusionMatrix::default(),
            accuracy: 0.0,
        };
        let markdown = report.to_markdown();
        let line = markdown.lines().last().unwrap();
        assert_eq!(line, "| - | a\\|b.jpg | - | ERROR | - | bad header \\| offset 3 retry failed | Wrong |");
    }

    #[test]
    fn test_image_extension_filter() {
        assert!(has_image_extension(Path::new("a/Bottle 40.JPG")));
        assert!(has_image_extension(Path::new("can.png")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("README")));
    }
}
