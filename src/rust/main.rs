use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use recyclens::evaluation::{evaluate, load_dataset};
use recyclens::{
    AggregationPolicy, BuiltinModel, ConfidenceAdjustment, ModelManager, RecyclingClassifier,
    RuntimeConfig, Upload, UploadHandler,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding downloaded models (defaults to the user cache)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ClassifierArgs {
    /// How classifier labels are combined into a verdict
    #[arg(long, value_enum, default_value_t = PolicyArg::Single)]
    policy: PolicyArg,

    /// Number of labels requested from the model (defaults per policy)
    #[arg(long)]
    top_k: Option<usize>,

    /// Inflate single-top confidences below 0.8 into [0.85, 0.99]
    #[arg(long)]
    boost_confidence: bool,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Single,
    Weighted,
}

#[derive(Subcommand)]
enum Command {
    /// Download and verify the model and its labels
    Download {
        /// Force a fresh download of the model files
        #[arg(short, long)]
        fresh: bool,
    },
    /// Classify images and print one JSON response per image
    Classify {
        /// Image files or http(s) URLs
        #[arg(required = true)]
        images: Vec<String>,
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Evaluate accuracy on a labeled dataset and write a report
    Evaluate {
        /// Dataset root containing <split>/recyclable and <split>/non-recyclable
        dataset: PathBuf,
        #[arg(long, default_value = "test")]
        split: String,
        #[arg(long, default_value_t = 10)]
        max_per_class: usize,
        #[arg(long, default_value = "results")]
        output: PathBuf,
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
}

impl ClassifierArgs {
    fn policy(&self) -> AggregationPolicy {
        match self.policy {
            PolicyArg::Single => AggregationPolicy::SingleTop {
                adjustment: if self.boost_confidence {
                    ConfidenceAdjustment::Inflate
                } else {
                    ConfidenceAdjustment::None
                },
            },
            PolicyArg::Weighted => AggregationPolicy::Weighted,
        }
    }
}

fn model_manager(models_dir: Option<&Path>) -> Result<ModelManager> {
    let manager = match models_dir {
        Some(dir) => ModelManager::new(dir),
        None => ModelManager::new_default(),
    };
    manager.context("Failed to open the model cache")
}

async fn ensure_model_downloaded(manager: &ModelManager, fresh: bool) -> Result<()> {
    let model = BuiltinModel::MobileNetV2;
    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }
    manager.ensure_model_downloaded(model).await?;
    Ok(())
}

async fn build_classifier(manager: &ModelManager, args: &ClassifierArgs) -> Result<RecyclingClassifier> {
    ensure_model_downloaded(manager, false).await?;

    let start_time = Instant::now();
    let runtime_config = RuntimeConfig {
        intra_threads: args.threads,
        ..RuntimeConfig::default()
    };
    let mut builder = RecyclingClassifier::builder()
        .with_runtime_config(runtime_config)
        .with_model_from(manager, BuiltinModel::MobileNetV2)?
        .with_policy(args.policy());
    if let Some(top_k) = args.top_k {
        builder = builder.with_top_k(top_k)?;
    }
    let classifier = builder.build()?;
    info!("Classifier built in {:.2?}: {:?}", start_time.elapsed(), classifier.info());
    Ok(classifier)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ImageSource {
    File(PathBuf),
    Url(String),
}

impl ImageSource {
    fn parse(arg: &str) -> Self {
        let lower = arg.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(arg.to_string())
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Reads the image and guesses its content type.
    async fn fetch(&self) -> Result<Upload> {
        match self {
            Self::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {:?}", path))?;
                Ok(Upload::new(path.to_string_lossy(), content_type_for(path), bytes))
            }
            Self::Url(url) => {
                let response = reqwest::get(url.as_str())
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("Failed to download {}", url))?;
                // Non-image header: guess from the URL's extension
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| v.to_ascii_lowercase().starts_with("image/"))
                    .map(str::to_string)
                    .unwrap_or_else(|| content_type_for(Path::new(url_path(url))).to_string());
                let bytes = response.bytes().await?;
                Ok(Upload::new(url.as_str(), content_type, bytes.to_vec()))
            }
        }
    }
}

/// Path component of a URL, without query or fragment.
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let rest = &rest[..end];
    rest.find('/').map_or("", |slash| &rest[slash..])
}

async fn classify_images(classifier: RecyclingClassifier, images: &[String]) -> Result<()> {
    let handler = UploadHandler::new(Arc::new(classifier));
    for image in images {
        let upload = ImageSource::parse(image).fetch().await?;
        let reply = handler.handle_async(upload).await;
        println!("{}", serde_json::json!({ "image": image, "status": reply.status, "result": reply.body }));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    recyclens::init_logger();
    let args = Args::parse();
    let manager = model_manager(args.models_dir.as_deref())?;

    match args.command {
        Command::Download { fresh } => {
            ensure_model_downloaded(&manager, fresh).await?;
            println!("Model ready in {:?}", manager.models_dir());
        }
        Command::Classify { images, classifier } => {
            let classifier = build_classifier(&manager, &classifier).await?;
            classify_images(classifier, &images).await?;
        }
        Command::Evaluate { dataset, split, max_per_class, output, classifier } => {
            let classifier = build_classifier(&manager, &classifier).await?;
            let images = load_dataset(&dataset, &split, max_per_class)
                .with_context(|| format!("Failed to load dataset from {:?}", dataset))?;
            if images.is_empty() {
                anyhow::bail!("No images found under {:?}", dataset.join(&split));
            }

            let report = tokio::task::spawn_blocking(move || evaluate(&classifier, &images)).await?;
            let (md_path, json_path) = report.write_to(&output)?;
            println!(
                "Accuracy: {:.1}% ({}/{} correct, {} failed)",
                report.accuracy * 100.0,
                report.correct(),
                report.rows.len(),
                report.failures.len()
            );
            println!("Reports: {} and {}", md_path.display(), json_path.display());
        }
    }

    Ok(())
}
