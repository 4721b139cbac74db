use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::{BuiltinModel, ModelInfo};

/// Environment variable overriding the cache root
pub const CACHE_ENV_VAR: &str = "RECYCLENS_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with status {status}")]
    BadStatus { url: String, status: u16 },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// The two files every model needs on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFile {
    Network,
    Labels,
}

impl ModelFile {
    const ALL: [ModelFile; 2] = [ModelFile::Network, ModelFile::Labels];

    fn file_name(self) -> &'static str {
        match self {
            Self::Network => "model.onnx",
            Self::Labels => "labels.txt",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Self::Network => "model",
            Self::Labels => "labels",
        }
    }

    fn url(self, info: &ModelInfo) -> &str {
        match self {
            Self::Network => &info.model_url,
            Self::Labels => &info.labels_url,
        }
    }

    fn hash(self, info: &ModelInfo) -> Option<&str> {
        match self {
            Self::Network => info.model_hash.as_deref(),
            Self::Labels => info.labels_hash.as_deref(),
        }
    }
}

/// Downloads, verifies and locates pretrained model files in a local cache.
#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("recyclens").join("models");
        }
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("recyclens").join("models");
        }
        env::temp_dir().join("recyclens").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn file_path(&self, model: BuiltinModel, file: ModelFile) -> PathBuf {
        self.models_dir.join(model.get_model_info().name).join(file.file_name())
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.file_path(model, ModelFile::Network)
    }

    pub fn get_labels_path(&self, model: BuiltinModel) -> PathBuf {
        self.file_path(model, ModelFile::Labels)
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        let downloaded = ModelFile::ALL
            .iter()
            .all(|&file| self.file_path(model, file).exists());
        log::debug!("Model {:?} downloaded: {}", model, downloaded);
        downloaded
    }

    /// Downloads any missing or corrupt file of `model`. On failure every file
    /// of the model is removed so a later call starts clean.
    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in ModelFile::ALL {
            let path = self.file_path(model, file);
            if let Err(e) = self.ensure_file(&info, file, &path).await {
                log::error!("Failed to set up {} file: {}", file.kind(), e);
                let _ = self.remove_download(model);
                return Err(e);
            }
        }

        log::info!("Model {} ready to use", info.name);
        Ok(())
    }

    async fn ensure_file(&self, info: &ModelInfo, file: ModelFile, path: &Path) -> Result<(), ModelError> {
        if path.exists() {
            if self.verify_file(path, file.hash(info))? {
                log::info!("Existing {} file verified at {:?}", file.kind(), path);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file.kind());
        }
        self.download_and_verify_file(file.url(info), path, file.hash(info), file.kind()).await
    }

    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(false);
        }
        let hash = sha256_hex(&bytes);
        log::debug!("{:?}: {} bytes, sha256 {}", path, bytes.len(), hash);
        Ok(expected_hash.map_or(true, |expected| hash == expected))
    }

    /// Checks that both files exist, are non-empty and match any pinned hash.
    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();
        for file in ModelFile::ALL {
            let path = self.file_path(model, file);
            if !path.exists() {
                log::info!("{} file missing at {:?}", file.kind(), path);
                return Ok(false);
            }
            if !self.verify_file(&path, file.hash(&info))? {
                log::info!("{} file failed verification", file.kind());
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        match expected_hash {
            Some(expected) if hash != expected => {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
            Some(_) => {}
            None => log::warn!("No pinned hash for {} file; sha256 is {}", file_type, hash),
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }
        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        for file in ModelFile::ALL {
            let path = self.file_path(model, file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if self.is_model_downloaded(model) && self.verify_model(model)? {
            log::info!("Model {:?} present and verified", model);
            return Ok(());
        }
        log::info!("Model {:?} missing or invalid, downloading...", model);
        self.remove_download(model)?;
        self.download_model(model).await
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_model_files(manager: &ModelManager, model: BuiltinModel) {
        let model_path = manager.get_model_path(model);
        fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        fs::write(&model_path, b"onnx bytes").unwrap();
        fs::write(manager.get_labels_path(model), "tench\nbottle\n").unwrap();
    }

    #[test]
    fn test_paths_live_under_model_dir() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let model_path = manager.get_model_path(BuiltinModel::MobileNetV2);
        let labels_path = manager.get_labels_path(BuiltinModel::MobileNetV2);
        assert!(model_path.ends_with("mobilenetv2-12/model.onnx"));
        assert!(labels_path.ends_with("mobilenetv2-12/labels.txt"));
    }

    #[test]
    fn test_verify_and_remove() -> Result<(), ModelError> {
        let dir = TempDir::new()?;
        let manager = ModelManager::new(dir.path())?;
        let model = BuiltinModel::MobileNetV2;

        assert!(!manager.is_model_downloaded(model));
        assert!(!manager.verify_model(model)?);

        write_model_files(&manager, model);
        assert!(manager.is_model_downloaded(model));
        assert!(manager.verify_model(model)?);

        fs::write(manager.get_model_path(model), b"")?;
        assert!(!manager.verify_model(model)?);

        manager.remove_download(model)?;
        assert!(!manager.is_model_downloaded(model));
        Ok(())
    }

    #[test]
    fn test_pinned_hash_checked() -> Result<(), ModelError> {
        let dir = TempDir::new()?;
        let manager = ModelManager::new(dir.path())?;
        let path = dir.path().join("file.bin");
        fs::write(&path, b"abc")?;

        let abc = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert!(manager.verify_file(&path, Some(abc))?);
        assert!(!manager.verify_file(&path, Some("00"))?);
        assert!(manager.verify_file(&path, None)?);
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var(CACHE_ENV_VAR, "/tmp/test-recyclens-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-recyclens-cache/models"));
        env::remove_var(CACHE_ENV_VAR);

        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("recyclens"));
    }

    #[tokio::test]
    #[ignore = "downloads the model over the network"]
    async fn test_model_download() -> Result<(), ModelError> {
        let dir = TempDir::new()?;
        let manager = ModelManager::new(dir.path())?;
        manager.download_model(BuiltinModel::MobileNetV2).await?;
        assert!(manager.verify_model(BuiltinModel::MobileNetV2)?);
        Ok(())
    }
}
