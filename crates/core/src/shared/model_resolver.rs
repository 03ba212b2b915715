use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{MODEL_CACHE_DIR_NAME, WHISPER_MODEL_BASE_URL};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model not found at {0}")]
    NotFound(PathBuf),
    #[error("invalid model name '{0}': expected a file path or a name like 'base' or 'small.en'")]
    InvalidName(String),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download interrupted for {url}: {source}")]
    Transfer {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// How a `--model` value is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReference {
    /// A local model file.
    Path(PathBuf),
    /// A published whisper.cpp model, e.g. `base` or `large-v3`.
    Named(String),
}

impl ModelReference {
    pub fn parse(model: &str) -> Result<Self, ModelResolveError> {
        let trimmed = model.trim();
        let path = Path::new(trimmed);
        if path.is_file() {
            return Ok(Self::Path(path.to_path_buf()));
        }
        if trimmed.contains('/') || trimmed.contains('\\') || trimmed.ends_with(".bin") {
            return Err(ModelResolveError::NotFound(path.to_path_buf()));
        }
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(ModelResolveError::InvalidName(model.to_string()));
        }
        Ok(Self::Named(trimmed.to_string()))
    }
}

/// File name whisper.cpp publishes a named model under.
pub fn model_file_name(name: &str) -> String {
    format!("ggml-{name}.bin")
}

/// Resolve a `--model` value to a local model file, downloading into the
/// user cache when a model name is not cached yet.
pub fn resolve(model: &str, progress: Option<ProgressFn>) -> Result<PathBuf, ModelResolveError> {
    match ModelReference::parse(model)? {
        ModelReference::Path(path) => Ok(path),
        ModelReference::Named(name) => {
            resolve_named(&name, &model_cache_dir()?, WHISPER_MODEL_BASE_URL, progress)
        }
    }
}

/// Resolve a named model against an explicit cache directory and mirror.
///
/// Resolution order:
/// 1. `<cache_dir>/ggml-<name>.bin`
/// 2. Download from `<base_url>/ggml-<name>.bin` to the cache
pub fn resolve_named(
    name: &str,
    cache_dir: &Path,
    base_url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let file_name = model_file_name(name);
    let cached_path = cache_dir.join(&file_name);
    if cached_path.is_file() {
        log::info!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    let url = format!("{}/{file_name}", base_url.trim_end_matches('/'));
    log::info!("Downloading model '{name}' from {url}");
    download(&url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/transcribe-worker/models/`
/// - Linux: `$XDG_CACHE_HOME/transcribe-worker/models/` or `~/.cache/transcribe-worker/models/`
/// - Windows: `%LOCALAPPDATA%/transcribe-worker/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(MODEL_CACHE_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let result = download_to(url, &temp_path, progress).and_then(|()| {
        fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            log::warn!("Failed to clean up {}: {e}", temp_path.display());
        }
    }
    result
}

fn download_to(
    url: &str,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let download_err = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };
    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    let mut chunk = vec![0u8; 1024 * 1024];
    loop {
        let n = response
            .read(&mut chunk)
            .map_err(|e| ModelResolveError::Transfer {
                url: url.to_string(),
                source: e,
            })?;
        if n == 0 {
            break;
        }
        file.write_all(&chunk[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    Ok(())
}
