use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("malformed data URL: {message}")]
    DataUrl { message: String },

    #[error("raster {width}x{height} expects {expected} bytes, got {actual}")]
    InvalidRaster {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("no mesh to export")]
    NoMesh,

    #[error("no data directory available")]
    NoDataDir,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GPU setup failed: {message}")]
    Gpu { message: String },
}

impl ViewerError {
    #[must_use]
    pub fn data_url(message: impl Into<String>) -> Self {
        Self::DataUrl {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn gpu(message: impl Into<String>) -> Self {
        Self::Gpu {
            message: message.into(),
        }
    }
}
