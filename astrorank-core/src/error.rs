///! Error taxonomy shared by every core component
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AstroError>;

#[derive(Debug, Error)]
pub enum AstroError {
    /// Missing directory or file
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Directory exists but holds no catalog images
    #[error("no .jpg files found in {}", .0.display())]
    EmptyCatalog(PathBuf),

    /// Malformed persisted line or unparseable coordinate
    #[error("parse error: {0}")]
    Parse(String),

    /// Value outside the configured rank set
    #[error("invalid rank '{value}', expected one of: {accepted}")]
    InvalidRank { value: String, accepted: String },

    /// Network, HTTP or timeout failure while fetching a secondary image
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Raster with an unexpected shape or encoding
    #[error("format error: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
