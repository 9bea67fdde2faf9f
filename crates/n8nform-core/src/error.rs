use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("template rendering failed for {template}: {message}")]
    TemplateRender { template: String, message: String },

    #[error("IO error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("invalid deployment config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
