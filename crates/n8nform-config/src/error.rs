use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    ConfigDirNotFound,

    #[error(
        "settings file not found. n8nform looks in:\n\
        - the N8NFORM_CONFIG environment variable\n\
        - current directory: n8nform.local.yaml, n8nform.yaml, .n8nform.yaml\n\
        - ~/.config/n8nform/config.yaml"
    )]
    SettingsFileNotFound,

    #[error("settings file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
