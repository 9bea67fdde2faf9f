//! Google Cloud error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error(
        "{0} not found. Please install the Google Cloud CLI: https://cloud.google.com/sdk/docs/install"
    )]
    GcloudNotFound(String),

    #[error("gcloud {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("could not resolve the active project: {0}")]
    ProjectResolution(String),

    #[error("listing static addresses failed: {0}")]
    ListAddressesFailed(String),

    #[error("creating static address failed: {0}")]
    CreateAddressFailed(String),

    #[error("describing static address failed: {0}")]
    DescribeAddressFailed(String),

    #[error("malformed gcloud response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("no service account matching {0:?} in the project")]
    MissingCredential(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GcpError>;
