use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Network handle from {stack} is not a VPC (found {found})")]
    NetworkTypeMismatch { stack: String, found: String },

    #[error("Invalid context argument '{0}': expected key=value")]
    InvalidContextArg(String),

    #[error("Failed to read context file {path}: {source}")]
    ContextFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed context file {path}: {message}")]
    ContextFileFormat { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Cloud(#[from] pms_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, InfraError>;
