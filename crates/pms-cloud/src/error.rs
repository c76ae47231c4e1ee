//! Resource graph error types

use thiserror::Error;

/// Errors raised while declaring or synthesizing a resource graph
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource already exists in stack '{stack}': {logical_id}")]
    ResourceAlreadyExists { stack: String, logical_id: String },

    #[error("Output already exists in stack '{stack}': {name}")]
    OutputAlreadyExists { stack: String, name: String },

    #[error("Export name already in use: {0}")]
    ExportAlreadyExists(String),

    #[error("Stack already exists: {0}")]
    StackAlreadyExists(String),

    #[error("Stack '{stack}' depends on '{dependency}', which is not part of the app")]
    MissingDependency { stack: String, dependency: String },

    #[error("Circular stack dependency detected: {0}")]
    CircularDependency(String),

    #[error("Invalid resource properties for {resource_type}: {message}")]
    InvalidProperties {
        resource_type: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Assembly error: {0}")]
    AssemblyError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
