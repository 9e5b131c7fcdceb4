//! Error types for gluecodec
//!
//! Centralized error handling using thiserror. Protocol operations never
//! fail hard (they degrade to empty results); these errors surface only at
//! I/O boundaries such as framing and catalog loading.

use thiserror::Error;

/// All error types that can occur in gluecodec
#[derive(Debug, Error)]
pub enum GlueError {
    /// Text could not be parsed as the expected grammar element
    #[error("Parse error: {0}")]
    Parse(String),

    /// Byte stream framing violated (length prefix, size limit, encoding)
    #[error("Frame error: {0}")]
    Frame(String),

    /// Descriptor payload breaks a structural rule
    #[error("Descriptor invariant violated: {0}")]
    Descriptor(String),

    /// Catalog document is inconsistent
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for gluecodec operations
pub type Result<T> = std::result::Result<T, GlueError>;
