//! Errors produced while loading glTF/GLB assets.
//!
//! Every failure is fatal to the load that produced it: the loader propagates
//! the first error it meets and never hands out a partially built
//! [`Model`](crate::Model).

use thiserror::Error;

/// Errors that can occur when loading a model.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Bad GLB header, missing JSON chunk, or references that point outside
    /// the data the file actually contains.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// A primitive lacks a mandatory accessor (POSITION or indices).
    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    /// Component type, element shape or primitive feature outside the
    /// supported set.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A buffer or image could not be retrieved or decoded.
    #[error("failed to fetch '{uri}': {reason}")]
    ResourceFetchFailed { uri: String, reason: String },

    /// The JSON scene description could not be parsed.
    #[error("JSON parse error: {0}")]
    ParseFailed(#[from] serde_json::Error),

    /// A node was reached again while already on the traversal path.
    #[error("scene graph cycle through node {0}")]
    SceneGraphCycle(usize),
}

impl LoadError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        LoadError::MalformedContainer(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        LoadError::UnsupportedFormat(msg.into())
    }

    pub(crate) fn fetch(uri: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::ResourceFetchFailed {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
