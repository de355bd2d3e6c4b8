//! Error types shared by the collector and its collaborators.

use miette::Diagnostic;
use thiserror::Error;

use crate::artifact::Artifact;

/// A recoverable failure raised by one of the collector's collaborators.
///
/// These attach to the collection result instead of aborting the walk.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum RepositoryError {
    /// Version range resolution failed or produced no usable versions.
    #[error("version range resolution failed for {artifact}: {message}")]
    #[diagnostic(help("Check that the requested range matches a published version"))]
    VersionRange { artifact: Artifact, message: String },

    /// An artifact descriptor could not be read.
    #[error("failed to read descriptor of {artifact}: {message}")]
    DescriptorRead { artifact: Artifact, message: String },

    /// The graph transformer rejected the collected graph.
    #[error("graph transformation failed: {message}")]
    Transform { message: String },
}
