//! Repository descriptions the collector works against.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A remote artifact repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub id: String,
    pub url: String,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl fmt::Display for RemoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

/// A local store artifacts may be resolved from instead of a remote
/// repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalRepository {
    pub path: PathBuf,
}

impl LocalRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// The repository a concrete version was discovered in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactRepository {
    Remote(RemoteRepository),
    Local(LocalRepository),
}
