//! Where external buffers and images come from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{LoadError, Result};

/// Retrieves the bytes behind a resource URI.
///
/// The loader awaits one fetch at a time; implementations may suspend (a
/// network request) or complete immediately (a local read).
#[allow(async_fn_in_trait)]
pub trait ResourceFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Reads resources from the filesystem, relative to a base directory.
#[derive(Clone, Debug, Default)]
pub struct FileFetcher {
    base: PathBuf,
}

impl FileFetcher {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl ResourceFetcher for FileFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.base.join(uri);
        debug!("[gltf] reading {}", path.display());
        std::fs::read(&path).map_err(|err| LoadError::fetch(uri, err))
    }
}

/// Serves resources from memory, keyed by URI.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a resource; returns `self` for chaining.
    pub fn with(mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(uri, bytes);
        self
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.resources.insert(uri.into(), bytes.into());
    }
}

impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        self.resources
            .get(uri)
            .cloned()
            .ok_or_else(|| LoadError::fetch(uri, "no such resource"))
    }
}
