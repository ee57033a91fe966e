//! Turns file-like inputs into raw byte buffers.
//!
//! Every source is read concurrently, but the buffers come back in input
//! order. One failing or empty source fails the whole batch and nothing that
//! was already read is kept.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::error::ReadError;

/// Anything that can hand over all of its bytes once, asynchronously
pub trait ByteSource {
    /// Human readable name used in error messages
    fn name(&self) -> String;

    fn read_all(self) -> impl Future<Output = std::io::Result<Vec<u8>>>;
}

/// Bytes that are already in memory, e.g. from a network fetch
#[derive(Debug, Clone)]
pub struct NamedBuffer {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl NamedBuffer {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl ByteSource for NamedBuffer {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn read_all(self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes)
    }
}

/// A file picked from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ByteSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn read_all(self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// One entry of a drag-and-drop payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedItem {
    File(PathBuf),
    Directory(PathBuf),
}

/// Keeps the files of a drop payload in order; directories are not descended into
pub fn dropped_files(items: impl IntoIterator<Item = DroppedItem>) -> Vec<FileSource> {
    items
        .into_iter()
        .filter_map(|item| match item {
            DroppedItem::File(path) => Some(FileSource::new(path)),
            DroppedItem::Directory(path) => {
                info!("Skipping dropped directory {}", path.display());
                None
            }
        })
        .collect()
}

/// Collects the ".dcm" files of a directory, sorted by path
pub fn sources_from_directory(path: impl AsRef<Path>) -> std::io::Result<Vec<FileSource>> {
    let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
        })
        .collect();
    paths.sort();

    Ok(paths.into_iter().map(FileSource::new).collect())
}

/// Reads all sources into buffers, preserving input order
pub async fn ingest<S: ByteSource>(
    sources: impl IntoIterator<Item = S>,
) -> Result<Vec<Vec<u8>>, ReadError> {
    let reads = sources.into_iter().map(|source| async move {
        let source_name = source.name();
        let bytes = source
            .read_all()
            .await
            .map_err(|source| ReadError::Io {
                source_name: source_name.clone(),
                source,
            })?;
        if bytes.is_empty() {
            return Err(ReadError::Empty { source_name });
        }
        Ok(bytes)
    });

    let buffers = try_join_all(reads).await?;
    debug!("Ingested {} buffers", buffers.len());
    Ok(buffers)
}
