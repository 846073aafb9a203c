//! In-memory asset repository
//!
//! Holds records and content blobs in memory. Useful for embedding the
//! pipeline and for exercising it without a database; content reads can be
//! made to fail part-way through to simulate broken storage.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::asset::{AssetRecord, Resource};
use crate::error::{ExportError, Result};

use super::{AssetRepository, AssetStream, ContentStream};

/// Repository backed by in-memory records and blobs
#[derive(Debug, Default, Clone)]
pub struct InMemoryAssetRepository {
    records: Vec<AssetRecord>,
    contents: HashMap<String, Vec<u8>>,
    /// Locator -> number of bytes served before the read fails
    broken: HashMap<String, usize>,
    reported_count: Option<u64>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record and, if it has a resource, the content behind it
    pub fn with_asset(mut self, record: AssetRecord, content: impl Into<Vec<u8>>) -> Self {
        if let Some(resource) = &record.resource {
            self.contents
                .insert(resource.locator.clone(), content.into());
        }
        self.records.push(record);
        self
    }

    /// Make reads of `locator` fail after `after_bytes` bytes
    pub fn with_broken_content(mut self, locator: impl Into<String>, after_bytes: usize) -> Self {
        self.broken.insert(locator.into(), after_bytes);
        self
    }

    /// Override the count returned by `count_all`, e.g. to model a stale count
    pub fn with_reported_count(mut self, count: u64) -> Self {
        self.reported_count = Some(count);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn count_all(&self) -> Result<u64> {
        Ok(self
            .reported_count
            .unwrap_or(self.records.len() as u64))
    }

    async fn stream_all(&self) -> Result<Box<dyn AssetStream>> {
        Ok(Box::new(MemoryAssetStream {
            records: self.records.clone().into_iter(),
        }))
    }

    async fn open_content(&self, resource: &Resource) -> Result<ContentStream> {
        let content = self.contents.get(&resource.locator).ok_or_else(|| {
            ExportError::SourceRead {
                identifier: resource.locator.clone(),
                message: "no content stored for locator".to_string(),
            }
        })?;

        match self.broken.get(&resource.locator) {
            Some(&after) => {
                let served = content[..after.min(content.len())].to_vec();
                Ok(Box::pin(io::Cursor::new(served).chain(BrokenReader)))
            }
            None => Ok(Box::pin(io::Cursor::new(content.clone()))),
        }
    }
}

/// Stream over a snapshot of the repository's records
pub struct MemoryAssetStream {
    records: std::vec::IntoIter<AssetRecord>,
}

#[async_trait]
impl AssetStream for MemoryAssetStream {
    async fn next_record(&mut self) -> Result<Option<AssetRecord>> {
        Ok(self.records.next())
    }

    async fn close(&mut self) -> Result<()> {
        self.records = Vec::new().into_iter();
        Ok(())
    }
}

/// Reader that always fails
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "storage connection dropped",
        )))
    }
}
