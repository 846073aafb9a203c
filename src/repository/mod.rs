//! Asset repository abstractions
//!
//! The export pipeline never talks to a database directly. It sees a
//! repository through two traits:
//!
//! 1. **AssetRepository**: counts assets, opens a record stream and opens the
//!    content of a single resource
//! 2. **AssetStream**: a lazy, forward-only sequence of records pulled one at
//!    a time
//!
//! Two adapters are provided: [`MongoAssetRepository`] (asset documents in a
//! collection, content in a GridFS bucket) and [`InMemoryAssetRepository`].

use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::asset::{AssetRecord, Resource};
use crate::error::Result;

pub mod memory;
pub mod mongo;

pub use memory::InMemoryAssetRepository;
pub use mongo::MongoAssetRepository;

/// Readable byte stream over a resource's content
pub type ContentStream = Pin<Box<dyn AsyncRead + Send>>;

/// Lazy, finite, forward-only sequence of asset records
#[async_trait]
pub trait AssetStream: Send {
    /// Fetch the next record
    ///
    /// # Returns
    /// * `Result<Option<AssetRecord>>` - Next record, or None if exhausted
    async fn next_record(&mut self) -> Result<Option<AssetRecord>>;

    /// Close the stream and release server resources
    async fn close(&mut self) -> Result<()>;
}

/// Read access to a managed asset repository
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Best-effort number of assets, used to size progress output only
    async fn count_all(&self) -> Result<u64>;

    /// Open a stream over all asset records
    async fn stream_all(&self) -> Result<Box<dyn AssetStream>>;

    /// Open the content of a resource for reading
    async fn open_content(&self, resource: &Resource) -> Result<ContentStream>;
}
