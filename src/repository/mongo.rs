//! MongoDB-backed asset repository
//!
//! Asset documents are read from a collection with a cursor; resource content
//! is read from a GridFS bucket. Expected document shape:
//!
//! ```json
//! {
//!   "_id": ObjectId("..."),
//!   "title": "Sunset",
//!   "caption": "Over the lake",
//!   "lastModified": ISODate("..."),
//!   "assetSourceIdentifier": "neos",
//!   "usageCount": 0,
//!   "tags": [{ "label": "nature" }],
//!   "assetCollections": [{ "title": "Holidays" }],
//!   "resource": { "filename": "sunset.jpg", "fileSize": 2048, "fileId": ObjectId("...") }
//! }
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::gridfs::GridFsBucket;
use mongodb::options::GridFsBucketOptions;
use mongodb::{Collection, Cursor, Database};
use serde::Deserialize;
use tokio_util::compat::FuturesAsyncReadCompatExt;
use tracing::{debug, info};

use crate::asset::{AssetCollection, AssetRecord, Resource, Tag};
use crate::error::{ConfigError, Result};

use super::{AssetRepository, AssetStream, ContentStream};

/// Stored form of an asset document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAsset {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    title: String,
    #[serde(default)]
    caption: String,
    last_modified: Option<mongodb::bson::DateTime>,
    asset_source_identifier: Option<String>,
    #[serde(default)]
    usage_count: i64,
    #[serde(default)]
    tags: Vec<StoredTag>,
    #[serde(default)]
    asset_collections: Vec<StoredCollection>,
    resource: Option<StoredResource>,
}

#[derive(Debug, Deserialize)]
struct StoredTag {
    label: String,
}

#[derive(Debug, Deserialize)]
struct StoredCollection {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredResource {
    filename: String,
    #[serde(default)]
    file_size: i64,
    file_id: Bson,
}

/// Repository reading assets from MongoDB and content from GridFS
pub struct MongoAssetRepository {
    assets: Collection<Document>,
    bucket: GridFsBucket,
    batch_size: u32,
}

impl MongoAssetRepository {
    /// Create a new repository
    ///
    /// # Arguments
    /// * `database` - Database holding the asset collection and the bucket
    /// * `collection` - Name of the asset collection
    /// * `bucket` - Name of the GridFS bucket holding resource content
    /// * `batch_size` - Cursor batch size
    pub fn new(database: &Database, collection: &str, bucket: &str, batch_size: u32) -> Self {
        let options = GridFsBucketOptions::builder()
            .bucket_name(bucket.to_string())
            .build();

        Self {
            assets: database.collection::<Document>(collection),
            bucket: database.gridfs_bucket(options),
            batch_size,
        }
    }
}

#[async_trait]
impl AssetRepository for MongoAssetRepository {
    async fn count_all(&self) -> Result<u64> {
        Ok(self.assets.estimated_document_count().await?)
    }

    async fn stream_all(&self) -> Result<Box<dyn AssetStream>> {
        let cursor = self
            .assets
            .find(doc! {})
            .batch_size(self.batch_size)
            .await?;

        Ok(Box::new(CursorAssetStream::new(cursor, self.batch_size)))
    }

    async fn open_content(&self, resource: &Resource) -> Result<ContentStream> {
        let file_id = decode_locator(&resource.locator)?;
        let stream = self.bucket.open_download_stream(file_id).await?;
        Ok(Box::pin(stream.compat()))
    }
}

/// Cursor-based asset stream
///
/// Pulls documents from the cursor in batches and hands them out one at a
/// time, so at most one batch of records is held in memory.
pub struct CursorAssetStream {
    cursor: Option<Cursor<Document>>,
    buffer: VecDeque<AssetRecord>,
    batch_size: u32,
    total_fetched: u64,
    closed: bool,
}

impl CursorAssetStream {
    /// Create a new cursor asset stream
    ///
    /// # Arguments
    /// * `cursor` - Cursor from a find operation on the asset collection
    /// * `batch_size` - Number of documents to pull per refill
    pub fn new(cursor: Cursor<Document>, batch_size: u32) -> Self {
        Self {
            cursor: Some(cursor),
            buffer: VecDeque::with_capacity(batch_size as usize),
            batch_size: batch_size.max(1),
            total_fetched: 0,
            closed: false,
        }
    }

    async fn refill(&mut self) -> Result<()> {
        let cursor = match self.cursor.as_mut() {
            Some(c) => c,
            None => return Ok(()),
        };

        for _ in 0..self.batch_size {
            match cursor.try_next().await {
                Ok(Some(doc)) => self.buffer.push_back(record_from_document(doc)),
                Ok(None) => {
                    debug!(
                        "Asset cursor exhausted after {} documents",
                        self.total_fetched + self.buffer.len() as u64
                    );
                    self.cursor = None;
                    break;
                }
                Err(e) => {
                    // Release the server-side cursor before propagating
                    self.cursor = None;
                    self.closed = true;
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AssetStream for CursorAssetStream {
    async fn next_record(&mut self) -> Result<Option<AssetRecord>> {
        if self.closed {
            return Ok(None);
        }

        if self.buffer.is_empty() {
            self.refill().await?;
        }

        match self.buffer.pop_front() {
            Some(record) => {
                self.total_fetched += 1;
                Ok(Some(record))
            }
            None => {
                self.closed = true;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed || self.cursor.is_some() {
            self.cursor = None;
            self.buffer.clear();
            self.closed = true;
            info!(
                "Closed asset cursor after fetching {} records",
                self.total_fetched
            );
        }
        Ok(())
    }
}

impl Drop for CursorAssetStream {
    fn drop(&mut self) {
        if self.cursor.is_some() {
            debug!("CursorAssetStream dropped without explicit close");
            self.cursor = None;
        }
    }
}

/// Convert a raw document into a record
///
/// Documents that do not match the stored shape become records without a
/// resource, which the pipeline skips as not exportable.
fn record_from_document(doc: Document) -> AssetRecord {
    match mongodb::bson::from_document::<StoredAsset>(doc) {
        Ok(stored) => stored.into(),
        Err(e) => {
            debug!("Skipping undecodable asset document: {}", e);
            AssetRecord::default()
        }
    }
}

impl From<StoredAsset> for AssetRecord {
    fn from(stored: StoredAsset) -> Self {
        let last_modified = stored
            .last_modified
            .and_then(|dt| DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()))
            .unwrap_or_default();

        AssetRecord {
            identifier: bson_identifier(&stored.id),
            title: stored.title,
            caption: stored.caption,
            last_modified,
            asset_source_identifier: stored.asset_source_identifier,
            usage_count: stored.usage_count.max(0) as u64,
            tags: stored.tags.into_iter().map(|t| Tag::new(t.label)).collect(),
            collections: stored
                .asset_collections
                .into_iter()
                .map(|c| AssetCollection::new(c.title))
                .collect(),
            resource: stored.resource.map(|r| Resource {
                filename: r.filename,
                file_size: r.file_size.max(0) as u64,
                locator: encode_locator(r.file_id),
            }),
        }
    }
}

/// Render a document `_id` as an opaque identifier string
fn bson_identifier(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encode a GridFS file id as relaxed extended JSON so it can travel as a
/// plain string locator
fn encode_locator(file_id: Bson) -> String {
    file_id.into_relaxed_extjson().to_string()
}

fn decode_locator(locator: &str) -> Result<Bson> {
    let value: serde_json::Value = serde_json::from_str(locator)?;
    Bson::try_from(value).map_err(|e| {
        ConfigError::InvalidValue {
            field: "resource.fileId".to_string(),
            value: format!("{locator} ({e})"),
        }
        .into()
    })
}
