//! Asset data model
//!
//! Records come out of the repository as [`AssetRecord`]s, which mirror what
//! is stored and may be incomplete. The export pipeline only ever works with
//! [`Asset`], obtained through [`AssetRecord::into_exportable`].

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A tag attached to an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub label: String,
}

impl Tag {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A collection an asset belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCollection {
    pub title: String,
}

impl AssetCollection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Where the binary content of a resource lives
///
/// The meaning of `locator` belongs to the repository that produced the record
/// (a GridFS file id, an in-memory key, ...). Only that repository can open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Original filename, used as the exported file name
    pub filename: String,
    /// Declared size in bytes
    pub file_size: u64,
    /// Repository-specific content locator
    pub locator: String,
}

/// An asset record as yielded by a repository
#[derive(Debug, Clone, Default)]
pub struct AssetRecord {
    pub identifier: String,
    pub title: String,
    pub caption: String,
    pub last_modified: DateTime<Utc>,
    pub asset_source_identifier: Option<String>,
    pub usage_count: u64,
    pub tags: Vec<Tag>,
    pub collections: Vec<AssetCollection>,
    pub resource: Option<Resource>,
}

/// A well-formed asset that can be exported
#[derive(Debug, Clone)]
pub struct Asset {
    pub identifier: String,
    pub title: String,
    pub caption: String,
    pub last_modified: DateTime<Utc>,
    pub asset_source_identifier: String,
    pub usage_count: u64,
    pub tags: Vec<Tag>,
    pub collections: Vec<AssetCollection>,
    pub resource: Resource,
}

impl AssetRecord {
    /// Convert into an exportable asset
    ///
    /// Returns `None` for records without a resource or without an asset
    /// source identifier.
    pub fn into_exportable(self) -> Option<Asset> {
        let asset_source_identifier = self
            .asset_source_identifier
            .filter(|source| !source.is_empty())?;
        let resource = self.resource?;

        Some(Asset {
            identifier: self.identifier,
            title: self.title,
            caption: self.caption,
            last_modified: self.last_modified,
            asset_source_identifier,
            usage_count: self.usage_count,
            tags: self.tags,
            collections: self.collections,
            resource,
        })
    }
}

impl Asset {
    /// Tag labels in the order they are attached
    pub fn tag_labels(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.label.clone()).collect()
    }

    /// Collection titles in the order they are attached
    pub fn collection_titles(&self) -> Vec<String> {
        self.collections
            .iter()
            .map(|collection| collection.title.clone())
            .collect()
    }

    /// Whether nothing else references this asset
    pub fn is_unused(&self) -> bool {
        self.usage_count == 0
    }

    /// Build the metadata written next to the exported content
    pub fn metadata(&self) -> AssetMetadata {
        AssetMetadata {
            identifier: self.identifier.clone(),
            title: self.title.clone(),
            caption: self.caption.clone(),
            last_modified: self.last_modified.timestamp(),
            tags: self.tag_labels(),
            asset_collections: self.collection_titles(),
        }
    }
}

/// Content of a `.meta` sidecar file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub identifier: String,
    pub title: String,
    pub caption: String,
    /// Seconds since the Unix epoch
    pub last_modified: i64,
    pub tags: Vec<String>,
    pub asset_collections: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> AssetRecord {
        AssetRecord {
            identifier: "a1".to_string(),
            title: "Sunset".to_string(),
            caption: "Over the lake".to_string(),
            last_modified: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            asset_source_identifier: Some("neos".to_string()),
            usage_count: 0,
            tags: vec![Tag::new("nature"), Tag::new("lake")],
            collections: vec![AssetCollection::new("Holidays")],
            resource: Some(Resource {
                filename: "sunset.jpg".to_string(),
                file_size: 2048,
                locator: "blob-1".to_string(),
            }),
        }
    }

    #[test]
    fn test_well_formed_record_is_exportable() {
        let asset = record().into_exportable().unwrap();
        assert_eq!(asset.asset_source_identifier, "neos");
        assert_eq!(asset.resource.filename, "sunset.jpg");
    }

    #[test]
    fn test_record_without_resource_is_not_exportable() {
        let mut rec = record();
        rec.resource = None;
        assert!(rec.into_exportable().is_none());
    }

    #[test]
    fn test_record_without_asset_source_is_not_exportable() {
        let mut rec = record();
        rec.asset_source_identifier = None;
        assert!(rec.clone().into_exportable().is_none());

        rec.asset_source_identifier = Some(String::new());
        assert!(rec.into_exportable().is_none());
    }

    #[test]
    fn test_metadata_serializes_with_original_keys() {
        let asset = record().into_exportable().unwrap();
        let json = serde_json::to_value(asset.metadata()).unwrap();

        assert_eq!(json["identifier"], "a1");
        assert_eq!(json["title"], "Sunset");
        assert_eq!(json["caption"], "Over the lake");
        assert_eq!(json["lastModified"], 1709294400);
        assert_eq!(json["tags"], serde_json::json!(["nature", "lake"]));
        assert_eq!(json["assetCollections"], serde_json::json!(["Holidays"]));
    }
}
