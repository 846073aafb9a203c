//! Asset exporter
//!
//! Writes an asset's content and its `.meta` sidecar into the export
//! directory. Content is copied in fixed-size chunks so an asset is never
//! held in memory as a whole.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::asset::Asset;
use crate::error::ExportError;
use crate::repository::ContentStream;
use crate::utils::fs::is_plain_file_name;

/// Suffix appended to the content filename for the metadata sidecar
pub const SIDECAR_SUFFIX: &str = ".meta";

const COPY_CHUNK_SIZE: usize = 64 * 1024;

const TEMP_PREFIX: &str = ".media-export.";
const TEMP_SUFFIX: &str = ".partial";

/// How the content file and its sidecar are made visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingPolicy {
    /// Write both files under temporary names and rename them into place only
    /// once both are complete; nothing is left behind on failure
    #[default]
    Atomic,
    /// Write both files in place; a content file stays if its sidecar fails
    Loose,
}

/// How exported files are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilenamePolicy {
    /// Use the resource filename; a later asset with the same filename wins
    #[default]
    Overwrite,
    /// Prefix the resource filename with the asset identifier
    PrefixIdentifier,
}

/// Files written for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFileInfo {
    /// Name of the content file inside the export directory
    pub filename: String,
    /// Name of the sidecar file inside the export directory
    pub sidecar: String,
    /// Declared resource size, not the number of bytes copied
    pub file_size: u64,
}

/// Writes asset pairs into one export directory
pub struct AssetExporter {
    base_dir: PathBuf,
    pairing: PairingPolicy,
    filename_policy: FilenamePolicy,
    bootstrapped: bool,
    /// Filename -> identifier of the asset that last wrote it
    written: HashMap<String, String>,
}

impl AssetExporter {
    /// Create a new exporter
    ///
    /// The directory is not touched until the first export.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            pairing: PairingPolicy::default(),
            filename_policy: FilenamePolicy::default(),
            bootstrapped: false,
            written: HashMap::new(),
        }
    }

    pub fn with_pairing(mut self, pairing: PairingPolicy) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn with_filename_policy(mut self, policy: FilenamePolicy) -> Self {
        self.filename_policy = policy;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the export directory if it does not exist yet
    ///
    /// Runs at most once per exporter; an existing directory is fine.
    pub async fn ensure_export_dir(&mut self) -> Result<(), ExportError> {
        if self.bootstrapped {
            return Ok(());
        }

        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| ExportError::DirectoryBootstrap {
                path: self.base_dir.clone(),
                message: e.to_string(),
            })?;

        debug!("Export directory ready: {}", self.base_dir.display());
        self.bootstrapped = true;
        Ok(())
    }

    /// Name the content file of `asset` will get
    pub fn target_filename(&self, asset: &Asset) -> String {
        match self.filename_policy {
            FilenamePolicy::Overwrite => asset.resource.filename.clone(),
            FilenamePolicy::PrefixIdentifier => {
                format!("{}_{}", asset.identifier, asset.resource.filename)
            }
        }
    }

    /// Export one asset
    ///
    /// # Arguments
    /// * `asset` - Asset to export
    /// * `content` - Open stream over the asset's content
    ///
    /// # Returns
    /// * `Result<ExportedFileInfo, ExportError>` - Written files or the reason
    ///   the asset was not exported
    pub async fn export(
        &mut self,
        asset: &Asset,
        content: ContentStream,
    ) -> Result<ExportedFileInfo, ExportError> {
        self.ensure_export_dir().await?;

        let filename = self.target_filename(asset);
        if !is_plain_file_name(&filename) {
            return Err(ExportError::Write {
                path: self.base_dir.join(&filename),
                message: "filename is not a plain file name".to_string(),
            });
        }

        let sidecar = format!("{filename}{SIDECAR_SUFFIX}");
        let content_path = self.base_dir.join(&filename);
        let sidecar_path = self.base_dir.join(&sidecar);

        let metadata = serde_json::to_vec(&asset.metadata()).map_err(|e| ExportError::Write {
            path: sidecar_path.clone(),
            message: e.to_string(),
        })?;

        match self.pairing {
            PairingPolicy::Atomic => {
                self.write_pair_atomic(asset, content, &content_path, &sidecar_path, &metadata)
                    .await?
            }
            PairingPolicy::Loose => {
                write_content(asset, content, &content_path).await?;
                write_file(&sidecar_path, &metadata).await?;
            }
        }

        if let Some(previous) = self.written.insert(filename.clone(), asset.identifier.clone())
            && previous != asset.identifier
        {
            warn!(
                "Asset {} overwrote {} previously exported for asset {}",
                asset.identifier, filename, previous
            );
        }

        debug!(
            "Exported asset {} to {} ({} bytes declared)",
            asset.identifier,
            content_path.display(),
            asset.resource.file_size
        );

        Ok(ExportedFileInfo {
            filename,
            sidecar,
            file_size: asset.resource.file_size,
        })
    }

    async fn write_pair_atomic(
        &self,
        asset: &Asset,
        content: ContentStream,
        content_path: &Path,
        sidecar_path: &Path,
        metadata: &[u8],
    ) -> Result<(), ExportError> {
        let tag = Uuid::new_v4().simple().to_string();
        let content_tmp = self.temp_path(&tag, "content");
        let sidecar_tmp = self.temp_path(&tag, "meta");

        if let Err(e) = write_content(asset, content, &content_tmp).await {
            remove_quietly(&content_tmp).await;
            return Err(e);
        }

        if let Err(e) = write_file(&sidecar_tmp, metadata).await {
            remove_quietly(&content_tmp).await;
            remove_quietly(&sidecar_tmp).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&content_tmp, content_path).await {
            remove_quietly(&content_tmp).await;
            remove_quietly(&sidecar_tmp).await;
            return Err(ExportError::Write {
                path: content_path.to_path_buf(),
                message: e.to_string(),
            });
        }

        if let Err(e) = fs::rename(&sidecar_tmp, sidecar_path).await {
            // The sidecar at the target may belong to an asset exported
            // earlier under the same filename; it must not outlive the content.
            remove_quietly(&sidecar_tmp).await;
            remove_quietly(content_path).await;
            remove_quietly(sidecar_path).await;
            return Err(ExportError::Write {
                path: sidecar_path.to_path_buf(),
                message: e.to_string(),
            });
        }

        Ok(())
    }

    /// Hidden temporary path, independent of the target name's length
    fn temp_path(&self, tag: &str, kind: &str) -> PathBuf {
        self.base_dir.join(format!("{TEMP_PREFIX}{tag}.{kind}{TEMP_SUFFIX}"))
    }
}

/// Copy the content stream into `path`
///
/// A read failure removes the partly written file.
async fn write_content(
    asset: &Asset,
    mut content: ContentStream,
    path: &Path,
) -> Result<u64, ExportError> {
    let write_error = |e: std::io::Error| ExportError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::create(path).await.map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    let mut chunk = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied = 0u64;

    loop {
        let n = match content.read(&mut chunk).await {
            Ok(n) => n,
            Err(e) => {
                drop(writer);
                remove_quietly(path).await;
                return Err(ExportError::SourceRead {
                    identifier: asset.identifier.clone(),
                    message: e.to_string(),
                });
            }
        };
        if n == 0 {
            break;
        }
        writer.write_all(&chunk[..n]).await.map_err(write_error)?;
        copied += n as u64;
    }

    writer.flush().await.map_err(write_error)?;

    if copied != asset.resource.file_size {
        debug!(
            "Asset {} declared {} bytes but {} were copied",
            asset.identifier, asset.resource.file_size, copied
        );
    }

    Ok(copied)
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    fs::write(path, bytes)
        .await
        .map_err(|e| ExportError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        debug!("Could not remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetCollection, AssetRecord, Resource, Tag};
    use chrono::{TimeZone, Utc};

    fn asset(id: &str, filename: &str, content: &[u8]) -> Asset {
        AssetRecord {
            identifier: id.to_string(),
            title: format!("Title {id}"),
            caption: String::new(),
            last_modified: Utc.with_ymd_and_hms(2023, 12, 6, 11, 39, 48).unwrap(),
            asset_source_identifier: Some("neos".to_string()),
            usage_count: 0,
            tags: vec![Tag::new("nature")],
            collections: vec![AssetCollection::new("Holidays")],
            resource: Some(Resource {
                filename: filename.to_string(),
                file_size: content.len() as u64,
                locator: id.to_string(),
            }),
        }
        .into_exportable()
        .unwrap()
    }

    fn stream(bytes: &[u8]) -> ContentStream {
        Box::pin(std::io::Cursor::new(bytes.to_vec()))
    }

    fn failing_stream(prefix: &[u8]) -> ContentStream {
        let mock = tokio_test::io::Builder::new()
            .read(prefix)
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "blob store went away",
            ))
            .build();
        Box::pin(mock)
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_export_writes_content_and_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let export_dir = tmp.path().join("MediaExport");
        let mut exporter = AssetExporter::new(&export_dir);

        let a = asset("a1", "sunset.jpg", b"JPEGDATA");
        let info = exporter.export(&a, stream(b"JPEGDATA")).await.unwrap();

        assert_eq!(info.filename, "sunset.jpg");
        assert_eq!(info.sidecar, "sunset.jpg.meta");
        assert_eq!(info.file_size, 8);
        assert_eq!(std::fs::read(export_dir.join("sunset.jpg")).unwrap(), b"JPEGDATA");

        let meta: serde_json::Value =
            serde_json::from_slice(&std::fs::read(export_dir.join("sunset.jpg.meta")).unwrap())
                .unwrap();
        assert_eq!(meta["identifier"], "a1");
        assert_eq!(meta["title"], "Title a1");
        assert_eq!(meta["lastModified"], 1701862788);
        assert_eq!(meta["tags"], serde_json::json!(["nature"]));
        assert_eq!(meta["assetCollections"], serde_json::json!(["Holidays"]));

        assert_eq!(dir_entries(&export_dir), vec!["sunset.jpg", "sunset.jpg.meta"]);
    }

    #[tokio::test]
    async fn test_existing_directory_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let mut first = AssetExporter::new(tmp.path());
        first.export(&asset("a", "a.bin", b"a"), stream(b"a")).await.unwrap();

        let mut second = AssetExporter::new(tmp.path());
        second.ensure_export_dir().await.unwrap();
        second.ensure_export_dir().await.unwrap();
        second.export(&asset("b", "b.bin", b"b"), stream(b"b")).await.unwrap();

        assert_eq!(
            dir_entries(tmp.path()),
            vec!["a.bin", "a.bin.meta", "b.bin", "b.bin.meta"]
        );
    }

    #[tokio::test]
    async fn test_same_filename_last_writer_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let mut exporter = AssetExporter::new(tmp.path());

        exporter.export(&asset("a", "logo.png", b"first"), stream(b"first")).await.unwrap();
        exporter.export(&asset("b", "logo.png", b"second"), stream(b"second")).await.unwrap();

        assert_eq!(std::fs::read(tmp.path().join("logo.png")).unwrap(), b"second");
        let meta: serde_json::Value =
            serde_json::from_slice(&std::fs::read(tmp.path().join("logo.png.meta")).unwrap())
                .unwrap();
        assert_eq!(meta["identifier"], "b");
    }

    #[tokio::test]
    async fn test_prefix_identifier_policy_keeps_both() {
        let tmp = tempfile::tempdir().unwrap();
        let mut exporter =
            AssetExporter::new(tmp.path()).with_filename_policy(FilenamePolicy::PrefixIdentifier);

        exporter.export(&asset("a", "logo.png", b"first"), stream(b"first")).await.unwrap();
        exporter.export(&asset("b", "logo.png", b"second"), stream(b"second")).await.unwrap();

        assert_eq!(
            dir_entries(tmp.path()),
            vec!["a_logo.png", "a_logo.png.meta", "b_logo.png", "b_logo.png.meta"]
        );
    }

    #[tokio::test]
    async fn test_read_failure_leaves_nothing_behind() {
        for pairing in [PairingPolicy::Atomic, PairingPolicy::Loose] {
            let tmp = tempfile::tempdir().unwrap();
            let mut exporter = AssetExporter::new(tmp.path()).with_pairing(pairing);

            let err = exporter
                .export(&asset("a", "broken.bin", b"abcdef"), failing_stream(b"abc"))
                .await
                .unwrap_err();

            assert!(matches!(err, ExportError::SourceRead { .. }), "{pairing:?}");
            assert!(dir_entries(tmp.path()).is_empty(), "{pairing:?}");
        }
    }

    #[tokio::test]
    async fn test_long_filename_exports_in_both_pairings() {
        let filename = format!("{}.jpg", "n".repeat(226));
        assert_eq!(filename.len(), 230);

        for pairing in [PairingPolicy::Atomic, PairingPolicy::Loose] {
            let tmp = tempfile::tempdir().unwrap();
            let mut exporter = AssetExporter::new(tmp.path()).with_pairing(pairing);

            let info = exporter
                .export(&asset("a", &filename, b"data"), stream(b"data"))
                .await
                .unwrap();

            assert_eq!(info.filename, filename, "{pairing:?}");
            assert_eq!(std::fs::read(tmp.path().join(&filename)).unwrap(), b"data");
            assert_eq!(
                dir_entries(tmp.path()),
                vec![filename.clone(), format!("{filename}.meta")],
                "{pairing:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_atomic_sidecar_failure_leaves_neither_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory in the sidecar's place makes its rename fail
        std::fs::create_dir(tmp.path().join("clip.mp4.meta")).unwrap();
        let mut exporter = AssetExporter::new(tmp.path()).with_pairing(PairingPolicy::Atomic);

        let err = exporter
            .export(&asset("a", "clip.mp4", b"video"), stream(b"video"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Write { .. }));
        assert!(!err.is_fatal());
        assert_eq!(dir_entries(tmp.path()), vec!["clip.mp4.meta"]);
        assert!(tmp.path().join("clip.mp4.meta").is_dir());
    }

    #[tokio::test]
    async fn test_loose_sidecar_failure_keeps_content() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("clip.mp4.meta")).unwrap();
        let mut exporter = AssetExporter::new(tmp.path()).with_pairing(PairingPolicy::Loose);

        let err = exporter
            .export(&asset("a", "clip.mp4", b"video"), stream(b"video"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Write { .. }));
        assert_eq!(std::fs::read(tmp.path().join("clip.mp4")).unwrap(), b"video");
        assert_eq!(dir_entries(tmp.path()), vec!["clip.mp4", "clip.mp4.meta"]);
    }

    #[tokio::test]
    async fn test_path_like_filename_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let export_dir = tmp.path().join("out");
        let mut exporter = AssetExporter::new(&export_dir);

        let err = exporter
            .export(&asset("a", "../escape.bin", b"x"), stream(b"x"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Write { .. }));
        assert!(!tmp.path().join("escape.bin").exists());
        assert!(dir_entries(&export_dir).is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_base_dir_is_bootstrap_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let mut exporter = AssetExporter::new(blocker.join("MediaExport"));
        let err = exporter
            .export(&asset("a", "a.bin", b"a"), stream(b"a"))
            .await
            .unwrap_err();

        assert!(err.is_fatal());
    }
}
