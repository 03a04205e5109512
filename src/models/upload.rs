use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::enums::MediaType;

/// Declared type used when the picker cannot infer one.
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// A file as the user picked it: name, declared media type, raw bytes.
/// Nothing has been decoded or validated yet.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub declared_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(
        file_name: impl Into<String>,
        declared_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            declared_type: declared_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its type from the extension the way
    /// a browser file picker does.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let declared_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(UNKNOWN_MEDIA_TYPE)
            .to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, declared_type, bytes))
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// An uploaded image that decoded successfully.
///
/// Immutable: the bytes are shared so in-flight requests can hold a cheap
/// clone while the workflow keeps its own.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    id: Uuid,
    file_name: String,
    media_type: MediaType,
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl ImageAsset {
    pub(crate) fn new(file: SelectedFile, media_type: MediaType, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file.file_name,
            media_type,
            bytes: file.bytes.into(),
            width,
            height,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            media_type: self.media_type.as_str(),
            width: self.width,
            height: self.height,
            size_bytes: self.bytes.len(),
        }
    }
}

/// Serializable view of an asset (no pixel data).
#[derive(Debug, Clone, Serialize)]
pub struct AssetSummary {
    pub id: Uuid,
    pub file_name: String,
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}
