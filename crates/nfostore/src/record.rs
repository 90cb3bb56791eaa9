//! Records describing an artifact group.
//!
//! A group is stored as a handful of blobs sharing ids: the rendered image,
//! the optional raw payload, and one JSON record. The record holds the
//! display fields, the ordered sidecar list and the eviction deadline. It is
//! written last, so its presence means every other blob of the group exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ArtifactId;

/// The kinds of blob a group or sidecar can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    /// Rendered PNG.
    Image,
    /// Decoded text exactly as submitted.
    Raw,
    /// JSON `GroupRecord`.
    Record,
}

impl BlobKind {
    pub fn extension(&self) -> &'static str {
        match self {
            BlobKind::Image => "png",
            BlobKind::Raw => "nfo",
            BlobKind::Record => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            BlobKind::Image => "image/png",
            BlobKind::Raw => "application/octet-stream",
            BlobKind::Record => "application/json",
        }
    }
}

/// A checksum listing (or any secondary text) attached to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarEntry {
    pub id: ArtifactId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Everything known about a group besides its blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: ArtifactId,
    pub release: String,
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Whether the raw payload was persisted.
    pub has_raw: bool,

    /// Sidecars in submission order.
    #[serde(default)]
    pub sidecars: Vec<SidecarEntry>,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GroupRecord {
    /// Every blob this group owns, record first.
    pub fn owned_blobs(&self) -> Vec<(ArtifactId, BlobKind)> {
        let mut blobs = vec![
            (self.id.clone(), BlobKind::Record),
            (self.id.clone(), BlobKind::Image),
        ];
        if self.has_raw {
            blobs.push((self.id.clone(), BlobKind::Raw));
        }
        for sidecar in &self.sidecars {
            blobs.push((sidecar.id.clone(), BlobKind::Image));
            blobs.push((sidecar.id.clone(), BlobKind::Raw));
        }
        blobs
    }

    pub fn sidecar(&self, id: &ArtifactId) -> Option<&SidecarEntry> {
        self.sidecars.iter().find(|s| &s.id == id)
    }

    pub fn sidecar_ids(&self) -> Vec<ArtifactId> {
        self.sidecars.iter().map(|s| s.id.clone()).collect()
    }
}
