//! Blob record: content + metadata + expiry.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::ids::BlobId;

/// Metadata attached to a blob at creation (never mutated afterward).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Time-to-live of a blob.
///
/// Always strictly positive, so `expires_at > created_at` holds for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(TimeDelta);

impl Ttl {
    /// Longest accepted TTL (100 years).
    pub const MAX_SECS: u64 = 100 * 365 * 24 * 3600;

    /// Returns `None` for zero or for anything above [`Ttl::MAX_SECS`].
    pub fn from_std(duration: Duration) -> Option<Self> {
        if duration.is_zero() || duration > Duration::from_secs(Self::MAX_SECS) {
            return None;
        }
        TimeDelta::from_std(duration).ok().map(Self)
    }

    pub fn from_secs(secs: u64) -> Option<Self> {
        Self::from_std(Duration::from_secs(secs))
    }

    pub fn hours(hours: u32) -> Option<Self> {
        Self::from_secs(u64::from(hours) * 3600)
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    pub fn as_std(&self) -> Duration {
        // TimeDelta is positive by construction
        self.0.to_std().unwrap_or_default()
    }
}

/// The unit of storage.
///
/// Fields are private: a record is built once by [`BlobRecord::new`] and is
/// immutable afterward. `content` is a [`Bytes`] handle, so cloning a record
/// hands out a read-only view of the stored bytes.
#[derive(Debug, Clone)]
pub struct BlobRecord {
    id: BlobId,
    content: Bytes,
    filename: String,
    original_filename: String,
    content_type: String,
    size_bytes: u64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    metadata: Metadata,
}

/// Naming information of a record (sanitized + as submitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobName {
    pub filename: String,
    pub original_filename: String,
}

impl BlobRecord {
    pub fn new(
        id: BlobId,
        content: Bytes,
        name: BlobName,
        content_type: String,
        created_at: DateTime<Utc>,
        ttl: Ttl,
        metadata: Metadata,
    ) -> Self {
        let size_bytes = content.len() as u64;
        Self {
            id,
            content,
            filename: name.filename,
            original_filename: name.original_filename,
            content_type,
            size_bytes,
            created_at,
            // 時計が chrono の上限付近にある場合だけ飽和する
            expires_at: created_at
                .checked_add_signed(ttl.as_delta())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            metadata,
        }
    }

    pub fn id(&self) -> BlobId {
        self.id
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Single removal predicate shared by the lazy and periodic sweeps.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Metadata-only view.
    pub fn info(&self) -> BlobInfo {
        BlobInfo {
            id: self.id,
            filename: self.filename.clone(),
            original_filename: self.original_filename.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            expires_at: self.expires_at,
            metadata: self.metadata.clone(),
        }
    }
}

/// Everything about a blob except its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub id: BlobId,
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl BlobInfo {
    /// Time left before expiry, zero once expired.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or_default()
    }
}
