//! Status - 運用向けのスナップショット
//!
//! `/status` と `/health` に相当する payload。
//! 正しさには使わない（一覧は作成順で最大 N 件に切る）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StashConfig;
use crate::domain::{BlobId, SUPPORTED_EXTENSIONS};
use crate::ports::BlobStore;

const SECS_PER_HOUR: f64 = 3600.0;

/// 一覧に載せる 1 件分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: BlobId,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub expires_in_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_file_size_bytes: u64,
    pub file_expiry_secs: u64,
    pub supported_formats: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    pub files_count: usize,
    pub total_size_bytes: u64,
    pub files: Vec<FileSummary>,
    pub limits: Limits,
    pub timestamp: DateTime<Utc>,
}

impl StatusReport {
    /// ストアの現在の中身から作る（lazy sweep が走る）
    pub fn collect<S: BlobStore + ?Sized>(store: &S, config: &StashConfig, now: DateTime<Utc>) -> Self {
        let stats = store.stats();
        let files = store
            .list(config.status_file_limit)
            .into_iter()
            .map(|info| FileSummary {
                expires_in_hours: info.expires_in(now).as_secs_f64() / SECS_PER_HOUR,
                id: info.id,
                filename: info.filename,
                content_type: info.content_type,
                size_bytes: info.size_bytes,
            })
            .collect();

        Self {
            status: "operational".to_string(),
            files_count: stats.count,
            total_size_bytes: stats.total_bytes,
            files,
            limits: Limits {
                max_file_size_bytes: config.max_file_size_bytes,
                file_expiry_secs: config.file_expiry_secs,
                supported_formats: SUPPORTED_EXTENSIONS.len(),
            },
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub storage_count: usize,
}

impl Health {
    pub fn collect<S: BlobStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now,
            storage_count: store.stats().count,
        }
    }
}
