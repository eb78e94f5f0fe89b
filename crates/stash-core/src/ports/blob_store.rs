//! BlobStore port - 一時 Blob ストレージ
//!
//! BlobStore は upload / 変換結果のバイト列を期限付きで保持します。
//!
//! # 設計原則
//! - TTL（expires_at）必須。削除 API はなく、期限切れでのみ消える
//! - すべての操作は同期・メモリ内で完結する（I/O も await もない）
//! - 各操作の冒頭で lazy sweep を行い、期限切れを先に取り除く
//! - 定期 sweep（SweepLoop）と同じ判定（`BlobRecord::is_expired_at`）を使う

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::{BlobId, BlobInfo, BlobRecord, Metadata, StoreError, Ttl};

/// `put` の入力
///
/// # 使用例
/// ```ignore
/// let req = PutRequest::new(bytes, "report.pdf")
///     .with_content_type("application/pdf")
///     .with_ttl(Ttl::hours(1).unwrap());
/// let id = store.put(req)?;
/// ```
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub content: Bytes,
    /// 提出されたままのファイル名（ストア側で sanitize する）
    pub filename: String,
    /// None のときは Classifier で推定する
    pub content_type: Option<String>,
    /// None のときはストアの既定 TTL
    pub ttl: Option<Ttl>,
    pub metadata: Metadata,
}

impl PutRequest {
    pub fn new(content: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            content_type: None,
            ttl: None,
            metadata: Metadata::new(),
        }
    }

    /// 空文字列は「指定なし」と同じ扱い
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.content_type = (!content_type.trim().is_empty()).then_some(content_type);
        self
    }

    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 生存中の Blob の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub count: usize,
    pub total_bytes: u64,
}

/// BlobStore は期限付きの Blob を保持する
///
/// # Thread Safety
/// - `Send + Sync` を要求（リクエスト処理スレッドと SweepLoop から共有される）
pub trait BlobStore: Send + Sync {
    /// 保存して新しい ID を返す。上限超過は `TooLarge`
    fn put(&self, req: PutRequest) -> Result<BlobId, StoreError>;

    /// 中身ごと取得。`NotFound` / `Expired`
    fn get(&self, id: BlobId) -> Result<BlobRecord, StoreError>;

    /// 中身なしで取得。エラーは `get` と同じ
    fn info(&self, id: BlobId) -> Result<BlobInfo, StoreError>;

    /// 生存中の Blob を最大 `limit` 件（作成順）
    fn list(&self, limit: usize) -> Vec<BlobInfo>;

    /// 生存中の Blob の件数と合計サイズ
    fn stats(&self) -> StoreStats;

    /// 期限切れを削除して、削除した件数を返す
    fn sweep_expired(&self) -> usize;

    /// テーブル上の件数（sweep しない）
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
