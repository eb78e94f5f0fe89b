//! InMemoryBlobStore - メモリ上の一時 Blob ストア
//!
//! # 実装詳細
//! - テーブル全体を 1 つの Mutex で守る（操作ごとに 1 回だけ lock）
//! - `now` は lock を取った後に読む。sweep と insert の間で時刻がずれない
//! - 期限順のインデックス（BTreeSet）で、sweep は期限切れの件数分だけ働く
//! - 掃除した ID は tombstone として一定期間残す。
//!   後から `get` されても `NotFound` ではなく `Expired` を返せる

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use crate::classify::Classifier;
use crate::config::StoreConfig;
use crate::domain::{BlobId, BlobInfo, BlobName, BlobRecord, StoreError};
use crate::ports::{BlobStore, Clock, IdGenerator, PutRequest, StoreStats, SystemClock, UlidGenerator};
use crate::sanitize::Sanitizer;

/// Mutex の内側
#[derive(Default)]
struct StoreState {
    records: HashMap<BlobId, BlobRecord>,
    /// (expires_at, id) で並んだ生存中の Blob
    expiries: BTreeSet<(DateTime<Utc>, BlobId)>,
    /// 掃除済み ID → 元の expires_at
    tombstones: HashMap<BlobId, DateTime<Utc>>,
    tombstone_order: BTreeSet<(DateTime<Utc>, BlobId)>,
}

impl StoreState {
    /// `expires_at <= now` の Blob を tombstone に移し、古い tombstone を捨てる
    fn sweep(&mut self, now: DateTime<Utc>, retention: TimeDelta) -> usize {
        let mut evicted = 0;
        while let Some(&(expires_at, id)) = self.expiries.first() {
            if expires_at > now {
                break;
            }
            self.expiries.pop_first();
            if let Some(record) = self.records.remove(&id) {
                debug_assert!(record.is_expired_at(now));
                debug!(blob_id = %id, filename = record.filename(), "evicted expired blob");
                self.tombstones.insert(id, expires_at);
                self.tombstone_order.insert((expires_at, id));
                evicted += 1;
            }
        }

        while let Some(&(expired_at, id)) = self.tombstone_order.first() {
            // 加算が溢れる場合は「まだ保持する」
            let keep_until = expired_at.checked_add_signed(retention);
            if keep_until.is_none_or(|until| until > now) {
                break;
            }
            self.tombstone_order.pop_first();
            self.tombstones.remove(&id);
        }
        evicted
    }

    fn insert(&mut self, record: BlobRecord) {
        self.expiries.insert((record.expires_at(), record.id()));
        self.records.insert(record.id(), record);
    }

    fn is_known(&self, id: &BlobId) -> bool {
        self.records.contains_key(id) || self.tombstones.contains_key(id)
    }

    fn lookup(&self, id: BlobId) -> Result<&BlobRecord, StoreError> {
        match self.records.get(&id) {
            Some(record) => Ok(record),
            None if self.tombstones.contains_key(&id) => Err(StoreError::Expired(id)),
            None => Err(StoreError::NotFound(id)),
        }
    }
}

/// InMemoryBlobStore はプロセス内の一時ストア
///
/// # 使用例
/// ```ignore
/// let store = InMemoryBlobStore::new(config.store_config()?);
/// let id = store.put(PutRequest::new(bytes, "report.pdf"))?;
/// let record = store.get(id)?;
/// ```
///
/// グローバルな singleton は持たない。テストごとに独立したインスタンスを作れる。
pub struct InMemoryBlobStore<C = SystemClock> {
    state: Mutex<StoreState>,
    clock: C,
    id_gen: Box<dyn IdGenerator>,
    classifier: Classifier,
    sanitizer: Sanitizer,
    config: StoreConfig,
}

impl InMemoryBlobStore<SystemClock> {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock + Clone + 'static> InMemoryBlobStore<C> {
    pub fn with_clock(config: StoreConfig, clock: C) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            id_gen: Box::new(UlidGenerator::new(clock.clone())),
            clock,
            classifier: Classifier::new(),
            sanitizer: Sanitizer::new(config.max_filename_len),
            config,
        }
    }
}

impl<C: Clock> InMemoryBlobStore<C> {
    /// ID 生成器を差し替える
    pub fn with_id_generator(mut self, id_gen: impl IdGenerator + 'static) -> Self {
        self.id_gen = Box::new(id_gen);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn fresh_id(&self, state: &StoreState) -> BlobId {
        loop {
            let id = self.id_gen.generate_blob_id();
            if !state.is_known(&id) {
                return id;
            }
        }
    }
}

impl<C: Clock> BlobStore for InMemoryBlobStore<C> {
    fn put(&self, req: PutRequest) -> Result<BlobId, StoreError> {
        let size = req.content.len() as u64;
        if size > self.config.max_size_bytes {
            return Err(StoreError::TooLarge {
                size,
                max: self.config.max_size_bytes,
            });
        }

        let PutRequest {
            content,
            filename: original_filename,
            content_type,
            ttl,
            mut metadata,
        } = req;

        let content_type = match content_type {
            Some(content_type) => content_type,
            None => {
                let classification = self.classifier.classify(&original_filename, &content);
                metadata
                    .entry("detected_type".to_string())
                    .or_insert_with(|| json!(classification.file_type.as_str()));
                metadata
                    .entry("classifier_confidence".to_string())
                    .or_insert_with(|| json!(classification.confidence));
                metadata
                    .entry("classifier_signal".to_string())
                    .or_insert_with(|| json!(classification.signal));
                classification.file_type.mime_type().to_string()
            }
        };
        let name = BlobName {
            filename: self.sanitizer.sanitize(&original_filename),
            original_filename,
        };
        let ttl = ttl.unwrap_or(self.config.default_ttl);

        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sweep(now, self.config.tombstone_retention);

        let id = self.fresh_id(&state);
        let record = BlobRecord::new(id, content, name, content_type, now, ttl, metadata);
        debug!(
            blob_id = %id,
            filename = record.filename(),
            content_type = record.content_type(),
            size_bytes = record.size_bytes(),
            expires_at = %record.expires_at(),
            "stored blob"
        );
        state.insert(record);
        Ok(id)
    }

    fn get(&self, id: BlobId) -> Result<BlobRecord, StoreError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sweep(now, self.config.tombstone_retention);
        state.lookup(id).cloned()
    }

    fn info(&self, id: BlobId) -> Result<BlobInfo, StoreError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sweep(now, self.config.tombstone_retention);
        state.lookup(id).map(BlobRecord::info)
    }

    fn list(&self, limit: usize) -> Vec<BlobInfo> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sweep(now, self.config.tombstone_retention);

        let mut records: Vec<&BlobRecord> = state.records.values().collect();
        records.sort_by_key(|record| (record.created_at(), record.id()));
        records.into_iter().take(limit).map(BlobRecord::info).collect()
    }

    fn stats(&self) -> StoreStats {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sweep(now, self.config.tombstone_retention);

        StoreStats {
            count: state.records.len(),
            total_bytes: state.records.values().map(BlobRecord::size_bytes).sum(),
        }
    }

    fn sweep_expired(&self) -> usize {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sweep(now, self.config.tombstone_retention)
    }

    fn len(&self) -> usize {
        self.state.lock().records.len()
    }
}
