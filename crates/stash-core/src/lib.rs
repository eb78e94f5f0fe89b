//! stash-core
//!
//! Ephemeral blob store and file-type classifier for an upload / convert /
//! download service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, file_type, record, errors）
//! - **ports**: 抽象化レイヤー（BlobStore, Converter, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryBlobStore, ConverterRegistry, 組み込み Converter）
//! - **classify**: 内容と名前から種別を決める Classifier
//! - **sanitize**: ファイル名の正規化
//! - **app**: AppBuilder, Ingestor, SweepLoop, StatusReport
//! - **config**: figment による設定の読み込み

pub mod app;
pub mod classify;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod sanitize;

pub use app::{App, AppBuilder, IngestReceipt, IngestRequest, Ingestor};
pub use classify::{Classification, Classifier, Signal, classify};
pub use config::{ConfigError, StashConfig, StoreConfig};
pub use domain::{BlobId, BlobInfo, BlobRecord, ConvertError, FileType, StoreError, Ttl};
pub use impls::InMemoryBlobStore;
pub use ports::{BlobStore, PutRequest};
pub use sanitize::{Sanitizer, sanitize};
