//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryBlobStore**: プロセス内の一時 Blob ストア
//! - **ConverterRegistry**: (source, target) ごとの Converter 対応表
//! - **TextToHtml / CsvToJson**: 外部ライブラリ不要の組み込み Converter
//!
//! 画像 / PDF / office 文書の Converter は別クレートで実装し、
//! 起動時に registry に登録する。

pub mod converter_registry;
pub mod converters;
pub mod inmem_blob;

pub use self::converter_registry::{ConverterRegistry, RegistryError};
pub use self::converters::{CsvToJson, TextToHtml};
pub use self::inmem_blob::InMemoryBlobStore;
