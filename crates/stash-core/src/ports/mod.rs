//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の関心事（時刻、ID、保存先、形式変換）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod blob_store;
pub mod clock;
pub mod converter;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::blob_store::{BlobStore, PutRequest, StoreStats};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::converter::{ConvertOptions, Converter};
pub use self::id_generator::{IdGenerator, UlidGenerator};
