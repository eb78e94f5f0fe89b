//! App - アプリケーション層
//!
//! ports と impls を組み合わせて、呼び出し側（HTTP 層や CLI）が使う形にします。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 設定と converter のワイヤリング、起動時検証
//! - **Ingestor**: sanitize → classify → convert → put のパイプライン
//! - **SweepLoop**: 期限切れ Blob の定期掃除
//! - **StatusReport / Health**: 運用向けスナップショット

pub mod builder;
pub mod ingest;
pub mod status;
pub mod sweep_loop;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::ingest::{IngestError, IngestReceipt, IngestRequest, Ingestor};
pub use self::status::{FileSummary, Health, Limits, StatusReport};
pub use self::sweep_loop::{SweepHandle, SweepLoop};
