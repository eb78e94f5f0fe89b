//! Converter port - 形式変換の抽象化
//!
//! 実際の画像 / PDF / 文書の変換はこの crate の外の仕事です。
//! ここでは「何から何へ変換できるか」を宣言する trait だけを定義し、
//! 利用可能な実装は起動時に ConverterRegistry に登録します。
//! ライブラリの有無を表す bool をあちこちで分岐する代わりに、
//! 「(source, target) の converter があるか」を registry に問い合わせます。

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{ConvertError, FileType};

/// 変換オプション（品質、ページ範囲など、converter ごとに解釈する）
pub type ConvertOptions = HashMap<String, String>;

/// Converter は content を source から target に変換する
///
/// # 使用例
/// ```ignore
/// struct PdfToPng;
///
/// #[async_trait]
/// impl Converter for PdfToPng {
///     fn name(&self) -> &'static str { "pdf-to-png" }
///     fn conversions(&self) -> Vec<(FileType, FileType)> {
///         vec![(FileType::PDF, FileType::PNG)]
///     }
///     async fn convert(&self, content: Bytes, source: &FileType, target: &FileType,
///                      options: &ConvertOptions) -> Result<Bytes, ConvertError> { ... }
/// }
/// ```
///
/// # 失敗
/// - `UnsupportedConversion`: 宣言していない組み合わせで呼ばれた
/// - `ConversionFailed`: 入力が壊れているなど
#[async_trait]
pub trait Converter: Send + Sync {
    fn name(&self) -> &'static str;

    /// この converter が扱える (source, target) の組
    fn conversions(&self) -> Vec<(FileType, FileType)>;

    async fn convert(
        &self,
        content: Bytes,
        source: &FileType,
        target: &FileType,
        options: &ConvertOptions,
    ) -> Result<Bytes, ConvertError>;
}
