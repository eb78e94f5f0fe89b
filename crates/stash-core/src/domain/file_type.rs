//! FileType - ファイル種別タグ
//!
//! タグは小文字の拡張子風文字列（`pdf`, `png`, `docx` ...）です。
//! 例外は `document` で、ネイティブ形式を持たないクラウド文書の export
//! （JSON 形式など）を表す汎用タグです。

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 受け付ける拡張子の一覧
///
/// 一覧にない拡張子でも upload 自体は受け付ける（警告ログのみ）。
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "svg", "tiff", "tif",
    // Documents
    "pdf", "txt", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp",
    // Web
    "html", "htm", "css", "js", "json", "xml",
    // Text
    "csv", "md", "rtf", "tex",
    // Archives
    "zip", "rar", "7z", "tar", "gz",
    // Video
    "mp4", "avi", "mov", "wmv", "flv", "webm", "mkv", "m4v",
    // Audio
    "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a",
    // Other
    "exe", "dmg", "apk", "deb", "rpm",
];

/// ZIP コンテナをそのまま名乗れる拡張子
pub(crate) const ZIP_CONTAINER_EXTENSIONS: &[&str] =
    &["docx", "xlsx", "pptx", "odt", "ods", "odp", "zip", "apk"];

const OCTET_STREAM: &str = "application/octet-stream";

/// File-type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FileType(Cow<'static, str>);

impl FileType {
    pub const PDF: FileType = FileType(Cow::Borrowed("pdf"));
    pub const PNG: FileType = FileType(Cow::Borrowed("png"));
    pub const JPG: FileType = FileType(Cow::Borrowed("jpg"));
    pub const GIF: FileType = FileType(Cow::Borrowed("gif"));
    pub const DOCX: FileType = FileType(Cow::Borrowed("docx"));
    pub const XLSX: FileType = FileType(Cow::Borrowed("xlsx"));
    pub const PPTX: FileType = FileType(Cow::Borrowed("pptx"));
    pub const TXT: FileType = FileType(Cow::Borrowed("txt"));
    pub const MD: FileType = FileType(Cow::Borrowed("md"));
    pub const HTML: FileType = FileType(Cow::Borrowed("html"));
    pub const CSV: FileType = FileType(Cow::Borrowed("csv"));
    pub const JSON: FileType = FileType(Cow::Borrowed("json"));
    pub const ZIP: FileType = FileType(Cow::Borrowed("zip"));
    /// Generic cloud-document export with no native format.
    pub const DOCUMENT: FileType = FileType(Cow::Borrowed("document"));

    /// 任意のタグから作成（小文字化のみ行う）
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        match SUPPORTED_EXTENSIONS.iter().find(|ext| ext.eq_ignore_ascii_case(&tag)) {
            Some(ext) => Self(Cow::Borrowed(ext)),
            None => Self(Cow::Owned(tag.to_ascii_lowercase())),
        }
    }

    /// 拡張子が受け付け一覧にあれば FileType を返す（大文字小文字は区別しない）
    pub fn from_extension(ext: &str) -> Option<Self> {
        SUPPORTED_EXTENSIONS
            .iter()
            .find(|supported| supported.eq_ignore_ascii_case(ext))
            .map(|supported| Self(Cow::Borrowed(supported)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_EXTENSIONS.contains(&self.as_str())
    }

    /// MIME type for this tag, `application/octet-stream` when unknown.
    pub fn mime_type(&self) -> &'static str {
        if *self == Self::DOCUMENT {
            return OCTET_STREAM;
        }
        mime_guess::from_ext(self.as_str())
            .first_raw()
            .unwrap_or(OCTET_STREAM)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<FileType> for String {
    fn from(file_type: FileType) -> Self {
        file_type.0.into_owned()
    }
}
