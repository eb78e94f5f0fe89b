//! Binary signature sniffing.

use crate::domain::FileType;
use crate::domain::file_type::ZIP_CONTAINER_EXTENSIONS;
use crate::sanitize::split_extension;

use super::keywords::{self, ZIP_KEYWORDS};

const PDF_MAGIC: &[u8] = b"%PDF";
const PNG_MAGIC: &[u8] = b"\x89PNG";
const JPG_MAGIC: &[u8] = b"\xFF\xD8\xFF";
const GIF_MAGIC: &[u8] = b"GIF8";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Look for a known magic sequence at the start of `header`.
///
/// The literal table is checked first; anything else is handed to `infer`
/// and kept only if the detected extension is in the supported set.
pub(crate) fn sniff(header: &[u8], filename: &str) -> Option<FileType> {
    if header.starts_with(PDF_MAGIC) {
        return Some(FileType::PDF);
    }
    if header.starts_with(PNG_MAGIC) {
        return Some(FileType::PNG);
    }
    if header.starts_with(JPG_MAGIC) {
        return Some(FileType::JPG);
    }
    if header.starts_with(GIF_MAGIC) {
        return Some(FileType::GIF);
    }
    if header.starts_with(ZIP_MAGIC) {
        return Some(zip_container(filename));
    }

    infer::get(header).and_then(|kind| FileType::from_extension(kind.extension()))
}

/// Office / OpenDocument files are all ZIP containers; the name decides.
///
/// An explicit ZIP-based extension wins, then keywords, then `docx`.
fn zip_container(filename: &str) -> FileType {
    let (_, ext) = split_extension(filename.trim());
    if let Some(ext) = ext
        && ZIP_CONTAINER_EXTENSIONS.iter().any(|zip_ext| zip_ext.eq_ignore_ascii_case(ext))
        && let Some(file_type) = FileType::from_extension(ext)
    {
        return file_type;
    }

    keywords::find(filename, ZIP_KEYWORDS).unwrap_or(FileType::DOCX)
}
