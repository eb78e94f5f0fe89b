//! Name-based MIME lookup: extension → MIME (`mime_guess`) → type tag.

use crate::domain::FileType;

/// MIME essence → type tag. MIME types missing here abstain.
const MIME_TO_TAG: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
    ("image/svg+xml", "svg"),
    ("image/tiff", "tiff"),
    ("image/x-icon", "ico"),
    ("image/vnd.microsoft.icon", "ico"),
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/csv", "csv"),
    ("text/markdown", "md"),
    ("text/x-markdown", "md"),
    ("text/javascript", "js"),
    ("application/javascript", "js"),
    ("application/json", "json"),
    ("text/xml", "xml"),
    ("application/xml", "xml"),
    ("application/rtf", "rtf"),
    ("text/rtf", "rtf"),
    ("application/msword", "doc"),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", "docx"),
    ("application/vnd.ms-excel", "xls"),
    ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", "xlsx"),
    ("application/vnd.ms-powerpoint", "ppt"),
    ("application/vnd.openxmlformats-officedocument.presentationml.presentation", "pptx"),
    ("application/vnd.oasis.opendocument.text", "odt"),
    ("application/vnd.oasis.opendocument.spreadsheet", "ods"),
    ("application/vnd.oasis.opendocument.presentation", "odp"),
    ("application/zip", "zip"),
    ("application/gzip", "gz"),
    ("application/x-tar", "tar"),
    ("video/mp4", "mp4"),
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("audio/x-wav", "wav"),
];

/// Type tag for the MIME type `mime_guess` associates with `ext`.
pub(crate) fn lookup(ext: &str) -> Option<FileType> {
    let mime = mime_guess::from_ext(ext).first()?;
    let essence = mime.essence_str();
    MIME_TO_TAG
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(essence))
        .and_then(|(_, tag)| FileType::from_extension(tag))
}
