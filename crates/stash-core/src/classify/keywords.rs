//! Filename keyword tables.
//!
//! Names are folded (NFD, combining marks dropped, lowercased) before
//! matching, so "Présentation" matches "presentation".

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::FileType;

pub(crate) struct KeywordGroup {
    pub file_type: FileType,
    pub keywords: &'static [&'static str],
}

/// Disambiguates ZIP containers (`PK\x03\x04`).
pub(crate) const ZIP_KEYWORDS: &[KeywordGroup] = &[
    KeywordGroup {
        file_type: FileType::XLSX,
        keywords: &["sheet", "calc", "xls", "tableau", "budget"],
    },
    KeywordGroup {
        file_type: FileType::PPTX,
        keywords: &["slide", "presentation", "ppt", "deck"],
    },
];

/// Last-resort guess when neither content nor extension says anything.
pub(crate) const FALLBACK_KEYWORDS: &[KeywordGroup] = &[
    KeywordGroup {
        file_type: FileType::DOCUMENT,
        keywords: &["devis", "facture", "document", "invoice", "contrat"],
    },
    KeywordGroup {
        file_type: FileType::XLSX,
        keywords: &["tableau", "budget", "spreadsheet"],
    },
    KeywordGroup {
        file_type: FileType::PPTX,
        keywords: &["presentation", "slides"],
    },
];

/// First group (in table order) with a keyword contained in `filename`.
pub(crate) fn find(filename: &str, groups: &[KeywordGroup]) -> Option<FileType> {
    let folded = fold(filename);
    if folded.is_empty() {
        return None;
    }
    groups
        .iter()
        .find(|group| group.keywords.iter().any(|keyword| folded.contains(keyword)))
        .map(|group| group.file_type.clone())
}

fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
