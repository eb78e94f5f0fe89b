//! Classifier - アップロードされた内容の本当の種別を決める
//!
//! 拡張子がない（クラウド文書の export、"download" のような汎用名）、
//! あるいは拡張子が嘘をついている upload を前提に、
//! 独立した弱いシグナルを組み合わせて決定的に 1 つを選びます。
//!
//! # シグナル（優先順）
//! | # | Signal       | weight | 内容                                          |
//! |---|--------------|--------|-----------------------------------------------|
//! | 1 | Signature    | 3.0    | 先頭 512 byte のマジックナンバー              |
//! | 2 | MimeLookup   | 1.5    | 拡張子 → MIME → タグ                          |
//! | 3 | Extension    | 1.0    | 拡張子が受け付け一覧にあればそのまま          |
//! | 4 | ContentShape | 2.0    | JSON export / HTML / CSV（ただのテキストは 1.0）|
//! | 5 | Keyword      | 1.0    | 1〜4 が全部棄権したときだけ、名前のキーワード |
//! | 6 | Default      | 0.5    | それでも何もなければ txt                      |
//!
//! weight が最大の候補が勝ち、同点なら表の上にあるシグナルが勝つ。
//! 決して失敗しない。

mod heuristics;
mod keywords;
mod name;
mod signature;

use serde::{Deserialize, Serialize};

use crate::domain::FileType;
use crate::sanitize::split_extension;

/// Number of leading bytes inspected by the signature and shape signals.
pub const HEADER_LEN: usize = 512;

/// Type-detection signal, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Signature,
    MimeLookup,
    Extension,
    ContentShape,
    Keyword,
    Default,
}

impl Signal {
    /// Base weight of the signal.
    pub fn weight(self) -> f64 {
        match self {
            Signal::Signature => 3.0,
            Signal::MimeLookup => 1.5,
            Signal::Extension => 1.0,
            Signal::ContentShape => heuristics::SHAPE_WEIGHT,
            Signal::Keyword => 1.0,
            Signal::Default => 0.5,
        }
    }
}

/// Result of [`Classifier::classify`].
///
/// `confidence` is the weight of the winning signal: a ranking score, not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub file_type: FileType,
    pub confidence: f64,
    pub signal: Signal,
}

impl Classification {
    fn from_signal(file_type: FileType, signal: Signal) -> Self {
        Self {
            file_type,
            confidence: signal.weight(),
            signal,
        }
    }
}

/// Stateless classifier; safe to share between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, filename: &str, content: &[u8]) -> Classification {
        let header = &content[..content.len().min(HEADER_LEN)];
        let (_, ext) = split_extension(filename.trim());

        let candidates = [
            signature::sniff(header, filename)
                .map(|t| Classification::from_signal(t, Signal::Signature)),
            ext.and_then(name::lookup)
                .map(|t| Classification::from_signal(t, Signal::MimeLookup)),
            ext.and_then(FileType::from_extension)
                .map(|t| Classification::from_signal(t, Signal::Extension)),
            heuristics::shape(header).map(|(t, weight)| Classification {
                file_type: t,
                confidence: weight,
                signal: Signal::ContentShape,
            }),
        ];

        let result = candidates
            .into_iter()
            .flatten()
            // 同点なら先に出た候補を残す
            .reduce(|best, candidate| {
                if candidate.confidence > best.confidence {
                    candidate
                } else {
                    best
                }
            })
            .or_else(|| {
                keywords::find(filename, keywords::FALLBACK_KEYWORDS)
                    .map(|t| Classification::from_signal(t, Signal::Keyword))
            })
            .unwrap_or_else(|| Classification::from_signal(FileType::TXT, Signal::Default));

        tracing::trace!(
            filename,
            file_type = %result.file_type,
            signal = ?result.signal,
            confidence = result.confidence,
            "classified"
        );
        result
    }
}

/// [`Classifier::classify`] の省略形
pub fn classify(filename: &str, content: &[u8]) -> Classification {
    Classifier.classify(filename, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_name("", b"%PDF-1.4 ...")]
    #[case::wrong_extension("photo.png", b"%PDF-1.4 ...")]
    #[case::spaces("report final", b"%PDF-1.4 ...")]
    #[case::text_extension("notes.txt", b"%PDF-1.4 ...")]
    fn pdf_signature_always_wins(#[case] filename: &str, #[case] content: &[u8]) {
        let result = classify(filename, content);
        assert_eq!(result.file_type, FileType::PDF);
        assert_eq!(result.signal, Signal::Signature);
        assert_eq!(result.confidence, 3.0);
    }

    #[rstest]
    #[case("document.pdf")]
    #[case("image.jpg")]
    #[case("")]
    fn png_signature_always_wins(#[case] filename: &str) {
        let result = classify(filename, b"\x89PNG\r\n\x1a\n");
        assert_eq!(result.file_type, FileType::PNG);
    }

    #[test]
    fn total_on_empty_input() {
        let result = classify("", b"");
        assert_eq!(result.file_type, FileType::TXT);
        assert_eq!(result.signal, Signal::Default);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn unknown_binary_falls_back_to_default() {
        let result = classify("blob", b"\0\x01\x02\x03\x04\x05\x06\x07");
        assert_eq!(result.signal, Signal::Default);
        assert_eq!(result.file_type, FileType::TXT);
    }

    #[test]
    fn json_export_with_spaced_name_is_a_document() {
        let result = classify("DEVIS INFINYTIA 4000", br#"{"kind": "docs#document", "body": {}}"#);
        assert_eq!(result.file_type, FileType::DOCUMENT);
        assert_eq!(result.signal, Signal::ContentShape);
        assert_ne!(result.signal, Signal::Default);
    }

    #[test]
    fn keyword_fallback_when_everything_else_abstains() {
        // バイナリで署名もない → 内容からは何も言えない
        let result = classify("Budget 2024", b"\0\0\0\x07garbage");
        assert_eq!(result.file_type, FileType::XLSX);
        assert_eq!(result.signal, Signal::Keyword);
    }

    #[test]
    fn keyword_is_skipped_when_another_signal_matched() {
        let result = classify("facture.csv", b"\0\0\0\x07garbage");
        assert_eq!(result.file_type, FileType::CSV);
        assert_eq!(result.signal, Signal::MimeLookup);
    }

    #[test]
    fn mime_lookup_beats_plain_text_shape() {
        let result = classify("README.md", b"# Title\n\nSome text.\n");
        assert_eq!(result.file_type, FileType::MD);
        assert_eq!(result.signal, Signal::MimeLookup);
    }

    #[test]
    fn extension_beats_plain_text_shape_on_tie() {
        // tex の MIME は対応表にないので MimeLookup は棄権する
        let result = classify("paper.tex", b"\\documentclass{article}\n");
        assert_eq!(result.file_type, FileType::new("tex"));
        assert_eq!(result.signal, Signal::Extension);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let result = classify("SCAN.PDF", b"\0\0binary");
        assert_eq!(result.file_type, FileType::PDF);
        assert_eq!(result.signal, Signal::MimeLookup);
    }

    #[test]
    fn shape_beats_name_for_csv_without_extension() {
        let result = classify("export", b"id,name\n1,a\n2,b\n");
        assert_eq!(result.file_type, FileType::CSV);
        assert_eq!(result.signal, Signal::ContentShape);
    }

    #[test]
    fn zip_without_hint_is_docx() {
        let result = classify("download", b"PK\x03\x04\x14\0\x06\0\x08\0");
        assert_eq!(result.file_type, FileType::DOCX);
    }

    #[test]
    fn signals_are_ordered_by_precedence() {
        assert!(Signal::Signature < Signal::MimeLookup);
        assert!(Signal::ContentShape < Signal::Keyword);
        assert!(Signal::Keyword < Signal::Default);
    }
}
