//! Sanitizer - ファイル名の正規化
//!
//! 任意の入力名を、表示名やストレージキーの一部として安全に使える文字列にします。
//!
//! # 変換
//! 1. 末尾の `.ext` を base から切り離す（ext は 1〜10 文字の英数字のみ）
//! 2. base を NFD 分解して結合文字を落とす（"é" → "e"）
//! 3. `[A-Za-z0-9_-]` と空白以外を `_` に置き換える
//! 4. 空白とハイフンの連続を 1 つの `_` にまとめる
//! 5. base を上限長で切り、前後の `_` を落とす
//! 6. 空になったら `unknown_file`
//!
//! 出力は空にならず、パス区切りを含まず、冪等です。

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const DEFAULT_MAX_LEN: usize = 100;
pub const FALLBACK_NAME: &str = "unknown_file";
const MAX_EXTENSION_LEN: usize = 10;

/// `name` を (base, ext) に分ける
///
/// ext として扱うのは、空でない base の後ろの最後の `.` 以降が
/// 1〜10 文字の ASCII 英数字のときだけ。空白入りの名前
/// （"DEVIS INFINYTIA 4000"）や `.bashrc` は拡張子なし。
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && is_extension(ext) => (base, Some(ext)),
        _ => (name, None),
    }
}

fn is_extension(ext: &str) -> bool {
    (1..=MAX_EXTENSION_LEN).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Sanitizer with a fixed base-length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    max_len: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

impl Sanitizer {
    /// `max_len` は base の上限。fallback 名より短くはできない
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(FALLBACK_NAME.len()),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn sanitize(&self, name: &str) -> String {
        let (base, ext) = split_extension(name.trim());

        let mut base = clean_base(base);
        // clean_base の出力は ASCII なので byte 単位で切ってよい
        base.truncate(self.max_len);
        let base = match base.trim_matches('_') {
            "" => FALLBACK_NAME,
            trimmed => trimmed,
        };

        match ext {
            Some(ext) => format!("{base}.{}", ext.to_ascii_lowercase()),
            None => base.to_string(),
        }
    }
}

/// 既定の上限長で sanitize する
pub fn sanitize(name: &str) -> String {
    Sanitizer::default().sanitize(name)
}

fn clean_base(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut in_gap = false;

    for c in base.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_whitespace() || c == '-' {
            in_gap = true;
            continue;
        }
        if in_gap {
            out.push('_');
            in_gap = false;
        }
        out.push(if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::spaces("DEVIS INFINYTIA 4000", "DEVIS_INFINYTIA_4000")]
    #[case::diacritics("Café Crème.PDF", "Cafe_Creme.pdf")]
    #[case::hyphen_runs("rapport - final--v2.docx", "rapport_final_v2.docx")]
    #[case::path("../../etc/passwd", "etc_passwd")]
    #[case::windows_path("C:\\Users\\me\\photo.JPG", "C__Users_me_photo.jpg")]
    #[case::dots("archive.tar.gz", "archive_tar.gz")]
    #[case::dotfile(".bashrc", "bashrc")]
    #[case::control("bad\u{0}name\t\nhere.txt", "bad_name_here.txt")]
    #[case::empty("", "unknown_file")]
    #[case::only_symbols("???.pdf", "unknown_file.pdf")]
    #[case::whitespace("   ", "unknown_file")]
    #[case::cjk("報告書.pdf", "unknown_file.pdf")]
    #[case::long_ext_is_base("notes.extension_too_long", "notes_extension_too_long")]
    fn sanitizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[test]
    fn truncates_base_but_keeps_extension() {
        let sanitizer = Sanitizer::new(50);
        let name = format!("{}.pdf", "a".repeat(300));

        let out = sanitizer.sanitize(&name);
        assert_eq!(out, format!("{}.pdf", "a".repeat(50)));
    }

    #[test]
    fn truncation_does_not_leave_trailing_underscore() {
        let sanitizer = Sanitizer::new(12);
        // 12 文字目が区切りになる
        let out = sanitizer.sanitize("abcdefghijk lmnop.txt");
        assert_eq!(out, "abcdefghijk.txt");
    }

    #[test]
    fn max_len_is_never_below_fallback() {
        assert_eq!(Sanitizer::new(0).max_len(), FALLBACK_NAME.len());
    }

    #[rstest]
    #[case("DEVIS INFINYTIA 4000")]
    #[case("Café Crème.PDF")]
    #[case("  __weird__ -- name__ .Txt")]
    #[case("a/b\\c:d*e?f\"g<h>i|j")]
    #[case("...")]
    #[case(".pdf")]
    #[case("x.")]
    #[case("Ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé ünïcödé.md")]
    #[case("")]
    fn is_idempotent_and_safe(#[case] input: &str) {
        for max_len in [12, 50, 100] {
            let sanitizer = Sanitizer::new(max_len);
            let once = sanitizer.sanitize(input);
            let twice = sanitizer.sanitize(&once);

            assert_eq!(once, twice, "input={input:?} max_len={max_len}");
            assert!(!once.is_empty());
            assert!(!once.contains('/'));
            assert!(!once.contains('\\'));
        }
    }

    #[rstest]
    #[case("report.pdf", ("report", Some("pdf")))]
    #[case("DEVIS INFINYTIA 4000", ("DEVIS INFINYTIA 4000", None))]
    #[case("v1.2 final", ("v1.2 final", None))]
    #[case(".env", (".env", None))]
    #[case("trailing.", ("trailing.", None))]
    fn splits_extension(#[case] input: &str, #[case] expected: (&str, Option<&str>)) {
        assert_eq!(split_extension(input), expected);
    }
}
