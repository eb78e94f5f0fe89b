//! Built-in converters.
//!
//! Text-only transformations that need no external library. Image / PDF /
//! office conversions live outside this crate and plug in through the same
//! [`Converter`] trait.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::domain::{ConvertError, FileType};
use crate::ports::{ConvertOptions, Converter};

fn ensure_supported(
    converter: &dyn Converter,
    source: &FileType,
    target: &FileType,
) -> Result<(), ConvertError> {
    let supported = converter
        .conversions()
        .iter()
        .any(|(s, t)| s == source && t == target);
    if supported {
        Ok(())
    } else {
        Err(ConvertError::UnsupportedConversion {
            source_type: source.clone(),
            target_type: target.clone(),
        })
    }
}

fn utf8<'a>(content: &'a [u8], source: &FileType, target: &FileType) -> Result<&'a str, ConvertError> {
    std::str::from_utf8(content)
        .map_err(|e| ConvertError::failed(source, target, format!("input is not UTF-8: {e}")))
}

/// txt / md → standalone HTML page (`title` option, default "document").
#[derive(Debug, Clone, Copy, Default)]
pub struct TextToHtml;

#[async_trait]
impl Converter for TextToHtml {
    fn name(&self) -> &'static str {
        "text-to-html"
    }

    fn conversions(&self) -> Vec<(FileType, FileType)> {
        vec![(FileType::TXT, FileType::HTML), (FileType::MD, FileType::HTML)]
    }

    async fn convert(
        &self,
        content: Bytes,
        source: &FileType,
        target: &FileType,
        options: &ConvertOptions,
    ) -> Result<Bytes, ConvertError> {
        ensure_supported(self, source, target)?;
        let text = utf8(&content, source, target)?;
        let title = options.get("title").map(String::as_str).unwrap_or("document");

        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body><pre>{}</pre></body>\n</html>\n",
            escape_html(title),
            escape_html(text)
        );
        Ok(Bytes::from(html))
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// csv → JSON array of objects keyed by the header row (`delimiter` option, default `,`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvToJson;

#[async_trait]
impl Converter for CsvToJson {
    fn name(&self) -> &'static str {
        "csv-to-json"
    }

    fn conversions(&self) -> Vec<(FileType, FileType)> {
        vec![(FileType::CSV, FileType::JSON)]
    }

    async fn convert(
        &self,
        content: Bytes,
        source: &FileType,
        target: &FileType,
        options: &ConvertOptions,
    ) -> Result<Bytes, ConvertError> {
        ensure_supported(self, source, target)?;
        let text = utf8(&content, source, target)?;
        let delimiter = match options.get("delimiter").map(String::as_str) {
            None => ',',
            Some(d) => {
                let mut chars = d.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c != '"' => c,
                    _ => {
                        return Err(ConvertError::failed(
                            source,
                            target,
                            format!("invalid delimiter {d:?}"),
                        ));
                    }
                }
            }
        };

        let rows = parse_csv(text, delimiter).map_err(|reason| ConvertError::failed(source, target, reason))?;
        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            return Ok(Bytes::from_static(b"[]"));
        };

        let mut objects = Vec::new();
        for (index, row) in rows.enumerate() {
            if row.len() != header.len() {
                return Err(ConvertError::failed(
                    source,
                    target,
                    format!(
                        "row {} has {} fields, header has {}",
                        index + 2,
                        row.len(),
                        header.len()
                    ),
                ));
            }
            let object: Map<String, Value> = header
                .iter()
                .cloned()
                .zip(row.into_iter().map(Value::String))
                .collect();
            objects.push(Value::Object(object));
        }

        serde_json::to_vec(&Value::Array(objects))
            .map(Bytes::from)
            .map_err(|e| ConvertError::failed(source, target, e.to_string()))
    }
}

/// Minimal RFC 4180 reader: quoted fields, `""` escapes, CRLF or LF, blank lines skipped.
fn parse_csv(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, String> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                c => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                let done = std::mem::take(&mut row);
                if !(done.len() == 1 && done[0].is_empty()) {
                    rows.push(done);
                }
            }
            c if c == delimiter => row.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
