//! Ingestor - upload の受け付けパイプライン
//!
//! # フロー
//! 1. sanitize: 表示名を作る（拡張子が一覧外なら warn! するが受け付ける）
//! 2. classify: 内容から本当の種別を決める
//! 3. convert: `target` が指定され、かつ種別と違うときだけ
//! 4. put: 結果のバイト列をストアに保存
//!
//! 変換に失敗した場合は何も保存しない。

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classify::Classifier;
use crate::domain::{BlobId, ConvertError, FileType, StoreError, Ttl};
use crate::impls::ConverterRegistry;
use crate::ports::{BlobStore, ConvertOptions, PutRequest};
use crate::sanitize::{Sanitizer, split_extension};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 1 件の upload
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub content: Bytes,
    pub filename: String,
    /// 呼び出し側が申告した MIME type。変換しない場合はそのまま保存する
    pub content_type: Option<String>,
    /// 変換先。None なら受け取ったまま保存
    pub target: Option<FileType>,
    pub options: ConvertOptions,
    pub ttl: Option<Ttl>,
}

impl IngestRequest {
    pub fn new(content: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            content_type: None,
            target: None,
            options: ConvertOptions::new(),
            ttl: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.content_type = (!content_type.trim().is_empty()).then_some(content_type);
        self
    }

    pub fn convert_to(mut self, target: FileType) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// upload の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub id: BlobId,
    pub filename: String,
    pub original_filename: String,
    /// 保存した内容の種別（変換した場合は変換先）
    pub format: FileType,
    /// classifier が判定した upload 時点の種別
    pub detected_format: FileType,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub download_url: String,
}

pub struct Ingestor {
    store: Arc<dyn BlobStore>,
    converters: Arc<ConverterRegistry>,
    classifier: Classifier,
    sanitizer: Sanitizer,
    max_size_bytes: u64,
    base_url: String,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn BlobStore>,
        converters: Arc<ConverterRegistry>,
        sanitizer: Sanitizer,
        max_size_bytes: u64,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            converters,
            classifier: Classifier::new(),
            sanitizer,
            max_size_bytes,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn download_url(&self, id: BlobId) -> String {
        format!("{}/download/{}", self.base_url, id)
    }

    pub async fn ingest(&self, req: IngestRequest) -> Result<IngestReceipt, IngestError> {
        let IngestRequest {
            content,
            filename,
            content_type,
            target,
            options,
            ttl,
        } = req;

        // 変換に入る前に弾く（ストアでも同じ判定をする）
        let size = content.len() as u64;
        if size > self.max_size_bytes {
            return Err(StoreError::TooLarge {
                size,
                max: self.max_size_bytes,
            }
            .into());
        }

        let sanitized = self.sanitizer.sanitize(&filename);
        if let (_, Some(ext)) = split_extension(filename.trim())
            && FileType::from_extension(ext).is_none()
        {
            warn!(filename = %sanitized, extension = ext, "non-standard extension, accepting anyway");
        }

        let classification = self.classifier.classify(&filename, &content);
        let detected = classification.file_type.clone();

        let (content, format, stored_name, content_type) = match target {
            Some(target) if target != detected => {
                let converted = self
                    .converters
                    .convert(content, &detected, &target, &options)
                    .await?;
                let (base, _) = split_extension(filename.trim());
                let name = format!("{base}.{target}");
                let mime = target.mime_type().to_string();
                (converted, target, name, mime)
            }
            _ => {
                let mime = content_type.unwrap_or_else(|| detected.mime_type().to_string());
                (content, detected.clone(), filename.clone(), mime)
            }
        };

        let mut put = PutRequest::new(content, stored_name)
            .with_content_type(content_type)
            .with_metadata("format", format.as_str())
            .with_metadata("detected_type", detected.as_str())
            .with_metadata("classifier_signal", serde_json::json!(classification.signal))
            .with_metadata("classifier_confidence", classification.confidence);
        if format != detected {
            put = put
                .with_metadata("converted_from", detected.as_str())
                .with_metadata("source_filename", filename.as_str());
        }
        if let Some(ttl) = ttl {
            put = put.with_ttl(ttl);
        }

        let id = self.store.put(put)?;
        let info = self.store.info(id)?;
        info!(
            blob_id = %id,
            filename = %info.filename,
            format = %format,
            size_bytes = info.size_bytes,
            "ingested upload"
        );

        Ok(IngestReceipt {
            download_url: self.download_url(id),
            id,
            filename: info.filename,
            original_filename: info.original_filename,
            format,
            detected_format: detected,
            content_type: info.content_type,
            size_bytes: info.size_bytes,
            created_at: info.created_at,
            expires_at: info.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StashConfig;
    use crate::impls::{CsvToJson, InMemoryBlobStore, TextToHtml};
    use crate::ports::FixedClock;
    use chrono::{TimeDelta, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn setup(max_size: u64) -> (Ingestor, Arc<InMemoryBlobStore<FixedClock>>, FixedClock) {
        let config = StashConfig {
            max_file_size_bytes: max_size,
            ..StashConfig::default()
        };
        let clock = FixedClock::new(start());
        let store = Arc::new(InMemoryBlobStore::with_clock(
            config.store_config().unwrap(),
            clock.clone(),
        ));
        let mut converters = ConverterRegistry::new();
        converters.register(TextToHtml).unwrap();
        converters.register(CsvToJson).unwrap();

        let ingestor = Ingestor::new(
            store.clone(),
            Arc::new(converters),
            Sanitizer::default(),
            max_size,
            "https://files.example.com/",
        );
        (ingestor, store, clock)
    }

    #[tokio::test]
    async fn test_spaced_name_json_export_round_trip() {
        let (ingestor, store, clock) = setup(1024);
        let body = br#"{"title": "Devis", "lines": [1, 2, 3]}"#;

        let receipt = ingestor
            .ingest(IngestRequest::new(Bytes::from_static(body), "DEVIS INFINYTIA 4000"))
            .await
            .unwrap();

        assert_eq!(receipt.filename, "DEVIS_INFINYTIA_4000");
        assert_eq!(receipt.original_filename, "DEVIS INFINYTIA 4000");
        assert_eq!(receipt.format, FileType::DOCUMENT);
        assert_eq!(receipt.content_type, "application/octet-stream");
        assert_eq!(receipt.created_at, start());
        assert_eq!(receipt.expires_at, start() + TimeDelta::hours(24));
        assert_eq!(
            receipt.download_url,
            format!("https://files.example.com/download/{}", receipt.id)
        );

        clock.advance(TimeDelta::hours(1));
        let record = store.get(receipt.id).unwrap();
        assert_eq!(record.content().as_ref(), body);
        assert_eq!(record.metadata()["format"], "document");
    }

    #[tokio::test]
    async fn test_mislabelled_pdf_is_detected() {
        let (ingestor, store, _clock) = setup(1024);

        let receipt = ingestor
            .ingest(IngestRequest::new(Bytes::from_static(b"%PDF-1.7\n..."), "photo.png"))
            .await
            .unwrap();

        assert_eq!(receipt.format, FileType::PDF);
        assert_eq!(receipt.content_type, "application/pdf");
        assert_eq!(receipt.filename, "photo.png");
        assert_eq!(store.info(receipt.id).unwrap().metadata["classifier_signal"], "signature");
    }

    #[tokio::test]
    async fn test_declared_content_type_is_kept() {
        let (ingestor, _store, _clock) = setup(1024);

        let receipt = ingestor
            .ingest(
                IngestRequest::new(Bytes::from_static(b"plain words"), "notes.txt")
                    .with_content_type("text/plain; charset=utf-8"),
            )
            .await
            .unwrap();

        assert_eq!(receipt.content_type, "text/plain; charset=utf-8");
        assert_eq!(receipt.format, FileType::TXT);
    }

    #[tokio::test]
    async fn test_convert_csv_to_json() {
        let (ingestor, store, _clock) = setup(1024);

        let receipt = ingestor
            .ingest(
                IngestRequest::new(Bytes::from_static(b"a,b\n1,2\n"), "Rapport Été.csv")
                    .convert_to(FileType::JSON),
            )
            .await
            .unwrap();

        assert_eq!(receipt.filename, "Rapport_Ete.json");
        assert_eq!(receipt.format, FileType::JSON);
        assert_eq!(receipt.detected_format, FileType::CSV);
        assert_eq!(receipt.content_type, "application/json");

        let record = store.get(receipt.id).unwrap();
        assert_eq!(record.content().as_ref(), br#"[{"a":"1","b":"2"}]"#);
        assert_eq!(record.metadata()["converted_from"], "csv");
        assert_eq!(record.metadata()["source_filename"], "Rapport Été.csv");
        assert_eq!(record.original_filename(), "Rapport Été.json");
    }

    #[tokio::test]
    async fn test_same_target_skips_conversion() {
        let (ingestor, store, _clock) = setup(1024);

        let receipt = ingestor
            .ingest(IngestRequest::new(Bytes::from_static(b"id,v\n1,2\n"), "data.csv").convert_to(FileType::CSV))
            .await
            .unwrap();

        assert_eq!(receipt.format, FileType::CSV);
        assert!(!store.info(receipt.id).unwrap().metadata.contains_key("converted_from"));
    }

    #[tokio::test]
    async fn test_failed_conversion_stores_nothing() {
        let (ingestor, store, _clock) = setup(1024);

        let err = ingestor
            .ingest(IngestRequest::new(Bytes::from_static(b"a,b\n1,2,3\n"), "bad.csv").convert_to(FileType::JSON))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Convert(ConvertError::ConversionFailed { .. })));

        let err = ingestor
            .ingest(IngestRequest::new(Bytes::from_static(b"%PDF-1.4"), "doc.pdf").convert_to(FileType::PNG))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Convert(ConvertError::UnsupportedConversion { .. })));

        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_too_large_is_rejected_before_conversion() {
        let (ingestor, store, _clock) = setup(8);

        let err = ingestor
            .ingest(IngestRequest::new(Bytes::from_static(b"0123456789"), "big.txt").convert_to(FileType::HTML))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Store(StoreError::TooLarge { size: 10, max: 8 })));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_custom_ttl_and_unknown_extension() {
        let (ingestor, store, clock) = setup(1024);

        let receipt = ingestor
            .ingest(
                IngestRequest::new(Bytes::from_static(b"\0\x01\x02"), "dump.xyz")
                    .with_ttl(Ttl::from_secs(60).unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(receipt.expires_at, start() + TimeDelta::seconds(60));
        assert_eq!(receipt.filename, "dump.xyz");

        clock.advance(TimeDelta::seconds(60));
        assert!(matches!(store.get(receipt.id), Err(StoreError::Expired(_))));
    }
}
