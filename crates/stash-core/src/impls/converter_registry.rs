//! ConverterRegistry - (source, target) → Converter の対応表
//!
//! 1 つの Converter が複数の変換ペアを宣言できる。
//! 同じペアを 2 つの Converter が名乗ることは許さない（登録時に弾く）。

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::domain::{ConvertError, FileType};
use crate::ports::{ConvertOptions, Converter};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("conversion {source_type} -> {target_type} is already registered by '{existing}'")]
    AlreadyRegistered {
        source_type: FileType,
        target_type: FileType,
        existing: &'static str,
    },
}

#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<(FileType, FileType), Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter を登録
    ///
    /// 宣言したペアが 1 つでも既存と衝突したら何も登録しない。
    pub fn register<T: Converter + 'static>(&mut self, converter: T) -> Result<(), RegistryError> {
        let pairs = converter.conversions();
        for (source_type, target_type) in &pairs {
            if let Some(existing) = self.converters.get(&(source_type.clone(), target_type.clone())) {
                return Err(RegistryError::AlreadyRegistered {
                    source_type: source_type.clone(),
                    target_type: target_type.clone(),
                    existing: existing.name(),
                });
            }
        }

        let converter: Arc<dyn Converter> = Arc::new(converter);
        for pair in pairs {
            tracing::debug!(
                converter = converter.name(),
                source_type = %pair.0,
                target_type = %pair.1,
                "converter registered"
            );
            self.converters.insert(pair, Arc::clone(&converter));
        }
        Ok(())
    }

    pub fn find(&self, source: &FileType, target: &FileType) -> Option<Arc<dyn Converter>> {
        self.converters
            .get(&(source.clone(), target.clone()))
            .cloned()
    }

    pub fn supports(&self, source: &FileType, target: &FileType) -> bool {
        self.converters
            .contains_key(&(source.clone(), target.clone()))
    }

    /// 登録済みペア（ソート済み）
    pub fn available(&self) -> Vec<(FileType, FileType)> {
        let mut pairs: Vec<_> = self.converters.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// 対応する Converter に委譲。なければ UnsupportedConversion。
    pub async fn convert(
        &self,
        content: Bytes,
        source: &FileType,
        target: &FileType,
        options: &ConvertOptions,
    ) -> Result<Bytes, ConvertError> {
        let converter =
            self.find(source, target)
                .ok_or_else(|| ConvertError::UnsupportedConversion {
                    source_type: source.clone(),
                    target_type: target.clone(),
                })?;
        converter.convert(content, source, target, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::converters::{CsvToJson, TextToHtml};
    use async_trait::async_trait;

    struct Shouting;

    #[async_trait]
    impl Converter for Shouting {
        fn name(&self) -> &'static str {
            "shouting"
        }

        fn conversions(&self) -> Vec<(FileType, FileType)> {
            vec![(FileType::TXT, FileType::HTML), (FileType::TXT, FileType::MD)]
        }

        async fn convert(
            &self,
            content: Bytes,
            _source: &FileType,
            _target: &FileType,
            _options: &ConvertOptions,
        ) -> Result<Bytes, ConvertError> {
            Ok(Bytes::from(content.to_ascii_uppercase()))
        }
    }

    #[test]
    fn test_register_and_find() {
        let mut registry = ConverterRegistry::new();
        registry.register(TextToHtml).unwrap();

        let converter = registry.find(&FileType::MD, &FileType::HTML).unwrap();
        assert_eq!(converter.name(), "text-to-html");
        assert!(registry.supports(&FileType::TXT, &FileType::HTML));
        assert!(!registry.supports(&FileType::HTML, &FileType::TXT));
    }

    #[test]
    fn test_double_registration_is_atomic() {
        let mut registry = ConverterRegistry::new();
        registry.register(TextToHtml).unwrap();

        let result = registry.register(Shouting);
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { existing: "text-to-html", .. })
        ));
        // txt -> md は衝突していないが、登録されていないこと
        assert!(!registry.supports(&FileType::TXT, &FileType::MD));
    }

    #[test]
    fn test_available_is_sorted() {
        let mut registry = ConverterRegistry::new();
        registry.register(TextToHtml).unwrap();
        registry.register(CsvToJson).unwrap();

        assert_eq!(
            registry.available(),
            vec![
                (FileType::CSV, FileType::JSON),
                (FileType::MD, FileType::HTML),
                (FileType::TXT, FileType::HTML),
            ]
        );
    }

    #[tokio::test]
    async fn test_convert_dispatches() {
        let mut registry = ConverterRegistry::new();
        registry.register(Shouting).unwrap();

        let out = registry
            .convert(
                Bytes::from_static(b"hi"),
                &FileType::TXT,
                &FileType::MD,
                &ConvertOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(out.as_ref(), b"HI");
    }

    #[tokio::test]
    async fn test_convert_unknown_pair() {
        let registry = ConverterRegistry::new();
        let err = registry
            .convert(
                Bytes::from_static(b"x"),
                &FileType::PNG,
                &FileType::PDF,
                &ConvertOptions::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::UnsupportedConversion {
                source_type: FileType::PNG,
                target_type: FileType::PDF,
            }
        );
    }
}
