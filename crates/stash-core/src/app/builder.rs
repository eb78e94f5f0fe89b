//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - 設定の検証（TTL / サイズ / sweep 間隔が 0 でないこと）
//! - expect_conversions() で期待した変換ペアが全て登録済みであること
//!
//! 必要な変換ができないまま起動して、最初の upload で気づく、を避ける。

use std::sync::Arc;

use crate::config::{ConfigError, StashConfig};
use crate::domain::FileType;
use crate::impls::{ConverterRegistry, InMemoryBlobStore, RegistryError};
use crate::ports::{Clock, Converter, SystemClock};
use crate::sanitize::Sanitizer;

use super::ingest::Ingestor;
use super::status::{Health, StatusReport};
use super::sweep_loop::{SweepHandle, SweepLoop};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(StashConfig::load(None)?)
///     .register_converter(CsvToJson)?
///     .expect_conversions(&[(FileType::CSV, FileType::JSON)])
///     .build()?;
/// let sweeper = app.spawn_sweeper();
/// ```
pub struct AppBuilder<C = SystemClock> {
    config: StashConfig,
    clock: C,
    registry: ConverterRegistry,
    expected: Option<Vec<(FileType, FileType)>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("missing conversions: {0:?}. These conversions were expected but no converter is registered.")]
    MissingConversions(Vec<(FileType, FileType)>),
}

impl AppBuilder<SystemClock> {
    pub fn new(config: StashConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
            registry: ConverterRegistry::new(),
            expected: None,
        }
    }
}

impl<C: Clock + Clone + 'static> AppBuilder<C> {
    /// Clock を差し替える（テスト用）
    pub fn with_clock<C2: Clock + Clone + 'static>(self, clock: C2) -> AppBuilder<C2> {
        AppBuilder {
            config: self.config,
            clock,
            registry: self.registry,
            expected: self.expected,
        }
    }

    pub fn register_converter<T: Converter + 'static>(
        mut self,
        converter: T,
    ) -> Result<Self, RegistryError> {
        self.registry.register(converter)?;
        Ok(self)
    }

    /// 起動に必要な変換ペアを設定
    pub fn expect_conversions(mut self, pairs: &[(FileType, FileType)]) -> Self {
        self.expected = Some(pairs.to_vec());
        self
    }

    pub fn build(self) -> Result<App<C>, BuildError> {
        let store_config = self.config.store_config()?;

        if let Some(expected) = &self.expected {
            let missing: Vec<_> = expected
                .iter()
                .filter(|(source, target)| !self.registry.supports(source, target))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingConversions(missing));
            }
        }

        tracing::info!(
            max_file_size_bytes = self.config.max_file_size_bytes,
            file_expiry_secs = self.config.file_expiry_secs,
            conversions = self.registry.available().len(),
            "app built"
        );

        Ok(App {
            store: Arc::new(InMemoryBlobStore::with_clock(store_config, self.clock)),
            converters: Arc::new(self.registry),
            config: self.config,
        })
    }
}

impl Default for AppBuilder<SystemClock> {
    fn default() -> Self {
        Self::new(StashConfig::default())
    }
}

/// App は構築済みのコンポーネント一式
pub struct App<C = SystemClock> {
    store: Arc<InMemoryBlobStore<C>>,
    converters: Arc<ConverterRegistry>,
    config: StashConfig,
}

impl<C: Clock + 'static> App<C> {
    pub fn store(&self) -> &Arc<InMemoryBlobStore<C>> {
        &self.store
    }

    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }

    pub fn config(&self) -> &StashConfig {
        &self.config
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            self.store.clone(),
            self.converters.clone(),
            Sanitizer::new(self.config.max_filename_len),
            self.config.max_file_size_bytes,
            self.config.base_url.clone(),
        )
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::collect(self.store.as_ref(), &self.config, self.store.clock().now())
    }

    pub fn health(&self) -> Health {
        Health::collect(self.store.as_ref(), self.store.clock().now())
    }

    /// 定期 sweep を起動（tokio runtime 内で呼ぶ）
    pub fn spawn_sweeper(&self) -> SweepHandle {
        SweepLoop::new(self.store.clone(), self.config.sweep_interval()).spawn()
    }
}
