//! Errors - エラー型
//!
//! ストアと converter のエラーは別の enum に分けています。
//! HTTP 層はそれぞれの variant を個別のレスポンスに対応付けられます
//! （NotFound / Expired → 404, TooLarge → 413）。

use thiserror::Error;

use super::file_type::FileType;
use super::ids::BlobId;

/// Blob store のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 上限サイズを超えた（保存前に拒否）
    #[error("content too large: {size} bytes exceeds the limit of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// 存在しない、またはすでに掃除済み
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// 存在したが TTL を過ぎている
    #[error("blob expired: {0}")]
    Expired(BlobId),
}

/// Converter のエラー（呼び出し元にそのまま伝播する）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("unsupported conversion: {source_type} -> {target_type}")]
    UnsupportedConversion {
        source_type: FileType,
        target_type: FileType,
    },

    #[error("conversion {source_type} -> {target_type} failed: {reason}")]
    ConversionFailed {
        source_type: FileType,
        target_type: FileType,
        reason: String,
    },
}

impl ConvertError {
    pub fn failed(source_type: &FileType, target_type: &FileType, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            source_type: source_type.clone(),
            target_type: target_type.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn store_error_messages() {
        let id = BlobId::from_ulid(Ulid::new());

        let too_large = StoreError::TooLarge { size: 11, max: 10 };
        assert!(too_large.to_string().contains("11 bytes"));

        assert!(StoreError::NotFound(id).to_string().contains(&id.to_string()));
        assert!(StoreError::Expired(id).to_string().starts_with("blob expired"));
    }

    #[test]
    fn convert_error_names_both_types() {
        let err = ConvertError::failed(&FileType::CSV, &FileType::JSON, "bad row");
        let msg = err.to_string();
        assert!(msg.contains("csv -> json"));
        assert!(msg.contains("bad row"));
    }
}
