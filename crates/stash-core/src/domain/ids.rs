//! Blob identifiers.
//!
//! # ULID ベースの ID
//! BlobId は ULID (Universally Unique Lexicographically Sortable Identifier) を包む newtype です。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 調整なしで複数ノードで生成できる
//! - **URL セーフ**: Crockford Base32 なので download URL にそのまま埋め込める
//!
//! 表示形式は `blob-01HV...` で、`FromStr` で元に戻せます。
//! serde でも同じ文字列形式でやり取りします。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const PREFIX: &str = "blob-";

/// Identifier of a stored blob.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(Ulid);

impl BlobId {
    /// ULID から BlobId を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for BlobId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.0)
    }
}

/// BlobId の文字列表現が不正
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid blob id: {0:?}")]
pub struct ParseBlobIdError(String);

impl FromStr for BlobId {
    type Err = ParseBlobIdError;

    /// `blob-` プレフィックス付き、またはプレフィックスなしの ULID を受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(PREFIX).unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|_| ParseBlobIdError(s.to_string()))
    }
}

impl TryFrom<String> for BlobId {
    type Error = ParseBlobIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let ulid = Ulid::new();
        let id = BlobId::from_ulid(ulid);

        assert_eq!(id.as_ulid(), ulid);
        assert_eq!(id.to_string(), format!("blob-{ulid}"));
    }

    #[test]
    fn parses_display_form_and_bare_ulid() {
        let id = BlobId::from_ulid(Ulid::new());

        let from_display: BlobId = id.to_string().parse().unwrap();
        let from_bare: BlobId = id.as_ulid().to_string().parse().unwrap();

        assert_eq!(from_display, id);
        assert_eq!(from_bare, id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "blob-not-a-ulid".parse::<BlobId>().unwrap_err();
        assert!(err.to_string().contains("blob-not-a-ulid"));
        assert!("".parse::<BlobId>().is_err());
    }

    #[test]
    fn serializes_as_display_string() {
        let id = BlobId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, format!("\"{id}\""));

        let deserialized: BlobId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn ids_are_sortable_by_creation_time() {
        let id1 = BlobId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = BlobId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }
}
