//! Errors - エラー型と分類
//!
//! # 分類
//! - Configuration: リソースが見つからない（起動時の致命的エラー）
//! - Transfer: ストリーム途中の I/O・デコード失敗（ログに記録し、パイプライン停止）
//!
//! 国コードが解決できない subset はエラーではなく、`LoadReport` で診断として扱う。

use thiserror::Error;

/// ReadError は RecordReader の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("i/o failure: {0}")]
    Io(String),

    #[error("decode failure: {0}")]
    Decode(String),
}

/// SelectorError は読み込みパイプラインのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("configuration error: can't find {resource} ({reason})")]
    Configuration { resource: String, reason: String },

    #[error("transfer error while reading {resource}: {message}")]
    Transfer { resource: String, message: String },

    #[error("a load is already in progress")]
    AlreadyLoading,

    #[error("load was cancelled")]
    Cancelled,

    #[error("load task failed: {0}")]
    Join(String),
}

impl SelectorError {
    /// ReadError をリソース名付きの SelectorError に変換
    ///
    /// NotFound は Configuration、それ以外は Transfer になる。
    pub fn from_read(resource: &str, err: ReadError) -> Self {
        match err {
            ReadError::NotFound(reason) => SelectorError::Configuration {
                resource: resource.to_string(),
                reason,
            },
            other => SelectorError::Transfer {
                resource: resource.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Transfer エラー（リトライ対象）かどうか
    pub fn is_transfer(&self) -> bool {
        matches!(self, SelectorError::Transfer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_configuration() {
        let err = SelectorError::from_read(
            "countries/iso_3166.json",
            ReadError::NotFound("no such file".to_string()),
        );
        assert!(matches!(err, SelectorError::Configuration { .. }));
        assert!(!err.is_transfer());
        assert!(err.to_string().contains("countries/iso_3166.json"));
    }

    #[test]
    fn io_and_decode_map_to_transfer() {
        let io = SelectorError::from_read("a", ReadError::Io("broken pipe".to_string()));
        let decode = SelectorError::from_read("b", ReadError::Decode("missing field".to_string()));
        assert!(io.is_transfer());
        assert!(decode.is_transfer());
        assert!(decode.to_string().contains("missing field"));
    }
}
