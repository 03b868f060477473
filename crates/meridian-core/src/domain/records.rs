//! Raw records - RecordReader がデコードした直後の形
//!
//! # 学習ポイント
//! - Associated Constants (`const ELEMENT`) で record shape と要素名を対応付ける
//! - serde の rename / alias による明示的な schema-to-struct マッピング

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// RecordShape は「どの要素を、どの型にデコードするか」を表す
///
/// # 使用例
/// ```ignore
/// let mut stream = reader.read(&resource, RawCountryRecord::ELEMENT).await?;
/// while let Some(record) = stream.next_record::<RawCountryRecord>().await { ... }
/// ```
pub trait RecordShape: DeserializeOwned + Send + 'static {
    /// データセット内の要素名
    const ELEMENT: &'static str;
}

/// 国データセットの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCountryRecord {
    #[serde(rename = "alpha_2_code", alias = "code")]
    pub code: String,
    pub name: String,
}

impl RecordShape for RawCountryRecord {
    const ELEMENT: &'static str = "iso_3166_entry";
}

/// 下位区分の 1 エントリ (code, name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubdivisionEntry {
    pub code: String,
    pub name: String,
}

/// 1 つの subset（区分種別ラベル + エントリ列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubdivisionSubset {
    #[serde(rename = "type")]
    pub subdivision_type: String,

    #[serde(rename = "iso_3166_2_entry", default)]
    pub entries: Vec<RawSubdivisionEntry>,
}

/// 1 か国分の下位区分ブロック
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubdivisionGroup {
    pub code: String,

    #[serde(rename = "iso_3166_subset", default)]
    pub subsets: Vec<RawSubdivisionSubset>,
}

impl RecordShape for RawSubdivisionGroup {
    const ELEMENT: &'static str = "iso_3166_country";
}

impl RawSubdivisionGroup {
    /// Index に反映される subset（先頭のみ）
    pub fn primary_subset(&self) -> Option<&RawSubdivisionSubset> {
        self.subsets.first()
    }
}
