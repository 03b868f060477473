//! Country / Subdivision - 参照データのドメイン型
//!
//! # 学習ポイント
//! - Newtype パターン（CountryCode）
//! - 同一性をコードだけで決める手書きの PartialEq / Hash
//! - 「所有」ではなく「参照」としての back-reference（Option<Country>）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::records::RawCountryRecord;

/// 国コード（例: "US", "DE"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Country は国コードと表示名を持つ
///
/// # 同一性
/// - 等価性とハッシュは `code` のみで決まる
/// - 表示名が違っても同じコードなら同じ Country として扱う
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    code: CountryCode,
    name: String,
}

impl Country {
    pub fn new(code: impl Into<CountryCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn code(&self) -> &CountryCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Country {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Country {}

impl Hash for Country {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

impl From<RawCountryRecord> for Country {
    fn from(raw: RawCountryRecord) -> Self {
        Self::new(CountryCode::new(raw.code), raw.name)
    }
}

/// Subdivision は国の下位区分（州・県など）
///
/// `country` は所有ではなく参照。国コードが解決できなかった場合は `None`
/// （unresolved owner）になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdivision {
    name: String,
    code: String,
    country: Option<Country>,
}

impl Subdivision {
    pub fn new(name: impl Into<String>, code: impl Into<String>, country: Option<Country>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            country,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// 所属する国（未解決なら None）
    pub fn country(&self) -> Option<&Country> {
        self.country.as_ref()
    }
}
