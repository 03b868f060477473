//! LoadReport - 読み込み結果の診断サマリ

use serde::{Deserialize, Serialize};

use super::country::CountryCode;
use super::index::IndexBuild;

/// LoadReport は 1 回の読み込みで何が取り込まれ、何が捨てられたかを示す
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub countries: usize,
    pub duplicate_countries: usize,
    pub groups: usize,
    pub empty_groups: usize,
    pub subdivisions: usize,
    pub ignored_subsets: usize,
    pub unresolved_codes: Vec<CountryCode>,
}

impl LoadReport {
    /// 国ステージの結果と IndexBuild から組み立てる
    pub fn from_build(countries: usize, duplicate_countries: usize, build: &IndexBuild) -> Self {
        Self {
            countries,
            duplicate_countries,
            groups: build.groups,
            empty_groups: build.empty_groups,
            subdivisions: build.subdivisions,
            ignored_subsets: build.ignored_subsets,
            unresolved_codes: build.unresolved_codes.clone(),
        }
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved_codes.is_empty()
    }
}
