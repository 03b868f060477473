//! CountrySelectorBuilder - CountrySelector の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: reader 未指定・不正な設定は build() で弾く

use std::sync::Arc;

use crate::app::country_loader::CountryLoader;
use crate::app::observable::{Observable, ObservableList};
use crate::app::pipeline::LoadPipeline;
use crate::app::selection::{IndexSlot, SelectionStore};
use crate::app::selector::CountrySelector;
use crate::app::subdivision_loader::SubdivisionLoader;
use crate::config::{ConfigError, SelectorConfig};
use crate::impls::JsonFileReader;
use crate::ports::RecordReader;

/// BuildError は CountrySelector 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no record reader was supplied")]
    MissingReader,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

/// CountrySelectorBuilder は CountrySelector を構築
///
/// # 使用例
/// ```ignore
/// let selector = CountrySelector::builder()
///     .reader(Arc::new(reader))
///     .countries_resource("countries/iso_3166.json")
///     .build()?;
/// ```
///
/// リソース名は明示指定 > config.resources の順で決まる。
pub struct CountrySelectorBuilder {
    reader: Option<Arc<dyn RecordReader>>,
    json_files: bool,
    countries_resource: Option<String>,
    subdivisions_resource: Option<String>,
    config: SelectorConfig,
}

impl CountrySelectorBuilder {
    pub fn new() -> Self {
        Self {
            reader: None,
            json_files: false,
            countries_resource: None,
            subdivisions_resource: None,
            config: SelectorConfig::default(),
        }
    }

    pub fn reader(mut self, reader: Arc<dyn RecordReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// reader 未指定のとき、config.resources.base_dir を読む JsonFileReader を使う
    pub fn json_files(mut self) -> Self {
        self.json_files = true;
        self
    }

    pub fn countries_resource(mut self, resource: impl Into<String>) -> Self {
        self.countries_resource = Some(resource.into());
        self
    }

    pub fn subdivisions_resource(mut self, resource: impl Into<String>) -> Self {
        self.subdivisions_resource = Some(resource.into());
        self
    }

    pub fn config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    /// 検証してから CountrySelector を組み立てる
    pub fn build(self) -> Result<CountrySelector, BuildError> {
        self.config.validate()?;
        let reader: Arc<dyn RecordReader> = match self.reader {
            Some(reader) => reader,
            None if self.json_files => Arc::new(
                JsonFileReader::new(self.config.resources.base_dir.clone())
                    .with_capacity(self.config.pipeline.channel_capacity),
            ),
            None => return Err(BuildError::MissingReader),
        };

        let countries_resource = self
            .countries_resource
            .unwrap_or_else(|| self.config.resources.countries.clone());
        let subdivisions_resource = self
            .subdivisions_resource
            .unwrap_or_else(|| self.config.resources.subdivisions.clone());

        let countries: ObservableList<_> = ObservableList::new();
        let index: IndexSlot = Observable::new(None);
        let store = Arc::new(SelectionStore::new(countries.clone(), index.clone()));

        let country_loader =
            CountryLoader::new(Arc::clone(&reader), countries_resource, countries.clone());
        let subdivision_loader = SubdivisionLoader::new(
            reader,
            subdivisions_resource,
            countries.clone(),
            index.clone(),
        );
        let pipeline = Arc::new(LoadPipeline::new(
            country_loader,
            subdivision_loader,
            Arc::clone(&store),
            self.config.pipeline,
        ));

        Ok(CountrySelector::from_parts(countries, index, store, pipeline))
    }
}

impl Default for CountrySelectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryRecordReader;

    #[test]
    fn build_without_reader_fails() {
        let result = CountrySelectorBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingReader)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = SelectorConfig::default();
        config.pipeline.retry.max_attempts = 0;

        let result = CountrySelectorBuilder::new()
            .reader(Arc::new(InMemoryRecordReader::new()))
            .config(config)
            .build();
        assert!(matches!(result, Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn json_files_uses_configured_base_dir() {
        let mut config = SelectorConfig::default();
        config.resources.base_dir = std::path::PathBuf::from("/nonexistent/meridian");

        let selector = CountrySelectorBuilder::new()
            .json_files()
            .config(config)
            .build()
            .unwrap();
        let err = selector.init().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/meridian"));
    }

    #[test]
    fn build_with_reader_starts_idle() {
        let selector = CountrySelectorBuilder::new()
            .reader(Arc::new(InMemoryRecordReader::new()))
            .build()
            .unwrap();
        assert!(!selector.in_progress().get());
        assert!(selector.available_countries().is_empty());
        assert!(selector.index().is_none());
    }

    #[test]
    fn missing_resources_fail_init_without_touching_state() {
        let selector = CountrySelectorBuilder::new()
            .reader(Arc::new(InMemoryRecordReader::new()))
            .build()
            .unwrap();

        let err = selector.init().unwrap_err();

        assert!(matches!(err, crate::domain::SelectorError::Configuration { .. }));
        assert!(!selector.in_progress().get());
        assert_eq!(selector.load_state().get(), crate::domain::LoadState::Idle);
    }
}
