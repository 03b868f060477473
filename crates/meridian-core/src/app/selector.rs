//! CountrySelector - 読み込みパイプラインと選択状態をまとめた窓口
//!
//! # 使用例
//! ```ignore
//! let selector = CountrySelector::builder()
//!     .reader(Arc::new(JsonFileReader::new("data")))
//!     .build()?;
//!
//! let handle = selector.init()?;          // すぐに戻る
//! let report = handle.wait().await?;      // 完了を待つ
//!
//! let us = selector.find_country_by_code("US");
//! selector.set_country(us.as_ref());
//! println!("{:?}", selector.subdivision_label().get());
//! ```

use std::sync::Arc;

use crate::app::builder::CountrySelectorBuilder;
use crate::app::observable::{ListView, ObservableList, ReadOnly};
use crate::app::pipeline::{LoadHandle, LoadPipeline};
use crate::app::selection::{IndexSlot, SelectionStore};
use crate::domain::{
    Country, LoadState, SelectorError, Subdivision, SubdivisionIndex, find_country_by_code,
};

pub struct CountrySelector {
    countries: ObservableList<Country>,
    index: IndexSlot,
    store: Arc<SelectionStore>,
    pipeline: Arc<LoadPipeline>,
}

impl CountrySelector {
    pub fn builder() -> CountrySelectorBuilder {
        CountrySelectorBuilder::new()
    }

    pub(crate) fn from_parts(
        countries: ObservableList<Country>,
        index: IndexSlot,
        store: Arc<SelectionStore>,
        pipeline: Arc<LoadPipeline>,
    ) -> Self {
        Self {
            countries,
            index,
            store,
            pipeline,
        }
    }

    /// 読み込みを開始する
    ///
    /// - どちらかのリソースが見つからなければ `SelectorError::Configuration`
    ///   （このとき観測可能な状態は何も変わらない）
    /// - 読み込み中なら `SelectorError::AlreadyLoading`
    pub fn init(&self) -> Result<LoadHandle, SelectorError> {
        Arc::clone(&self.pipeline).start()
    }

    /// 国を選択する（`None` で選択解除）
    pub fn set_country(&self, country: Option<&Country>) {
        self.store.set_country(country);
    }

    /// コードで国を探す（最初に一致したもの）
    pub fn find_country_by_code(&self, code: &str) -> Option<Country> {
        self.countries
            .with(|countries| find_country_by_code(countries, code).cloned())
    }

    pub fn available_countries(&self) -> ListView<Country> {
        self.store.countries()
    }

    pub fn subdivisions(&self) -> ListView<Subdivision> {
        self.store.subdivisions()
    }

    pub fn subdivision_label(&self) -> ReadOnly<Option<String>> {
        self.store.subdivision_label()
    }

    pub fn selected_country(&self) -> ReadOnly<Option<Country>> {
        self.store.selected()
    }

    pub fn in_progress(&self) -> ReadOnly<bool> {
        self.store.in_progress()
    }

    pub fn load_state(&self) -> ReadOnly<LoadState> {
        self.store.load_state()
    }

    /// インストール済みの Index（読み込み完了前は None）
    pub fn index(&self) -> Option<Arc<SubdivisionIndex>> {
        self.index.get()
    }
}
