//! SelectionStore - 選択中の国と、そこから導出される状態
//!
//! # 書き込みの分担
//! - 国リストと Index: パイプラインだけが書く（ここでは読むだけ）
//! - selected / subdivisions / label: `set_country` だけが書く
//! - progress flag: パイプラインが書き、ここから公開する
//!
//! `set_country` と `refresh` は別スレッドから同時に呼ばれうる（refresh は
//! パイプラインのタスクから）。selected / label / subdivisions の 3 つは
//! `selection` ロックの中でまとめて書き換える。

use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::observable::{ListView, Observable, ObservableList, ReadOnly};
use crate::domain::{Country, LoadState, Subdivision, SubdivisionIndex};

/// インストール済みの Index（読み込み完了前は None）
pub type IndexSlot = Observable<Option<Arc<SubdivisionIndex>>>;

pub struct SelectionStore {
    countries: ObservableList<Country>,
    index: IndexSlot,
    selected: Observable<Option<Country>>,
    subdivisions: ObservableList<Subdivision>,
    label: Observable<Option<String>>,
    in_progress: Observable<bool>,
    load_state: Observable<LoadState>,
    selection: Mutex<()>,
}

impl SelectionStore {
    pub fn new(countries: ObservableList<Country>, index: IndexSlot) -> Self {
        Self {
            countries,
            index,
            selected: Observable::new(None),
            subdivisions: ObservableList::new(),
            label: Observable::new(None),
            in_progress: Observable::new(false),
            load_state: Observable::new(LoadState::Idle),
            selection: Mutex::new(()),
        }
    }

    /// 国を選択し、下位区分リストとラベルを同期的に導出し直す
    ///
    /// - `None`: ラベルとリストをクリア
    /// - Index 未構築（読み込み途中）: 空リスト・ラベルなし
    /// - 下位区分のない国: 空リスト・ラベルなし（エラーではない）
    ///
    /// 購読者はロックを持ったまま呼ばれるので、購読者の中から
    /// `set_country` を呼んではいけない。
    pub fn set_country(&self, country: Option<&Country>) {
        let _selection = self.lock_selection();
        self.selected.set(country.cloned());
        self.derive(country);
    }

    /// 現在の選択で導出状態を作り直す（Index の差し替え後に呼ぶ）
    pub fn refresh(&self) {
        let _selection = self.lock_selection();
        let selected = self.selected.get();
        self.derive(selected.as_ref());
    }

    fn derive(&self, country: Option<&Country>) {
        let Some(country) = country else {
            self.label.set(None);
            self.subdivisions.clear();
            return;
        };

        let (label, subdivisions) = self.index.with(|index| match index {
            Some(index) => (
                index.label_of(country).map(str::to_string),
                index.subdivisions_of(country).to_vec(),
            ),
            None => (None, Vec::new()),
        });

        self.label.set(label);
        if subdivisions.is_empty() {
            self.subdivisions.clear();
        } else {
            self.subdivisions.replace_all(subdivisions);
        }
    }

    fn lock_selection(&self) -> MutexGuard<'_, ()> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn countries(&self) -> ListView<Country> {
        self.countries.read_only()
    }

    pub fn selected(&self) -> ReadOnly<Option<Country>> {
        self.selected.read_only()
    }

    pub fn subdivisions(&self) -> ListView<Subdivision> {
        self.subdivisions.read_only()
    }

    pub fn subdivision_label(&self) -> ReadOnly<Option<String>> {
        self.label.read_only()
    }

    pub fn in_progress(&self) -> ReadOnly<bool> {
        self.in_progress.read_only()
    }

    pub fn load_state(&self) -> ReadOnly<LoadState> {
        self.load_state.read_only()
    }

    pub(crate) fn progress_handle(&self) -> Observable<bool> {
        self.in_progress.clone()
    }

    pub(crate) fn state_handle(&self) -> Observable<LoadState> {
        self.load_state.clone()
    }
}
