//! SubdivisionLoader - 下位区分データセットを読み、Index を構築してインストールする（ステージ 2）
//!
//! レコードはまず一時バッファに集め、ストリームが最後まで成功してから
//! Index を構築する。読み込み途中の部分的な Index は外から見えない。

use std::sync::Arc;

use crate::app::observable::ObservableList;
use crate::app::selection::IndexSlot;
use crate::domain::{
    Country, IndexBuild, RawSubdivisionGroup, RecordShape, SelectorError, build_index,
};
use crate::ports::RecordReader;

pub struct SubdivisionLoader {
    reader: Arc<dyn RecordReader>,
    resource: String,
    countries: ObservableList<Country>,
    index: IndexSlot,
}

impl SubdivisionLoader {
    pub fn new(
        reader: Arc<dyn RecordReader>,
        resource: impl Into<String>,
        countries: ObservableList<Country>,
        index: IndexSlot,
    ) -> Self {
        Self {
            reader,
            resource: resource.into(),
            countries,
            index,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// リソースの存在確認（同期）。見つからなければ Configuration エラー
    pub fn check(&self) -> Result<(), SelectorError> {
        self.reader
            .locate(&self.resource)
            .map_err(|e| SelectorError::from_read(&self.resource, e))
    }

    /// インストール済みの Index を外す（再読み込みの開始時）
    pub fn clear_index(&self) {
        self.index.set(None);
    }

    /// 下位区分を読み、Index を構築してインストールする
    ///
    /// 国ステージが成功した後にだけ呼ぶこと（国リストは完成している前提）。
    /// 返り値の `IndexBuild::index` はインストール済みのため空になっている。
    pub async fn load_subdivisions(&self) -> Result<IndexBuild, SelectorError> {
        self.check()?;
        let stream = self
            .reader
            .read(&self.resource, RawSubdivisionGroup::ELEMENT)
            .await
            .map_err(|e| SelectorError::from_read(&self.resource, e))?;

        let buffer = stream
            .collect::<RawSubdivisionGroup>()
            .await
            .map_err(|e| SelectorError::from_read(&self.resource, e))?;

        let countries = self.countries.snapshot();
        let mut build = build_index(&buffer, &countries);
        for code in &build.unresolved_codes {
            tracing::warn!(%code, "subdivision group references an unknown country");
        }

        let index = std::mem::take(&mut build.index);
        self.index.set(Some(Arc::new(index)));

        tracing::debug!(
            resource = %self.resource,
            groups = build.groups,
            subdivisions = build.subdivisions,
            unresolved = build.unresolved_codes.len(),
            "subdivision index installed"
        );
        Ok(build)
    }
}
