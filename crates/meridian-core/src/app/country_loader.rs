//! CountryLoader - 国データセットを読み、国リストに追加する（ステージ 1）

use std::collections::HashSet;
use std::sync::Arc;

use crate::app::observable::ObservableList;
use crate::domain::{Country, CountryCode, RawCountryRecord, RecordShape, SelectorError};
use crate::ports::RecordReader;

/// 1 回の国読み込みの結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountryLoad {
    /// このパスで読んだ国の数（重複を除く）
    pub loaded: usize,
    /// 同じコードが再度現れてスキップした数
    pub duplicates: usize,
}

pub struct CountryLoader {
    reader: Arc<dyn RecordReader>,
    resource: String,
    countries: ObservableList<Country>,
}

impl CountryLoader {
    pub fn new(
        reader: Arc<dyn RecordReader>,
        resource: impl Into<String>,
        countries: ObservableList<Country>,
    ) -> Self {
        Self {
            reader,
            resource: resource.into(),
            countries,
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

    /// 国レコードを読み、届いた順に国リストへ追加する
    ///
    /// - 同じコードの 2 件目以降は警告してスキップ（最初の 1 件が勝つ）
    /// - 以前のパスで追加済みの国（リトライ時）は黙ってスキップ
    /// - ストリーム途中の失敗は Transfer エラーとして返す
    pub async fn load_countries(&self) -> Result<CountryLoad, SelectorError> {
        self.check()?;
        let mut stream = self
            .reader
            .read(&self.resource, RawCountryRecord::ELEMENT)
            .await
            .map_err(|e| SelectorError::from_read(&self.resource, e))?;

        let mut seen: HashSet<CountryCode> = HashSet::new();
        let mut load = CountryLoad::default();
        while let Some(record) = stream.next_record::<RawCountryRecord>().await {
            let record = record.map_err(|e| SelectorError::from_read(&self.resource, e))?;
            let country = Country::from(record);

            if !seen.insert(country.code().clone()) {
                tracing::warn!(code = %country.code(), "duplicate country code skipped");
                load.duplicates += 1;
                continue;
            }
            load.loaded += 1;
            if !self.countries.contains(&country) {
                self.countries.push(country);
            }
        }

        tracing::debug!(
            resource = %self.resource,
            loaded = load.loaded,
            duplicates = load.duplicates,
            "countries loaded"
        );
        Ok(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryRecordReader;
    use serde_json::json;

    const RESOURCE: &str = "countries";

    fn loader(reader: InMemoryRecordReader) -> (CountryLoader, ObservableList<Country>) {
        let countries = ObservableList::new();
        let loader = CountryLoader::new(Arc::new(reader), RESOURCE, countries.clone());
        (loader, countries)
    }

    #[test]
    fn missing_resource_is_a_configuration_error() {
        let (loader, countries) = loader(InMemoryRecordReader::new());
        let err = loader.check().unwrap_err();
        assert!(matches!(err, SelectorError::Configuration { resource, .. } if resource == RESOURCE));
        assert!(countries.is_empty());
    }

    #[tokio::test]
    async fn countries_are_appended_in_source_order() {
        let reader = InMemoryRecordReader::new().with_resource(
            RESOURCE,
            vec![
                json!({ "code": "US", "name": "United States" }),
                json!({ "code": "AT", "name": "Austria" }),
                json!({ "code": "BR", "name": "Brazil" }),
            ],
        );
        let (loader, countries) = loader(reader);

        let load = loader.load_countries().await.unwrap();

        assert_eq!(load.loaded, 3);
        let codes: Vec<String> = countries
            .snapshot()
            .iter()
            .map(|c| c.code().to_string())
            .collect();
        assert_eq!(codes, vec!["US", "AT", "BR"]);
    }

    #[tokio::test]
    async fn duplicate_codes_keep_the_first_entry() {
        let reader = InMemoryRecordReader::new().with_resource(
            RESOURCE,
            vec![
                json!({ "code": "US", "name": "United States" }),
                json!({ "code": "US", "name": "USA" }),
            ],
        );
        let (loader, countries) = loader(reader);

        let load = loader.load_countries().await.unwrap();

        assert_eq!(load, CountryLoad { loaded: 1, duplicates: 1 });
        assert_eq!(countries.len(), 1);
        assert_eq!(countries.get(0).unwrap().name(), "United States");
    }

    #[tokio::test]
    async fn stream_failure_is_a_transfer_error_and_keeps_prefix() {
        let reader = InMemoryRecordReader::new().with_resource(
            RESOURCE,
            vec![
                json!({ "code": "US", "name": "United States" }),
                json!({ "code": "CA", "name": "Canada" }),
            ],
        );
        reader.fail_after(RESOURCE, 1, "socket closed");
        let (loader, countries) = loader(reader);

        let err = loader.load_countries().await.unwrap_err();

        assert!(err.is_transfer());
        assert_eq!(countries.len(), 1);
    }

    #[tokio::test]
    async fn second_pass_does_not_duplicate_existing_countries() {
        let reader = InMemoryRecordReader::new().with_resource(
            RESOURCE,
            vec![json!({ "code": "US", "name": "United States" })],
        );
        let (loader, countries) = loader(reader);

        loader.load_countries().await.unwrap();
        let again = loader.load_countries().await.unwrap();

        assert_eq!(again, CountryLoad { loaded: 1, duplicates: 0 });
        assert_eq!(countries.len(), 1);
    }
}
