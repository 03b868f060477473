//! JsonFileReader - ディレクトリ配下の JSON ファイルを読む RecordReader
//!
//! # ファイル形式
//! トップレベルのオブジェクトが要素名をキーに配列を持つ:
//! ```json
//! { "iso_3166_entry": [ { "alpha_2_code": "US", "name": "United States" } ] }
//! ```
//! トップレベルが配列ならそのままレコード列として扱う。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ReadError;
use crate::ports::{RecordReader, RecordSender, RecordStream};

pub struct JsonFileReader {
    base_dir: PathBuf,
    capacity: usize,
}

impl JsonFileReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            capacity: 64,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn path_of(&self, resource: &str) -> PathBuf {
        self.base_dir.join(resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl RecordReader for JsonFileReader {
    fn locate(&self, resource: &str) -> Result<(), ReadError> {
        let path = self.path_of(resource);
        if path.is_file() {
            Ok(())
        } else {
            Err(ReadError::NotFound(format!(
                "expected location was {}",
                path.display()
            )))
        }
    }

    async fn read(&self, resource: &str, element: &str) -> Result<RecordStream, ReadError> {
        self.locate(resource)?;
        let path = self.path_of(resource);
        let element = element.to_string();

        let (tx, stream) = RecordStream::channel(self.capacity);
        tokio::spawn(async move {
            if let Err(err) = stream_file(&path, &element, &tx).await {
                tracing::debug!(path = %path.display(), error = %err, "json read failed");
                let _ = tx.send(Err(err)).await;
            }
        });
        Ok(stream)
    }
}

async fn stream_file(path: &Path, element: &str, tx: &RecordSender) -> Result<(), ReadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ReadError::Io(format!("{}: {e}", path.display())))?;
    let document: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ReadError::Decode(format!("{}: {e}", path.display())))?;

    let records = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(element) {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        },
        _ => {
            return Err(ReadError::Decode(format!(
                "{}: expected an object or an array at the top level",
                path.display()
            )));
        }
    };

    for record in records {
        if tx.send(Ok(record)).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawCountryRecord, RawSubdivisionGroup, RecordShape};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn locate_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let reader = JsonFileReader::new(dir.path());
        let err = reader.locate("countries/iso_3166.json").unwrap_err();
        assert!(matches!(err, ReadError::NotFound(msg) if msg.contains("iso_3166.json")));
    }

    #[tokio::test]
    async fn reads_records_under_element_key() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "countries/iso_3166.json",
            r#"{ "iso_3166_entry": [
                { "alpha_2_code": "US", "name": "United States" },
                { "alpha_2_code": "DE", "name": "Germany" }
            ] }"#,
        );
        let reader = JsonFileReader::new(dir.path());

        let stream = reader
            .read("/countries/iso_3166.json", RawCountryRecord::ELEMENT)
            .await
            .unwrap();
        let records = stream.collect::<RawCountryRecord>().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Germany");
    }

    #[tokio::test]
    async fn reads_nested_subdivision_groups() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "iso_3166_2.json",
            r#"{ "iso_3166_country": [
                { "code": "US", "iso_3166_subset": [
                    { "type": "State", "iso_3166_2_entry": [ { "code": "US-CA", "name": "California" } ] }
                ] }
            ] }"#,
        );
        let reader = JsonFileReader::new(dir.path());

        let stream = reader
            .read("iso_3166_2.json", RawSubdivisionGroup::ELEMENT)
            .await
            .unwrap();
        let groups = stream.collect::<RawSubdivisionGroup>().await.unwrap();
        assert_eq!(groups[0].subsets[0].entries[0].code, "US-CA");
    }

    #[tokio::test]
    async fn top_level_array_and_missing_element() {
        let dir = TempDir::new().unwrap();
        write(&dir, "list.json", r#"[ { "code": "FR", "name": "France" } ]"#);
        write(&dir, "other.json", r#"{ "something_else": [] }"#);
        let reader = JsonFileReader::new(dir.path());

        let list = reader.read("list.json", "ignored").await.unwrap();
        assert_eq!(list.collect::<RawCountryRecord>().await.unwrap().len(), 1);

        let other = reader.read("other.json", RawCountryRecord::ELEMENT).await.unwrap();
        assert!(other.collect::<RawCountryRecord>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_document_is_delivered_as_stream_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.json", r#"{ "iso_3166_entry": [ { "code": "#);
        let reader = JsonFileReader::new(dir.path());

        let stream = reader.read("broken.json", RawCountryRecord::ELEMENT).await.unwrap();
        let err = stream.collect::<RawCountryRecord>().await.unwrap_err();
        assert!(matches!(err, ReadError::Decode(_)));
    }
}
