//! Impls - RecordReader の実装
//!
//! # 含まれる実装
//! - **JsonFileReader**: ディレクトリ配下の JSON データセット（本番用）
//! - **InMemoryRecordReader**: 開発・テスト用（障害注入・一時停止つき）

pub mod inmem_reader;
pub mod json_file;

pub use self::inmem_reader::InMemoryRecordReader;
pub use self::json_file::JsonFileReader;
