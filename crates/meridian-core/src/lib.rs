//! meridian-core
//!
//! Country / subdivision reference data: an asynchronous two-stage loader,
//! the subdivision index it builds, and observable selection state.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Country, Subdivision, raw records, index, errors, state）
//! - **ports**: 抽象化レイヤー（RecordReader）
//! - **app**: 読み込みパイプライン、選択状態、Observable
//! - **impls**: RecordReader の実装（JsonFileReader, InMemoryRecordReader）
//! - **config**: TOML 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{CountrySelector, LoadHandle};
pub use config::SelectorConfig;
pub use domain::{Country, CountryCode, LoadReport, LoadState, SelectorError, Subdivision};
