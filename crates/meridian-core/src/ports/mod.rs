//! Ports - 抽象化レイヤー
//!
//! コアは外部のデータ形式やファイル配置を知らない。
//! RecordReader がリソースの存在確認とレコード列の読み出しを担う。

pub mod record_reader;

pub use self::record_reader::{RawItem, RecordReader, RecordSender, RecordStream};
