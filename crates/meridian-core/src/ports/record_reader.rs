//! RecordReader port - 構造化レコードの読み出し
//!
//! # 学習ポイント
//! - 同期部分（locate: リソースの存在確認）と非同期部分（read: ストリーム）の分離
//! - mpsc channel をストリームとして使う（バックグラウンドで読み、呼び出し側で消費）
//! - Type erasure: trait は serde_json::Value を流し、型付けは RecordStream 側で行う

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ReadError, RecordShape};

/// ストリームに流れる 1 件（デコード前の値 or 読み込み失敗）
pub type RawItem = Result<serde_json::Value, ReadError>;

/// RecordReader はリソースを構造化レコードの列として読み出す
///
/// # 契約
/// - `locate()` は同期。見つからなければ `ReadError::NotFound`
/// - `read()` はすぐにストリームを返し、レコードは非同期に届く
/// - ストリーム途中の失敗は `Err` アイテムとして届き、その後ストリームは終わる
#[async_trait]
pub trait RecordReader: Send + Sync {
    /// リソースが存在するか確認する
    fn locate(&self, resource: &str) -> Result<(), ReadError>;

    /// `element` 要素のレコード列を読み出す
    async fn read(&self, resource: &str, element: &str) -> Result<RecordStream, ReadError>;
}

/// RecordStream は非同期に届くレコード列
pub struct RecordStream {
    rx: mpsc::Receiver<RawItem>,
}

/// RecordStream の送信側（RecordReader 実装が使う）
pub type RecordSender = mpsc::Sender<RawItem>;

impl RecordStream {
    pub fn new(rx: mpsc::Receiver<RawItem>) -> Self {
        Self { rx }
    }

    /// 容量 `capacity` の channel を作り、送信側とストリームを返す
    pub fn channel(capacity: usize) -> (RecordSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx))
    }

    /// 次の値（デコード前）
    pub async fn next_value(&mut self) -> Option<RawItem> {
        self.rx.recv().await
    }

    /// 次のレコードを `T` にデコードして返す
    pub async fn next_record<T: RecordShape>(&mut self) -> Option<Result<T, ReadError>> {
        let item = self.next_value().await?;
        Some(item.and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| ReadError::Decode(format!("{}: {e}", T::ELEMENT)))
        }))
    }

    /// 残りを全部読み、最初の失敗で止まる
    pub async fn collect<T: RecordShape>(mut self) -> Result<Vec<T>, ReadError> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record::<T>().await {
            out.push(record?);
        }
        Ok(out)
    }
}
