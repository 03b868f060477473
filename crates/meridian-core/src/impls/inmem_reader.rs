//! InMemoryRecordReader - 開発・テスト用の RecordReader
//!
//! # 学習ポイント
//! - Mutex の中で完結する短いクリティカルセクション（await を跨がない）
//! - tokio::spawn でバックグラウンド送信し、呼び出し側はすぐにストリームを受け取る
//! - 障害注入（fail_after）と一時停止（pause）でパイプラインの途中状態をテストする

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::ReadError;
use crate::ports::{RecordReader, RecordStream};

const DEFAULT_CAPACITY: usize = 16;

/// 注入する転送エラー
#[derive(Debug, Clone)]
struct InjectedFailure {
    /// この件数を送った後に失敗する
    after: usize,
    message: String,
    /// 残り回数（None なら毎回）
    remaining: Option<u32>,
}

#[derive(Default)]
struct ReaderState {
    resources: HashMap<String, Vec<serde_json::Value>>,
    failures: HashMap<String, InjectedFailure>,
    pauses: HashMap<String, Arc<Notify>>,
    reads: HashMap<String, usize>,
}

/// InMemoryRecordReader はリソース名ごとに値の列を保持する
///
/// # 使用例
/// ```ignore
/// let reader = InMemoryRecordReader::new()
///     .with_resource("countries", vec![json!({ "code": "US", "name": "United States" })]);
/// let stream = reader.read("countries", "iso_3166_entry").await?;
/// ```
///
/// 要素名はメモリ上では区別しない（1 リソース = 1 要素列）。
pub struct InMemoryRecordReader {
    state: Arc<Mutex<ReaderState>>,
    capacity: usize,
}

impl InMemoryRecordReader {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ReaderState::default())),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// channel の容量を変える
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// リソースを登録（builder 形式）
    pub fn with_resource(self, resource: &str, values: Vec<serde_json::Value>) -> Self {
        self.insert(resource, values);
        self
    }

    /// リソースを登録・置き換え
    pub fn insert(&self, resource: &str, values: Vec<serde_json::Value>) {
        let mut state = self.lock();
        state.resources.insert(resource.to_string(), values);
    }

    /// `after` 件送った後、毎回 I/O エラーで失敗させる
    pub fn fail_after(&self, resource: &str, after: usize, message: &str) {
        self.inject(resource, after, message, None);
    }

    /// 次の `times` 回の読み出しだけ失敗させる
    pub fn fail_times(&self, resource: &str, after: usize, message: &str, times: u32) {
        self.inject(resource, after, message, Some(times));
    }

    /// 次の読み出しを止め、返された Notify が鳴るまで 1 件も送らない
    pub fn pause(&self, resource: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        let mut state = self.lock();
        state.pauses.insert(resource.to_string(), Arc::clone(&notify));
        notify
    }

    /// これまでに `resource` が読まれた回数
    pub fn read_count(&self, resource: &str) -> usize {
        let state = self.lock();
        state.reads.get(resource).copied().unwrap_or(0)
    }

    fn inject(&self, resource: &str, after: usize, message: &str, remaining: Option<u32>) {
        let mut state = self.lock();
        state.failures.insert(
            resource.to_string(),
            InjectedFailure {
                after,
                message: message.to_string(),
                remaining,
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReaderState> {
        // 保持中に panic するコードはないので poison はそのまま引き継ぐ
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 今回の読み出しで使う失敗設定を取り出す（回数制限付きなら 1 減らす）
    fn take_failure(state: &mut ReaderState, resource: &str) -> Option<InjectedFailure> {
        let failure = state.failures.get_mut(resource)?;
        match failure.remaining {
            None => Some(failure.clone()),
            Some(0) => None,
            Some(n) => {
                failure.remaining = Some(n - 1);
                Some(failure.clone())
            }
        }
    }
}

impl Default for InMemoryRecordReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordReader for InMemoryRecordReader {
    fn locate(&self, resource: &str) -> Result<(), ReadError> {
        let state = self.lock();
        if state.resources.contains_key(resource) {
            Ok(())
        } else {
            Err(ReadError::NotFound(format!("no in-memory resource named {resource}")))
        }
    }

    async fn read(&self, resource: &str, element: &str) -> Result<RecordStream, ReadError> {
        let (values, failure, pause) = {
            let mut state = self.lock();
            let Some(values) = state.resources.get(resource).cloned() else {
                return Err(ReadError::NotFound(format!(
                    "no in-memory resource named {resource}"
                )));
            };
            *state.reads.entry(resource.to_string()).or_default() += 1;
            let failure = Self::take_failure(&mut state, resource);
            let pause = state.pauses.remove(resource);
            (values, failure, pause)
        };
        tracing::trace!(resource, element, records = values.len(), "in-memory read");

        let (tx, stream) = RecordStream::channel(self.capacity);
        tokio::spawn(async move {
            if let Some(pause) = pause {
                pause.notified().await;
            }
            let fail_at = failure.as_ref().map(|f| f.after.min(values.len()));
            for (sent, value) in values.into_iter().enumerate() {
                if fail_at == Some(sent) {
                    break;
                }
                if tx.send(Ok(value)).await.is_err() {
                    // 受信側が先に drop された
                    return;
                }
            }
            if let Some(failure) = failure {
                let _ = tx.send(Err(ReadError::Io(failure.message))).await;
            }
        });

        Ok(stream)
    }
}
