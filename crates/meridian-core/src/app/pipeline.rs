//! LoadPipeline - 国 → 下位区分の 2 ステージ読み込み
//!
//! # フロー
//! 1. `start()`: 両リソースを同期的に確認（Configuration エラーはここで返る）
//! 2. progress flag を立て、tokio タスクを起動してすぐに戻る
//! 3. ステージ 1（国）が最後まで成功したら、続けてステージ 2（下位区分）
//! 4. Index のインストール後、選択状態を作り直し、Ready にして progress を下ろす
//!
//! Transfer エラーはステージ単位で RetryPolicy に従い再試行し、
//! 尽きたら Failed にする。キャンセルは watch channel で伝える。

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::country_loader::CountryLoader;
use crate::app::selection::SelectionStore;
use crate::app::subdivision_loader::SubdivisionLoader;
use crate::config::PipelineConfig;
use crate::domain::{LoadReport, LoadStage, LoadState, SelectorError};

/// パイプラインが途中で止まった理由
enum Halt {
    Failed(LoadStage, SelectorError),
    Cancelled,
}

pub struct LoadPipeline {
    countries: CountryLoader,
    subdivisions: SubdivisionLoader,
    store: Arc<SelectionStore>,
    config: PipelineConfig,
    running: AtomicBool,
}

impl LoadPipeline {
    pub fn new(
        countries: CountryLoader,
        subdivisions: SubdivisionLoader,
        store: Arc<SelectionStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            countries,
            subdivisions,
            store,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// 両リソースが存在するか確認する（同期）
    pub fn check(&self) -> Result<(), SelectorError> {
        self.countries.check()?;
        self.subdivisions.check()
    }

    /// パイプラインを起動する
    ///
    /// tokio runtime の中から呼ぶこと。失敗した場合、観測可能な状態は一切変わらない。
    pub fn start(self: Arc<Self>) -> Result<LoadHandle, SelectorError> {
        self.check()?;
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SelectorError::AlreadyLoading);
        }

        self.store.progress_handle().set(true);
        self.store
            .state_handle()
            .set(LoadState::loading(LoadStage::Countries));
        // 前回の Index は新しい Index のインストールまで見せない
        self.subdivisions.clear_index();
        self.store.refresh();
        tracing::info!(
            countries = self.countries.resource(),
            subdivisions = self.subdivisions.resource(),
            "load pipeline started"
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let join = tokio::spawn(async move { self.run(cancel_rx).await });
        Ok(LoadHandle { join, cancel_tx })
    }

    async fn run(&self, mut cancel_rx: watch::Receiver<bool>) -> Result<LoadReport, SelectorError> {
        let mut guard = RunGuard {
            pipeline: self,
            finished: false,
        };
        let outcome = tokio::select! {
            outcome = self.stages() => outcome,
            _ = cancelled(&mut cancel_rx) => Err(Halt::Cancelled),
        };
        let result = self.finish(outcome);
        guard.finished = true;
        result
    }

    async fn stages(&self) -> Result<LoadReport, Halt> {
        let country_load = self
            .with_retry(LoadStage::Countries, || self.countries.load_countries())
            .await?;

        // ステージ 1 の完了が、ステージ 2 の開始条件
        self.store
            .state_handle()
            .set(LoadState::loading(LoadStage::Subdivisions));
        let build = self
            .with_retry(LoadStage::Subdivisions, || {
                self.subdivisions.load_subdivisions()
            })
            .await?;

        Ok(LoadReport::from_build(
            country_load.loaded,
            country_load.duplicates,
            &build,
        ))
    }

    async fn with_retry<T, F, Fut>(&self, stage: LoadStage, mut attempt: F) -> Result<T, Halt>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SelectorError>>,
    {
        let policy = &self.config.retry;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transfer() && policy.allows_retry(attempts) => {
                    let delay = policy.next_delay(attempts);
                    tracing::warn!(
                        %stage,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "stage failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(Halt::Failed(stage, err)),
            }
        }
    }

    fn finish(&self, outcome: Result<LoadReport, Halt>) -> Result<LoadReport, SelectorError> {
        let progress = self.store.progress_handle();
        let state = self.store.state_handle();

        match outcome {
            Ok(report) => {
                self.store.refresh();
                state.set(LoadState::Ready);
                progress.set(false);
                tracing::info!(
                    countries = report.countries,
                    subdivisions = report.subdivisions,
                    unresolved = report.unresolved_codes.len(),
                    "load pipeline finished"
                );
                Ok(report)
            }
            Err(Halt::Cancelled) => {
                state.set(LoadState::Cancelled);
                progress.set(false);
                tracing::info!("load pipeline cancelled");
                Err(SelectorError::Cancelled)
            }
            Err(Halt::Failed(stage, err)) => {
                tracing::error!(%stage, error = %err, "load pipeline halted");
                state.set(LoadState::Failed {
                    stage,
                    message: err.to_string(),
                });
                if self.config.clear_progress_on_failure {
                    progress.set(false);
                }
                Err(err)
            }
        }
    }
}

/// `run()` の終了時に running を下ろす
///
/// `finish()` に届かずに終わった場合（タスク内の panic など）は Failed にする。
struct RunGuard<'a> {
    pipeline: &'a LoadPipeline,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let store = &self.pipeline.store;
            let stage = match store.state_handle().get() {
                LoadState::LoadingSubdivisions => LoadStage::Subdivisions,
                _ => LoadStage::Countries,
            };
            tracing::error!(%stage, "load task ended before finishing");
            store.state_handle().set(LoadState::Failed {
                stage,
                message: "load task ended before finishing".to_string(),
            });
            if self.pipeline.config.clear_progress_on_failure {
                store.progress_handle().set(false);
            }
        }
        self.pipeline.running.store(false, Ordering::Release);
    }
}

/// キャンセル要求が来るまで待つ（送信側が drop されたら永遠に待つ）
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// 起動済みパイプラインのハンドル
///
/// drop してもパイプラインは止まらない（結果を待たないだけ）。
#[derive(Debug)]
pub struct LoadHandle {
    join: JoinHandle<Result<LoadReport, SelectorError>>,
    cancel_tx: watch::Sender<bool>,
}

impl LoadHandle {
    /// キャンセルを要求する。次のレコード境界で止まる
    pub fn cancel(&self) {
        // ignore send error: the pipeline may already be done
        let _ = self.cancel_tx.send(true);
    }

    /// パイプラインの終了を待つ
    pub async fn wait(self) -> Result<LoadReport, SelectorError> {
        let Self { join, cancel_tx } = self;
        let result = join
            .await
            .map_err(|e| SelectorError::Join(e.to_string()))?;
        drop(cancel_tx);
        result
    }
}
