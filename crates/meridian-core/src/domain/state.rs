//! State - 読み込みパイプラインの状態
//!
//! progress flag（bool）だけでは「失敗して止まった」ことが分からないため、
//! 明示的な状態を別に公開する。

use serde::{Deserialize, Serialize};
use std::fmt;

/// パイプラインのステージ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    Countries,
    Subdivisions,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Countries => f.write_str("countries"),
            LoadStage::Subdivisions => f.write_str("subdivisions"),
        }
    }
}

/// LoadState は読み込みパイプラインの状態
///
/// # 状態遷移
/// - Idle -> LoadingCountries -> LoadingSubdivisions -> Ready
/// - LoadingCountries / LoadingSubdivisions -> Failed（Transfer エラー）
/// - LoadingCountries / LoadingSubdivisions -> Cancelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    LoadingCountries,
    LoadingSubdivisions,
    Ready,
    Failed { stage: LoadStage, message: String },
    Cancelled,
}

impl LoadState {
    /// Is the pipeline still running?
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::LoadingCountries | LoadState::LoadingSubdivisions)
    }

    /// Is this a terminal state (no further transitions without a new init)?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadState::Ready | LoadState::Failed { .. } | LoadState::Cancelled
        )
    }

    pub fn loading(stage: LoadStage) -> Self {
        match stage {
            LoadStage::Countries => LoadState::LoadingCountries,
            LoadStage::Subdivisions => LoadState::LoadingSubdivisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LoadState::Idle, false, false)]
    #[case(LoadState::LoadingCountries, true, false)]
    #[case(LoadState::LoadingSubdivisions, true, false)]
    #[case(LoadState::Ready, false, true)]
    #[case(LoadState::Cancelled, false, true)]
    #[case(
        LoadState::Failed { stage: LoadStage::Countries, message: "boom".to_string() },
        false,
        true
    )]
    fn state_classification(
        #[case] state: LoadState,
        #[case] loading: bool,
        #[case] terminal: bool,
    ) {
        assert_eq!(state.is_loading(), loading);
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn failed_state_serializes_with_tag() {
        let state = LoadState::Failed {
            stage: LoadStage::Subdivisions,
            message: "eof".to_string(),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["stage"], "subdivisions");
    }
}
