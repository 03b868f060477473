//! App - アプリケーション層
//!
//! ports と domain を組み合わせて読み込みパイプラインと選択状態を実装します。
//!
//! # 主要コンポーネント
//! - **CountrySelector / CountrySelectorBuilder**: 窓口と構築
//! - **LoadPipeline**: 国 → 下位区分の 2 ステージ読み込み
//! - **CountryLoader / SubdivisionLoader**: 各ステージ
//! - **SelectionStore**: 選択中の国と導出状態
//! - **Observable / ObservableList**: 変更通知つきの値

pub mod builder;
pub mod country_loader;
pub mod observable;
pub mod pipeline;
pub mod selection;
pub mod selector;
pub mod subdivision_loader;

pub use self::builder::{BuildError, CountrySelectorBuilder};
pub use self::country_loader::{CountryLoad, CountryLoader};
pub use self::observable::{ListChange, ListView, Observable, ObservableList, ReadOnly, SubscriptionId};
pub use self::pipeline::{LoadHandle, LoadPipeline};
pub use self::selection::{IndexSlot, SelectionStore};
pub use self::selector::CountrySelector;
pub use self::subdivision_loader::SubdivisionLoader;
