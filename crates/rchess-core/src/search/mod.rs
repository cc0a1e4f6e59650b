//! 探索モジュール
//!
//! - `Engine`: 局面・置換表・History を所有し、反復深化探索を行うハンドル
//! - `alpha_beta` / `qsearch`: PVS と静止探索（`SearchWorker` のメソッド）
//! - `history`: キラー手・History・カウンター手・LMRテーブル
//! - `ordering`: 指し手オーダリング（MovePicker）
//! - `state_stack`: 千日手・50手ルール判定用の局面履歴
//! - `time`: 時間管理
//! - `params`: UCI `setoption` で変更できる枝刈り係数
//! - `stats`: 探索統計（search-stats feature）

mod alpha_beta;
mod engine;
mod history;
mod limits;
mod ordering;
mod params;
mod pv;
mod qsearch;
mod state_stack;
mod stats;
mod time;

pub use engine::Engine;
pub use history::{COUNTER_MOVE_BONUS, HISTORY_MAX, Heuristics, lmr_reduction};
pub use limits::{SearchInfo, SearchLimits, SearchResult, format_score};
pub use params::{SearchOptionSpec, SearchParams, SearchSetResult};
pub use pv::PvLine;
pub use state_stack::StateStack;
#[cfg(feature = "search-stats")]
pub use stats::SearchStats;
pub use time::{
    BEST_STABLE_THRESHOLD, EARLY_STOP_MIN_PERCENT, SCORE_STABLE_MARGIN, SCORE_STABLE_THRESHOLD,
    TimeManager,
};

/// ミリ秒単位の時刻・時間
pub type TimePoint = i64;
