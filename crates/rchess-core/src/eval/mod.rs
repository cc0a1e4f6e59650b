//! 評価関数
//!
//! 手作りの特徴量を線形に組み合わせ、中盤(MG)・終盤(EG)の2値をフェーズで補間する。
//!
//! - `params`: 重み θ とそのレイアウト、既定値
//! - `model`: JSONモデルの読み書き
//! - `evaluate`: 評価本体（駒・モビリティ・テーパー）
//! - `pawns`: ポーン構造とパスポーン
//! - `king`: キング安全度、ポーンストーム、終盤の玉

mod evaluate;
mod king;
mod model;
mod params;
mod pawns;

pub use evaluate::{EVAL_LIMIT, KING_SAFETY_EG_DIVISOR, TOTAL_PHASE, evaluate, evaluate_white, game_phase};
pub use model::{MODEL_LAYOUT, ModelError};
pub use params::{EvalParams, KING_SAFETY_TABLE_LEN, MOBILITY_LEN, THETA_LAYOUT};
