//! 指し手生成モジュール
//!
//! - `generate_legal*`: ピン・王手マスクを使った完全合法手生成（探索の主インターフェース）
//! - `generate_pseudo*`: 駒の動きと遮りだけを守る擬似合法手生成
//! - `perft` / `perft_divide`: 葉ノード数による検証
//!
//! どの生成関数も呼び出し側のバッファ（`MoveList`）に追記する。

mod generator;
mod movelist;
mod perft;

pub use generator::{
    CheckInfo, GenType, generate_legal, generate_legal_captures, generate_legal_quiets,
    generate_legal_with, generate_pseudo, generate_pseudo_with,
};
pub use movelist::MoveList;
pub use perft::{perft, perft_divide};
