//! ビットボードモジュール
//!
//! 64升の盤面を `u64` で表現し、ビット演算と利き計算を提供する。
//!
//! - `Bitboard`: 64bit盤面表現（bit i ↔ 升 i）
//! - 筋・段ごとのマスク（`FILE_BB`, `RANK_BB`）
//! - 近接駒の利きテーブル（ポーン・ナイト・キング）
//! - 方向別レイ、`between_bb` / `line_bb`、`king_ray_union`
//! - 遠方駒の利き（占有マスクのpextで引くテーブル）

mod core;
mod sliders;
mod tables;

pub use core::{Bitboard, BitboardIter};
pub use sliders::{bishop_attacks, pext, queen_attacks, rook_attacks};
pub use tables::*;
