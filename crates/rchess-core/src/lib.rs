//! # rchess-core
//!
//! ビットボードベースのチェスエンジンコアライブラリ。
//!
//! ## モジュール構成
//!
//! - `types`: 基本型（Color, Square, Piece, Move, Value, etc.）
//! - `bitboard`: ビットボード演算と利きテーブル
//! - `position`: 局面表現とmake/unmake、Zobristハッシュ、SEE
//! - `movegen`: 合法手生成とperft
//! - `eval`: テーパード線形評価関数
//! - `tt`: 置換表（Transposition Table）
//! - `search`: 反復深化 + PVS探索、静止探索、時間管理

pub mod types;

pub mod bitboard;
pub mod position;

pub mod movegen;

pub mod eval;

pub mod tt;

pub mod search;

pub use position::{FenError, MoveParseError, Position, UndoInfo, FEN_STARTPOS};
pub use types::{Bound, CastlingRights, Color, Move, MoveFlag, Piece, PieceType, Square, Value};
