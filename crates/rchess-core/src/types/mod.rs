//! 基本型
//!
//! - `Color`: 手番（白/黒）
//! - `Square`: 升（a1=0 .. h8=63）
//! - `PieceType` / `Piece`: 駒種と先後付きの駒
//! - `Move`: 32bitにパックした指し手
//! - `Value`: 評価値（詰みスコアを含む）
//! - `Bound`: 置換表の境界種別
//! - `CastlingRights`: キャスリング権（4bitマスク）

mod bound;
mod castling;
mod color;
mod moves;
mod piece;
mod square;
mod value;

pub use bound::Bound;
pub use castling::CastlingRights;
pub use color::Color;
pub use moves::{Move, MoveFlag};
pub use piece::{Piece, PieceType};
pub use square::Square;
pub use value::Value;

/// 探索深さ（plyではなく残り深さ）
pub type Depth = i32;

/// 探索の最大ply
pub const MAX_PLY: i32 = 128;

/// 1局面の最大合法手数（指し手バッファの容量）
pub const MAX_MOVES: usize = 256;
