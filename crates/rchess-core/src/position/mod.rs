//! 局面表現モジュール
//!
//! チェスの局面を表現し、手の実行・巻き戻しを行う。
//!
//! - `Position`: 局面本体（駒別Bitboard・盤面配列・手番・キャスリング権・EP升・手数）
//! - `UndoInfo` / `NullUndo`: 巻き戻し用の値型レコード
//! - `zobrist`: Zobristハッシュ乱数テーブル（駒×升・手番・キャスリング権・EP筋）
//! - `make_move` / `unmake_move` / `make_null_move`: 手の実行と巻き戻し
//! - FEN形式の解析・出力、UCI指し手文字列の解析
//! - 静的交換評価（SEE）
//!
//! 盤面配列・Bitboard・Zobristキーは `Position` のメソッドを通じて更新されることを前提とし、
//! 常に互いに整合しているように保つ。

mod fen;
mod make;
mod notation;
mod pos;
mod see;
pub mod zobrist;

pub use fen::{FEN_STARTPOS, FenError};
pub use make::{NullUndo, UndoInfo};
pub use notation::MoveParseError;
pub use pos::Position;
pub use see::SEE_VALUES;
