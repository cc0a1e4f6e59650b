//! 手の実行と巻き戻し（make / unmake / null move）

use crate::bitboard::{Bitboard, king_ray_union};
use crate::types::{CastlingRights, Color, Move, Piece, PieceType, Square};

use super::Position;
use super::zobrist::{zobrist_castling, zobrist_ep, zobrist_side};

/// 巻き戻し情報
///
/// `make_move` が返し、`unmake_move` が消費する値型レコード。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoInfo {
    /// 取った駒（アンパッサンで取ったポーンを含む）
    pub captured: Piece,
    pub castling: CastlingRights,
    pub ep_square: Square,
    pub halfmove: u32,
    pub fullmove: u32,
    pub key: u64,
    pub checkers: Bitboard,
    /// キャスリング時のルーク移動元・移動先（それ以外は NONE）
    pub rook_from: Square,
    pub rook_to: Square,
}

/// null move の巻き戻し情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullUndo {
    pub ep_square: Square,
    pub halfmove: u32,
    pub key: u64,
}

/// 升から動いた/取られたときに残すキャスリング権のマスク
const CASTLING_MASK: [u8; Square::NUM] = {
    let mut t = [15u8; Square::NUM];
    t[Square::E1.index()] = 15 & !(1 | 2);
    t[Square::H1.index()] = 15 & !1;
    t[Square::A1.index()] = 15 & !2;
    t[Square::E8.index()] = 15 & !(4 | 8);
    t[Square::H8.index()] = 15 & !4;
    t[Square::A8.index()] = 15 & !8;
    t
};

/// キャスリングの (ルーク移動元, ルーク移動先, 玉の通過升)
#[inline]
fn castle_squares(king_to: Square) -> (Square, Square, Square) {
    match king_to {
        Square::G1 => (Square::H1, Square::F1, Square::F1),
        Square::C1 => (Square::A1, Square::D1, Square::D1),
        Square::G8 => (Square::H8, Square::F8, Square::F8),
        _ => (Square::A8, Square::D8, Square::D8),
    }
}

/// アンパッサンで取られるポーンの升
#[inline]
fn ep_victim_square(to: Square, us: Color) -> Square {
    Square::new((to.raw() as i8 - us.forward()) as u8)
}

impl Position {
    /// 指し手を実行する
    ///
    /// 自玉が王手に晒される手なら局面を元に戻して `None` を返す。
    /// 王手判定は「玉の移動」「アンパッサン」「元々王手されていた」「移動元が玉のレイ上」の
    /// いずれかに当てはまる場合だけ行う。
    pub fn make_move(&mut self, m: Move) -> Option<UndoInfo> {
        let us = self.side_to_move;
        let them = !us;
        let from = m.from();
        let to = m.to();
        let moved = self.board[from.index()];
        if !self.move_matches_board(m) {
            log::debug!("rejecting move {m} that does not fit the board");
            return None;
        }

        if m.is_castle() && !self.castle_path_safe(to) {
            return None;
        }

        let was_in_check = self.checkers.is_not_empty();
        let mut undo = UndoInfo {
            captured: Piece::NONE,
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            key: self.key,
            checkers: self.checkers,
            rook_from: Square::NONE,
            rook_to: Square::NONE,
        };

        if self.ep_square.is_some() {
            self.key ^= zobrist_ep(self.ep_square);
            self.ep_square = Square::NONE;
        }

        if m.is_en_passant() {
            undo.captured = self.remove_piece_keyed(ep_victim_square(to, us));
        } else if self.board[to.index()].is_some() {
            undo.captured = self.remove_piece_keyed(to);
        }

        self.remove_piece_keyed(from);
        let placed = if m.is_promotion() { m.promotion() } else { moved };
        self.put_piece_keyed(to, placed);

        if m.is_castle() {
            let (rook_from, rook_to, _) = castle_squares(to);
            let rook = self.remove_piece_keyed(rook_from);
            self.put_piece_keyed(rook_to, rook);
            undo.rook_from = rook_from;
            undo.rook_to = rook_to;
        }

        let rights = self
            .castling
            .masked(CASTLING_MASK[from.index()] & CASTLING_MASK[to.index()]);
        if rights != self.castling {
            self.key ^= zobrist_castling(self.castling) ^ zobrist_castling(rights);
            self.castling = rights;
        }

        let is_pawn = moved.piece_type() == PieceType::Pawn;
        if is_pawn && from.raw().abs_diff(to.raw()) == 16 {
            self.ep_square = Square::new((from.raw() + to.raw()) / 2);
            self.key ^= zobrist_ep(self.ep_square);
        }

        self.side_to_move = them;
        self.key ^= zobrist_side();

        if is_pawn || undo.captured.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if us == Color::Black {
            self.fullmove += 1;
        }

        let ksq = self.king_square(us);
        let needs_check = ksq.is_some()
            && (moved.piece_type() == PieceType::King
                || m.is_en_passant()
                || was_in_check
                || king_ray_union(ksq).contains(from));
        if needs_check && self.is_square_attacked(ksq, them, self.occupied()) {
            self.unmake_move(m, &undo);
            return None;
        }

        self.checkers = self.compute_checkers();
        debug_assert_eq!(self.validate(), Ok(()));
        Some(undo)
    }

    /// 動かす駒・取る駒が盤面と一致するか
    ///
    /// 一致しない手を実行すると bitboard と盤配列がずれるので、変更前に弾く。
    fn move_matches_board(&self, m: Move) -> bool {
        let us = self.side_to_move;
        let moved = self.board[m.from().index()];
        if moved.is_none() || moved.color() != us || moved != m.moved() {
            return false;
        }
        let target = self.board[m.to().index()];
        if m.is_en_passant() {
            return m.to() == self.ep_square
                && target.is_none()
                && self.board[ep_victim_square(m.to(), us).index()]
                    == Piece::new(!us, PieceType::Pawn);
        }
        target.is_none() || target.color() != us
    }

    /// 指し手を巻き戻す
    pub fn unmake_move(&mut self, m: Move, undo: &UndoInfo) {
        self.side_to_move = !self.side_to_move;
        let us = self.side_to_move;
        let from = m.from();
        let to = m.to();

        if undo.rook_from.is_some() {
            let rook = self.remove_piece_raw(undo.rook_to);
            self.put_piece_raw(undo.rook_from, rook);
        }

        self.remove_piece_raw(to);
        self.put_piece_raw(from, m.moved());

        if undo.captured.is_some() {
            let sq = if m.is_en_passant() {
                ep_victim_square(to, us)
            } else {
                to
            };
            self.put_piece_raw(sq, undo.captured);
        }

        self.castling = undo.castling;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.fullmove = undo.fullmove;
        self.checkers = undo.checkers;
        self.key = undo.key;
        debug_assert_eq!(self.validate(), Ok(()));
    }

    /// null move（手番だけを渡す）
    ///
    /// 王手されている局面では呼ばないこと。
    pub fn make_null_move(&mut self) -> NullUndo {
        debug_assert!(!self.is_in_check());
        let undo = NullUndo {
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
        };
        if self.ep_square.is_some() {
            self.key ^= zobrist_ep(self.ep_square);
            self.ep_square = Square::NONE;
        }
        self.side_to_move = !self.side_to_move;
        self.key ^= zobrist_side();
        self.halfmove += 1;
        // 合法局面では手番でない側は王手されていない
        self.checkers = Bitboard::EMPTY;
        undo
    }

    /// null move を巻き戻す
    pub fn unmake_null_move(&mut self, undo: &NullUndo) {
        self.side_to_move = !self.side_to_move;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.key = undo.key;
        self.checkers = Bitboard::EMPTY;
    }

    /// キャスリングの出発升・通過升が攻撃されていないか
    fn castle_path_safe(&self, king_to: Square) -> bool {
        if self.checkers.is_not_empty() {
            return false;
        }
        let (_, _, transit) = castle_squares(king_to);
        !self.is_square_attacked(transit, !self.side_to_move, self.occupied())
    }
}
