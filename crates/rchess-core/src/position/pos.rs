//! Position本体

use std::fmt;

use crate::bitboard::{
    Bitboard, RayDir, bishop_attacks, first_blocker, king_attacks, king_ray_union,
    knight_attacks, pawn_attacks, rook_attacks,
};
use crate::types::{CastlingRights, Color, Piece, PieceType, Square};

use super::zobrist::{zobrist_castling, zobrist_ep, zobrist_psq, zobrist_side};

/// 局面
///
/// 駒種別Bitboardは `[color][piece_type]` で引く（インデックス0は未使用）。
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    pub(super) by_piece: [[Bitboard; PieceType::NUM]; Color::NUM],
    pub(super) occupancy: [Bitboard; Color::NUM],
    pub(super) board: [Piece; Square::NUM],
    pub(super) side_to_move: Color,
    pub(super) castling: CastlingRights,
    pub(super) ep_square: Square,
    pub(super) halfmove: u32,
    pub(super) fullmove: u32,
    pub(super) key: u64,
    /// 手番側の玉に王手をかけている駒
    pub(super) checkers: Bitboard,
}

impl Position {
    /// 空の盤面（駒なし、白番）
    ///
    /// 玉がないため探索には使えない。FENの読み込みやテストの組み立てに使う。
    pub fn empty() -> Self {
        Position {
            by_piece: [[Bitboard::EMPTY; PieceType::NUM]; Color::NUM],
            occupancy: [Bitboard::EMPTY; Color::NUM],
            board: [Piece::NONE; Square::NUM],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            ep_square: Square::NONE,
            halfmove: 0,
            fullmove: 1,
            key: 0,
            checkers: Bitboard::EMPTY,
        }
    }

    /// 平手初期局面
    pub fn startpos() -> Self {
        match Position::from_fen(super::FEN_STARTPOS) {
            Ok(pos) => pos,
            Err(e) => unreachable!("start position FEN must parse: {e}"),
        }
    }

    // ========================================================================
    // 参照系
    // ========================================================================

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// アンパッサン升（なければ `Square::NONE`）
    #[inline]
    pub fn ep_square(&self) -> Square {
        self.ep_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove
    }

    /// Zobristキー
    #[inline]
    pub fn hash(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    #[inline]
    pub fn pieces(&self, color: Color, pt: PieceType) -> Bitboard {
        self.by_piece[color.index()][pt.index()]
    }

    /// 両陣営の指定駒種
    #[inline]
    pub fn pieces_by_type(&self, pt: PieceType) -> Bitboard {
        self.by_piece[0][pt.index()] | self.by_piece[1][pt.index()]
    }

    #[inline]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupancy[0] | self.occupancy[1]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces(color, PieceType::King).lsb()
    }

    /// ルーク・クイーン
    #[inline]
    pub fn rook_sliders(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceType::Rook) | self.pieces(color, PieceType::Queen)
    }

    /// ビショップ・クイーン
    #[inline]
    pub fn bishop_sliders(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceType::Bishop) | self.pieces(color, PieceType::Queen)
    }

    /// ポーン・キング以外の駒を持っているか（null move の可否判定）
    #[inline]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        (self.occupancy(color)
            & !self.pieces(color, PieceType::Pawn)
            & !self.pieces(color, PieceType::King))
        .is_not_empty()
    }

    /// 手番側に王手をかけている駒
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// 手番側が王手されているか
    #[inline]
    pub fn is_in_check(&self) -> bool {
        self.checkers.is_not_empty()
    }

    /// `color` の玉が相手の利きにあるか
    pub fn in_check(&self, color: Color) -> bool {
        let ksq = self.king_square(color);
        ksq.is_some() && self.is_square_attacked(ksq, !color, self.occupied())
    }

    // ========================================================================
    // 利き
    // ========================================================================

    /// `sq` が `by` 側の駒に攻撃されているか（占有 `occ` の下で）
    ///
    /// 攻撃駒は `occ` でマスクするので、シミュレーション用の占有で
    /// 取られた駒は攻撃駒に数えない。飛び駒は方向ごとに最初の遮り駒だけを見る。
    pub fn is_square_attacked(&self, sq: Square, by: Color, occ: Bitboard) -> bool {
        if (pawn_attacks(!by, sq) & self.pieces(by, PieceType::Pawn) & occ).is_not_empty() {
            return true;
        }
        if (knight_attacks(sq) & self.pieces(by, PieceType::Knight) & occ).is_not_empty() {
            return true;
        }
        if (king_attacks(sq) & self.pieces(by, PieceType::King) & occ).is_not_empty() {
            return true;
        }

        let rooks = self.rook_sliders(by) & occ;
        let bishops = self.bishop_sliders(by) & occ;
        if ((rooks | bishops) & king_ray_union(sq)).is_empty() {
            return false;
        }
        for dir in RayDir::ROOK {
            let b = first_blocker(sq, dir, occ);
            if b.is_some() && rooks.contains(b) {
                return true;
            }
        }
        for dir in RayDir::BISHOP {
            let b = first_blocker(sq, dir, occ);
            if b.is_some() && bishops.contains(b) {
                return true;
            }
        }
        false
    }

    /// `sq` に利いている両陣営の駒（占有 `occ` の下で）
    pub fn attackers_to(&self, sq: Square, occ: Bitboard) -> Bitboard {
        ((pawn_attacks(Color::Black, sq) & self.pieces(Color::White, PieceType::Pawn))
            | (pawn_attacks(Color::White, sq) & self.pieces(Color::Black, PieceType::Pawn))
            | (knight_attacks(sq) & self.pieces_by_type(PieceType::Knight))
            | (king_attacks(sq) & self.pieces_by_type(PieceType::King))
            | (bishop_attacks(sq, occ)
                & (self.pieces_by_type(PieceType::Bishop) | self.pieces_by_type(PieceType::Queen)))
            | (rook_attacks(sq, occ)
                & (self.pieces_by_type(PieceType::Rook) | self.pieces_by_type(PieceType::Queen))))
            & occ
    }

    /// `color` 側の駒が利いている升全体
    pub fn attacks_by(&self, color: Color) -> Bitboard {
        let occ = self.occupied();
        let mut attacks = crate::bitboard::pawn_attacks_bb(color, self.pieces(color, PieceType::Pawn));
        for sq in self.pieces(color, PieceType::Knight) {
            attacks |= knight_attacks(sq);
        }
        for sq in self.bishop_sliders(color) {
            attacks |= bishop_attacks(sq, occ);
        }
        for sq in self.rook_sliders(color) {
            attacks |= rook_attacks(sq, occ);
        }
        let ksq = self.king_square(color);
        if ksq.is_some() {
            attacks |= king_attacks(ksq);
        }
        attacks
    }

    /// 手番側の王手駒を再計算
    #[inline]
    pub(super) fn compute_checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        let ksq = self.king_square(us);
        if ksq.is_none() {
            return Bitboard::EMPTY;
        }
        self.attackers_to(ksq, self.occupied()) & self.occupancy(!us)
    }

    // ========================================================================
    // 駒の配置（Zobristキー込み）
    // ========================================================================

    /// 升に駒を置く（既存の駒は取り除く）
    ///
    /// 盤面配列・Bitboard・Zobristキー・王手駒を整合させる。探索では使わない。
    pub fn set_piece(&mut self, sq: Square, pc: Piece) {
        if self.board[sq.index()].is_some() {
            self.remove_piece_keyed(sq);
        }
        if pc.is_some() {
            self.put_piece_keyed(sq, pc);
        }
        self.checkers = self.compute_checkers();
    }

    /// 升の駒を取り除く（空なら何もしない）
    pub fn remove_piece(&mut self, sq: Square) -> Piece {
        let pc = self.board[sq.index()];
        if pc.is_some() {
            self.remove_piece_keyed(sq);
            self.checkers = self.compute_checkers();
        }
        pc
    }

    /// 手番を設定（キー込み）
    pub fn set_side_to_move(&mut self, color: Color) {
        if self.side_to_move != color {
            self.side_to_move = color;
            self.key ^= zobrist_side();
            self.checkers = self.compute_checkers();
        }
    }

    #[inline]
    pub(super) fn put_piece_keyed(&mut self, sq: Square, pc: Piece) {
        self.put_piece_raw(sq, pc);
        self.key ^= zobrist_psq(pc, sq);
    }

    #[inline]
    pub(super) fn remove_piece_keyed(&mut self, sq: Square) -> Piece {
        let pc = self.remove_piece_raw(sq);
        self.key ^= zobrist_psq(pc, sq);
        pc
    }

    /// キーを更新せずに駒を置く（巻き戻し用）
    #[inline]
    pub(super) fn put_piece_raw(&mut self, sq: Square, pc: Piece) {
        debug_assert!(self.board[sq.index()].is_none());
        let bb = Bitboard::from_square(sq);
        let c = pc.color().index();
        self.by_piece[c][pc.piece_type().index()] |= bb;
        self.occupancy[c] |= bb;
        self.board[sq.index()] = pc;
    }

    /// キーを更新せずに駒を取り除く（巻き戻し用）
    #[inline]
    pub(super) fn remove_piece_raw(&mut self, sq: Square) -> Piece {
        let pc = self.board[sq.index()];
        debug_assert!(pc.is_some());
        let bb = Bitboard::from_square(sq);
        let c = pc.color().index();
        self.by_piece[c][pc.piece_type().index()] ^= bb;
        self.occupancy[c] ^= bb;
        self.board[sq.index()] = Piece::NONE;
        pc
    }

    // ========================================================================
    // Zobrist・整合性
    // ========================================================================

    /// 状態からZobristキーを計算し直す
    pub fn compute_zobrist(&self) -> u64 {
        let mut key = 0u64;
        for sq in self.occupied() {
            key ^= zobrist_psq(self.board[sq.index()], sq);
        }
        if self.side_to_move == Color::Black {
            key ^= zobrist_side();
        }
        key ^= zobrist_castling(self.castling);
        if self.ep_square.is_some() {
            key ^= zobrist_ep(self.ep_square);
        }
        key
    }

    /// 局面の不変条件をすべて検査する
    pub fn validate(&self) -> Result<(), String> {
        for color in Color::ALL {
            let mut union = Bitboard::EMPTY;
            for pt in PieceType::ALL {
                let bb = self.pieces(color, pt);
                if (union & bb).is_not_empty() {
                    return Err(format!("{color:?} piece bitboards overlap at {pt:?}"));
                }
                union |= bb;
            }
            if union != self.occupancy(color) {
                return Err(format!("{color:?} occupancy does not match piece bitboards"));
            }
            if self.pieces(color, PieceType::King).count() > 1 {
                return Err(format!("{color:?} has more than one king"));
            }
            if self.by_piece[color.index()][PieceType::None.index()].is_not_empty() {
                return Err(format!("{color:?} has bits in the unused slot"));
            }
        }
        if (self.occupancy[0] & self.occupancy[1]).is_not_empty() {
            return Err("white and black occupancy overlap".to_string());
        }
        for sq in Square::all() {
            let pc = self.board[sq.index()];
            if pc.is_none() {
                if self.occupied().contains(sq) {
                    return Err(format!("{sq} is occupied but the board array is empty"));
                }
            } else if !self.pieces(pc.color(), pc.piece_type()).contains(sq) {
                return Err(format!("board array has {} on {sq} but bitboards disagree", pc.to_char()));
            }
        }
        if self.ep_square.is_some() {
            let expected_rank = match self.side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            if self.ep_square.rank() != expected_rank {
                return Err(format!("en passant square {} on wrong rank", self.ep_square));
            }
        }
        for (right, king_sq, rook_sq) in CastlingRights::HOMES {
            if self.castling.contains(right) {
                let color = if king_sq.rank() == 0 { Color::White } else { Color::Black };
                if self.piece_on(king_sq) != Piece::new(color, PieceType::King)
                    || self.piece_on(rook_sq) != Piece::new(color, PieceType::Rook)
                {
                    return Err(format!("castling right {} without king/rook at home", right.to_fen()));
                }
            }
        }
        if self.key != self.compute_zobrist() {
            return Err("incremental zobrist key differs from recomputed key".to_string());
        }
        if self.checkers != self.compute_checkers() {
            return Err("cached checkers are stale".to_string());
        }
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Position({})", self.to_fen())?;
        for rank in (0..8u8).rev() {
            write!(f, "  {} ", rank + 1)?;
            for file in 0..8u8 {
                write!(f, "{}", self.piece_on(Square::from_file_rank(file, rank)).to_char())?;
            }
            writeln!(f)?;
        }
        write!(f, "    abcdefgh")
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_queries() {
        let pos = Position::startpos();
        assert_eq!(pos.occupied().count(), 32);
        assert_eq!(pos.king_square(Color::White), Square::E1);
        assert_eq!(pos.king_square(Color::Black), Square::E8);
        assert_eq!(pos.piece_on(Square::D8), Piece::B_QUEEN);
        assert!(!pos.is_in_check());
        assert!(pos.has_non_pawn_material(Color::White));
        assert!(pos.validate().is_ok());
        assert_eq!(pos.hash(), pos.compute_zobrist());
    }

    #[test]
    fn test_is_square_attacked_first_blocker() {
        let pos = Position::from_fen("4k3/8/8/8/r2P3K/8/8/8 w - - 0 1").unwrap();
        // a4のルークはd4のポーンに遮られる
        assert!(!pos.is_square_attacked(Square::H4, Color::Black, pos.occupied()));
        assert!(pos.is_square_attacked(Square::C4, Color::Black, pos.occupied()));
        // d4を抜いた占有ではh4に利く
        let mut occ = pos.occupied();
        occ.clear(Square::D4);
        assert!(pos.is_square_attacked(Square::H4, Color::Black, occ));
        // 攻撃駒自身を占有から外すと利かない
        occ.clear(Square::A4);
        assert!(!pos.is_square_attacked(Square::H4, Color::Black, occ));
    }

    #[test]
    fn test_in_check_matches_attack_query() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4q3/4K3 w - - 0 1").unwrap();
        assert!(pos.is_in_check());
        assert!(pos.in_check(Color::White));
        assert!(!pos.in_check(Color::Black));
        assert_eq!(pos.checkers(), Bitboard::from_square(Square::E2));
        assert_eq!(
            pos.in_check(Color::White),
            pos.is_square_attacked(pos.king_square(Color::White), Color::Black, pos.occupied())
        );
    }

    #[test]
    fn test_set_and_remove_piece_keep_key() {
        let mut pos = Position::startpos();
        pos.remove_piece(Square::E2);
        pos.set_piece(Square::E4, Piece::W_PAWN);
        assert_eq!(pos.hash(), pos.compute_zobrist());
        assert_eq!(pos.piece_on(Square::E4), Piece::W_PAWN);
        assert!(pos.validate().is_ok());
        pos.set_piece(Square::E4, Piece::B_KNIGHT);
        assert_eq!(pos.piece_on(Square::E4), Piece::B_KNIGHT);
        assert_eq!(pos.hash(), pos.compute_zobrist());
    }

    #[test]
    fn test_attackers_to() {
        let pos = Position::startpos();
        let att = pos.attackers_to(Square::F3, pos.occupied());
        assert_eq!(att.count(), 3); // e2, g2, g1
        assert!(pos.attacks_by(Color::White).contains(Square::F3));
        assert!(!pos.attacks_by(Color::White).contains(Square::E4));
    }
}
