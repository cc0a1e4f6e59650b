//! 静的交換評価（SEE）

use crate::bitboard::{Bitboard, bishop_attacks, rook_attacks};
use crate::types::{Move, PieceType, Square};

use super::Position;

/// SEEで使う駒価値（PieceType順）
pub const SEE_VALUES: [i32; PieceType::NUM] = [0, 100, 320, 330, 500, 900, 20000];

#[inline]
fn see_value(pt: PieceType) -> i32 {
    SEE_VALUES[pt.index()]
}

impl Position {
    /// 捕獲手の交換結果（手番側から見た駒得）
    ///
    /// 非捕獲手（成りのみの手を含む）は 0。
    pub fn see(&self, m: Move) -> i32 {
        if !m.is_capture() {
            return 0;
        }
        let from = m.from();
        let to = m.to();
        let us = self.side_to_move;

        let mut occ = self.occupied();
        occ.clear(from);
        let victim = if m.is_en_passant() {
            occ.clear(Square::new((to.raw() as i8 - us.forward()) as u8));
            PieceType::Pawn
        } else {
            self.piece_on(to).piece_type()
        };

        let mut gain = [0i32; 32];
        gain[0] = see_value(victim);
        // 成った駒は成り後の価値で取り返される
        let mut last_value = if m.is_promotion() {
            see_value(m.promotion_type())
        } else {
            see_value(m.moved().piece_type())
        };

        let bishops = self.pieces_by_type(PieceType::Bishop) | self.pieces_by_type(PieceType::Queen);
        let rooks = self.pieces_by_type(PieceType::Rook) | self.pieces_by_type(PieceType::Queen);
        let mut attackers = self.attackers_to(to, occ);
        let mut side = !us;
        let mut d = 0usize;

        loop {
            let side_attackers = attackers & self.occupancy(side) & occ;
            if side_attackers.is_empty() || d + 1 >= gain.len() {
                break;
            }
            d += 1;
            gain[d] = last_value - gain[d - 1];

            let (sq, pt) = self.least_valuable(side_attackers);
            last_value = see_value(pt);
            occ.clear(sq);

            // X線で現れる背後の飛び駒
            if matches!(pt, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
                attackers |= bishop_attacks(to, occ) & bishops;
            }
            if matches!(pt, PieceType::Rook | PieceType::Queen) {
                attackers |= rook_attacks(to, occ) & rooks;
            }
            attackers &= occ;
            side = !side;

            // 玉は利きのある升では取り返せない
            if pt == PieceType::King && (attackers & self.occupancy(side)).is_not_empty() {
                d -= 1;
                break;
            }
        }

        while d > 0 {
            gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
            d -= 1;
        }
        gain[0]
    }

    /// `see(m) >= threshold`
    #[inline]
    pub fn see_ge(&self, m: Move, threshold: i32) -> bool {
        self.see(m) >= threshold
    }

    fn least_valuable(&self, attackers: Bitboard) -> (Square, PieceType) {
        for pt in PieceType::ALL {
            let bb = attackers & self.pieces_by_type(pt);
            if bb.is_not_empty() {
                return (bb.lsb(), pt);
            }
        }
        unreachable!("least_valuable called with no attackers")
    }
}
