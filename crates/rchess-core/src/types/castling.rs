//! キャスリング権（CastlingRights）

use super::{Color, Square};

/// キャスリング権（4bitマスク）
///
/// bit0: 白キング側, bit1: 白クイーン側, bit2: 黒キング側, bit3: 黒クイーン側
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KING: CastlingRights = CastlingRights(1);
    pub const WHITE_QUEEN: CastlingRights = CastlingRights(2);
    pub const BLACK_KING: CastlingRights = CastlingRights(4);
    pub const BLACK_QUEEN: CastlingRights = CastlingRights(8);
    pub const ALL: CastlingRights = CastlingRights(15);

    /// 生の値から生成
    #[inline]
    pub const fn from_bits(bits: u8) -> CastlingRights {
        CastlingRights(bits & 15)
    }

    /// 生の値
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// 配列アクセス用インデックス（Zobrist用、0..16）
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 指定の権利をすべて含むか
    #[inline]
    pub const fn contains(self, other: CastlingRights) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// 権利を追加
    #[inline]
    pub fn insert(&mut self, other: CastlingRights) {
        self.0 |= other.0;
    }

    /// 権利を削除
    #[inline]
    pub fn remove(&mut self, other: CastlingRights) {
        self.0 &= !other.0;
    }

    /// マスクとのAND（make_move時の権利更新に使う）
    #[inline]
    pub const fn masked(self, mask: u8) -> CastlingRights {
        CastlingRights(self.0 & mask)
    }

    /// 手番側の権利（キング側, クイーン側）
    #[inline]
    pub const fn for_color(color: Color) -> (CastlingRights, CastlingRights) {
        match color {
            Color::White => (CastlingRights::WHITE_KING, CastlingRights::WHITE_QUEEN),
            Color::Black => (CastlingRights::BLACK_KING, CastlingRights::BLACK_QUEEN),
        }
    }

    /// 各権利の (権利, キング初期位置, ルーク初期位置)
    pub const HOMES: [(CastlingRights, Square, Square); 4] = [
        (CastlingRights::WHITE_KING, Square::E1, Square::H1),
        (CastlingRights::WHITE_QUEEN, Square::E1, Square::A1),
        (CastlingRights::BLACK_KING, Square::E8, Square::H8),
        (CastlingRights::BLACK_QUEEN, Square::E8, Square::A8),
    ];

    /// FEN表記（"KQkq" / "-"）
    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        for (right, c) in [
            (CastlingRights::WHITE_KING, 'K'),
            (CastlingRights::WHITE_QUEEN, 'Q'),
            (CastlingRights::BLACK_KING, 'k'),
            (CastlingRights::BLACK_QUEEN, 'q'),
        ] {
            if self.contains(right) {
                s.push(c);
            }
        }
        s
    }
}
