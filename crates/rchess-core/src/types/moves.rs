//! 指し手（Move）
//!
//! 32bitにパックした指し手表現。
//!
//! ```text
//! bits  0-5  : 移動元升
//! bits  6-11 : 移動先升
//! bits 12-15 : 動かした駒
//! bits 16-19 : 取った駒（アンパッサンでは相手のポーン）
//! bits 20-23 : 成った駒
//! bits 24-25 : フラグ（None / Castle / EnPassant）
//! ```
//!
//! 全ビット0は null move（番兵）。

use super::{Piece, PieceType, Square};

/// 指し手の特殊フラグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    None = 0,
    Castle = 1,
    EnPassant = 2,
}

/// 指し手（32bit）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    /// null move
    pub const NONE: Move = Move(0);

    const TO_SHIFT: u32 = 6;
    const MOVED_SHIFT: u32 = 12;
    const CAPTURED_SHIFT: u32 = 16;
    const PROMO_SHIFT: u32 = 20;
    const FLAG_SHIFT: u32 = 24;

    /// 全フィールドを指定して生成
    #[inline]
    pub const fn new(
        from: Square,
        to: Square,
        moved: Piece,
        captured: Piece,
        promo: Piece,
        flag: MoveFlag,
    ) -> Move {
        Move(
            from.raw() as u32
                | (to.raw() as u32) << Self::TO_SHIFT
                | (moved.raw() as u32) << Self::MOVED_SHIFT
                | (captured.raw() as u32) << Self::CAPTURED_SHIFT
                | (promo.raw() as u32) << Self::PROMO_SHIFT
                | (flag as u32) << Self::FLAG_SHIFT,
        )
    }

    /// 通常手（捕獲含む）
    #[inline]
    pub const fn normal(from: Square, to: Square, moved: Piece, captured: Piece) -> Move {
        Move::new(from, to, moved, captured, Piece::NONE, MoveFlag::None)
    }

    /// 生の値から復元
    #[inline]
    pub const fn from_u32(v: u32) -> Move {
        Move(v & 0x03FF_FFFF)
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 移動元
    #[inline]
    pub const fn from(self) -> Square {
        Square::new((self.0 & 63) as u8)
    }

    /// 移動先
    #[inline]
    pub const fn to(self) -> Square {
        Square::new(((self.0 >> Self::TO_SHIFT) & 63) as u8)
    }

    /// 動かした駒
    #[inline]
    pub const fn moved(self) -> Piece {
        Piece::from_u8(((self.0 >> Self::MOVED_SHIFT) & 15) as u8)
    }

    /// 取った駒
    #[inline]
    pub const fn captured(self) -> Piece {
        Piece::from_u8(((self.0 >> Self::CAPTURED_SHIFT) & 15) as u8)
    }

    /// 成った駒
    #[inline]
    pub const fn promotion(self) -> Piece {
        Piece::from_u8(((self.0 >> Self::PROMO_SHIFT) & 15) as u8)
    }

    /// フラグ
    #[inline]
    pub const fn flag(self) -> MoveFlag {
        match (self.0 >> Self::FLAG_SHIFT) & 3 {
            1 => MoveFlag::Castle,
            2 => MoveFlag::EnPassant,
            _ => MoveFlag::None,
        }
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.captured().is_some()
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.promotion().is_some()
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.flag(), MoveFlag::Castle)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.flag(), MoveFlag::EnPassant)
    }

    /// 捕獲でも成りでもない手
    #[inline]
    pub const fn is_quiet(self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    /// 移動先が同じで動かす駒が同じか（履歴の比較用）
    #[inline]
    pub const fn same_from_to(self, other: Move) -> bool {
        self.0 & 0xFFF == other.0 & 0xFFF
    }

    /// UCI表記（例: "e2e4", "e7e8q"）
    ///
    /// null move は "0000"。
    pub fn to_uci(self) -> String {
        if self.is_none() {
            return "0000".to_string();
        }
        let mut s = format!("{}{}", self.from(), self.to());
        let promo = self.promotion();
        if promo.is_some() {
            s.push(promo.piece_type().to_char());
        }
        s
    }

    /// 成り駒の駒種（成りでなければNone）
    #[inline]
    pub const fn promotion_type(self) -> PieceType {
        self.promotion().piece_type()
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uci())
    }
}
