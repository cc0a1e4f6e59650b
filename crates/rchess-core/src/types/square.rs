//! 升（Square）
//!
//! a1=0, b1=1, ..., h8=63。`rank = sq >> 3`, `file = sq & 7`。

use std::fmt;

/// 升
///
/// `Square::NONE`（=64）は「升なし」の番兵値として使う（アンパッサン升など）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 升の数
    pub const NUM: usize = 64;

    /// 番兵（升なし）
    pub const NONE: Square = Square(64);

    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A2: Square = Square(8);
    pub const B2: Square = Square(9);
    pub const C2: Square = Square(10);
    pub const D2: Square = Square(11);
    pub const E2: Square = Square(12);
    pub const F2: Square = Square(13);
    pub const G2: Square = Square(14);
    pub const H2: Square = Square(15);
    pub const A3: Square = Square(16);
    pub const B3: Square = Square(17);
    pub const C3: Square = Square(18);
    pub const D3: Square = Square(19);
    pub const E3: Square = Square(20);
    pub const F3: Square = Square(21);
    pub const G3: Square = Square(22);
    pub const H3: Square = Square(23);
    pub const A4: Square = Square(24);
    pub const B4: Square = Square(25);
    pub const C4: Square = Square(26);
    pub const D4: Square = Square(27);
    pub const E4: Square = Square(28);
    pub const F4: Square = Square(29);
    pub const G4: Square = Square(30);
    pub const H4: Square = Square(31);
    pub const A5: Square = Square(32);
    pub const B5: Square = Square(33);
    pub const C5: Square = Square(34);
    pub const D5: Square = Square(35);
    pub const E5: Square = Square(36);
    pub const F5: Square = Square(37);
    pub const G5: Square = Square(38);
    pub const H5: Square = Square(39);
    pub const A6: Square = Square(40);
    pub const B6: Square = Square(41);
    pub const C6: Square = Square(42);
    pub const D6: Square = Square(43);
    pub const E6: Square = Square(44);
    pub const F6: Square = Square(45);
    pub const G6: Square = Square(46);
    pub const H6: Square = Square(47);
    pub const A7: Square = Square(48);
    pub const B7: Square = Square(49);
    pub const C7: Square = Square(50);
    pub const D7: Square = Square(51);
    pub const E7: Square = Square(52);
    pub const F7: Square = Square(53);
    pub const G7: Square = Square(54);
    pub const H7: Square = Square(55);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    /// インデックスから生成（0..64）
    #[inline]
    pub const fn new(index: u8) -> Square {
        debug_assert!(index <= 64);
        Square(index)
    }

    /// 筋・段から生成（どちらも0..8）
    #[inline]
    pub const fn from_file_rank(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    /// 盤内座標なら升を返す
    #[inline]
    pub const fn try_from_coords(file: i32, rank: i32) -> Option<Square> {
        if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
            Some(Square((rank * 8 + file) as u8))
        } else {
            None
        }
    }

    /// 配列アクセス用インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 筋（0=a .. 7=h）
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// 段（0=1段目 .. 7=8段目）
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// 番兵でないか
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 < 64
    }

    /// 番兵か
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 >= 64
    }

    /// 上下反転（黒の駒をPSTで引くときに使う）
    #[inline]
    pub const fn flip(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// 手番から見た升（黒なら上下反転）
    #[inline]
    pub const fn relative(self, color: super::Color) -> Square {
        match color {
            super::Color::White => self,
            super::Color::Black => self.flip(),
        }
    }

    /// 手番から見た段（白:そのまま、黒:7-rank）
    #[inline]
    pub const fn relative_rank(self, color: super::Color) -> u8 {
        match color {
            super::Color::White => self.rank(),
            super::Color::Black => 7 - self.rank(),
        }
    }

    /// オフセットを加えた升（盤外なら None）
    #[inline]
    pub const fn offset(self, df: i32, dr: i32) -> Option<Square> {
        Square::try_from_coords(self.file() as i32 + df, self.rank() as i32 + dr)
    }

    /// チェビシェフ距離
    #[inline]
    pub fn distance(self, other: Square) -> u8 {
        let df = (self.file() as i8 - other.file() as i8).unsigned_abs();
        let dr = (self.rank() as i8 - other.rank() as i8).unsigned_abs();
        df.max(dr)
    }

    /// マンハッタン距離
    #[inline]
    pub fn manhattan(self, other: Square) -> u8 {
        let df = (self.file() as i8 - other.file() as i8).unsigned_abs();
        let dr = (self.rank() as i8 - other.rank() as i8).unsigned_abs();
        df + dr
    }

    /// 全升のイテレータ
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }

    /// "e4" 形式から変換
    pub fn from_name(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square::from_file_rank(file, rank))
        } else {
            None
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "-");
        }
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_square_coords() {
        assert_eq!(Square::A1.index(), 0);
        assert_eq!(Square::H8.index(), 63);
        assert_eq!(Square::E4.file(), 4);
        assert_eq!(Square::E4.rank(), 3);
        assert_eq!(Square::from_file_rank(4, 3), Square::E4);
    }

    #[test]
    fn test_square_name_roundtrip() {
        for sq in Square::all() {
            let name = sq.to_string();
            assert_eq!(Square::from_name(&name), Some(sq));
        }
        assert_eq!(Square::from_name("i1"), None);
        assert_eq!(Square::from_name("a9"), None);
        assert_eq!(Square::NONE.to_string(), "-");
    }

    #[test]
    fn test_square_relative() {
        assert_eq!(Square::A2.relative(Color::Black), Square::A7);
        assert_eq!(Square::E2.relative_rank(Color::White), 1);
        assert_eq!(Square::E7.relative_rank(Color::Black), 1);
        assert_eq!(Square::A1.distance(Square::H8), 7);
        assert_eq!(Square::A1.manhattan(Square::H8), 14);
    }
}
