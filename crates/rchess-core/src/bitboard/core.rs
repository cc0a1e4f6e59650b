//! Bitboard本体

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use crate::types::{Color, Square};

/// 64bit盤面表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(u64);

impl Bitboard {
    /// 空
    pub const EMPTY: Bitboard = Bitboard(0);
    /// 全升
    pub const ALL: Bitboard = Bitboard(!0);

    /// u64から生成
    #[inline]
    pub const fn new(bits: u64) -> Bitboard {
        Bitboard(bits)
    }

    /// 1升のみのBitboard
    #[inline]
    pub const fn from_square(sq: Square) -> Bitboard {
        Bitboard(1u64 << sq.index())
    }

    /// 生の値
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_not_empty(self) -> bool {
        self.0 != 0
    }

    /// 升が含まれるか
    #[inline]
    pub const fn contains(self, sq: Square) -> bool {
        self.0 & (1u64 << sq.index()) != 0
    }

    #[inline]
    pub fn set(&mut self, sq: Square) {
        self.0 |= 1u64 << sq.index();
    }

    #[inline]
    pub fn clear(&mut self, sq: Square) {
        self.0 &= !(1u64 << sq.index());
    }

    #[inline]
    pub fn toggle(&mut self, sq: Square) {
        self.0 ^= 1u64 << sq.index();
    }

    /// 立っているビット数
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// 2つ以上のビットが立っているか
    #[inline]
    pub const fn more_than_one(self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// 最下位ビットの升（空ならNONE）
    #[inline]
    pub const fn lsb(self) -> Square {
        if self.0 == 0 {
            Square::NONE
        } else {
            Square::new(self.0.trailing_zeros() as u8)
        }
    }

    /// 最上位ビットの升（空ならNONE）
    #[inline]
    pub const fn msb(self) -> Square {
        if self.0 == 0 {
            Square::NONE
        } else {
            Square::new(63 - self.0.leading_zeros() as u8)
        }
    }

    /// 最下位ビットを取り出して消す
    #[inline]
    pub fn pop_lsb(&mut self) -> Square {
        debug_assert!(self.0 != 0);
        let sq = Square::new(self.0.trailing_zeros() as u8);
        self.0 &= self.0 - 1;
        sq
    }

    /// 1段前方へシフト（手番視点）
    #[inline]
    pub const fn forward(self, color: Color) -> Bitboard {
        match color {
            Color::White => Bitboard(self.0 << 8),
            Color::Black => Bitboard(self.0 >> 8),
        }
    }

    /// 東（h筋方向）へ1升シフト
    #[inline]
    pub const fn east(self) -> Bitboard {
        Bitboard((self.0 << 1) & !FILE_A)
    }

    /// 西（a筋方向）へ1升シフト
    #[inline]
    pub const fn west(self) -> Bitboard {
        Bitboard((self.0 >> 1) & !FILE_H)
    }

    /// 前方への塗りつぶし（自身を含む）
    #[inline]
    pub const fn fill_forward(self, color: Color) -> Bitboard {
        let mut b = self.0;
        match color {
            Color::White => {
                b |= b << 8;
                b |= b << 16;
                b |= b << 32;
            }
            Color::Black => {
                b |= b >> 8;
                b |= b >> 16;
                b |= b >> 32;
            }
        }
        Bitboard(b)
    }

    /// 筋全体への塗りつぶし
    #[inline]
    pub const fn file_fill(self) -> Bitboard {
        Bitboard(self.fill_forward(Color::White).0 | self.fill_forward(Color::Black).0)
    }

    /// イテレータ
    #[inline]
    pub const fn iter(self) -> BitboardIter {
        BitboardIter(self.0)
    }
}

const FILE_A: u64 = 0x0101_0101_0101_0101;
const FILE_H: u64 = FILE_A << 7;

/// 立っている升を下位から列挙する
pub struct BitboardIter(u64);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let sq = Square::new(self.0.trailing_zeros() as u8);
        self.0 &= self.0 - 1;
        Some(sq)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    #[inline]
    fn into_iter(self) -> BitboardIter {
        self.iter()
    }
}

impl BitAnd for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitand(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 & rhs.0)
    }
}

impl BitOr for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitor(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 | rhs.0)
    }
}

impl BitXor for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitxor(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl Not for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn not(self) -> Bitboard {
        Bitboard(!self.0)
    }
}

impl BitAndAssign for Bitboard {
    #[inline]
    fn bitand_assign(&mut self, rhs: Bitboard) {
        self.0 &= rhs.0;
    }
}

impl BitOrAssign for Bitboard {
    #[inline]
    fn bitor_assign(&mut self, rhs: Bitboard) {
        self.0 |= rhs.0;
    }
}

impl BitXorAssign for Bitboard {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Bitboard) {
        self.0 ^= rhs.0;
    }
}

impl std::fmt::Display for Bitboard {
    /// 8段目を上にした8x8表示
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let c = if self.contains(Square::from_file_rank(file, rank)) {
                    'X'
                } else {
                    '.'
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_ops() {
        let mut bb = Bitboard::EMPTY;
        bb.set(Square::E4);
        bb.set(Square::A1);
        assert_eq!(bb.count(), 2);
        assert!(bb.contains(Square::E4));
        assert!(bb.more_than_one());
        assert_eq!(bb.lsb(), Square::A1);
        assert_eq!(bb.msb(), Square::E4);
        assert_eq!(bb.pop_lsb(), Square::A1);
        assert!(!bb.more_than_one());
        bb.clear(Square::E4);
        assert!(bb.is_empty());
        assert_eq!(bb.lsb(), Square::NONE);
    }

    #[test]
    fn test_shifts_do_not_wrap() {
        let h = Bitboard::from_square(Square::H4);
        assert!(h.east().is_empty());
        let a = Bitboard::from_square(Square::A4);
        assert!(a.west().is_empty());
        assert_eq!(
            Bitboard::from_square(Square::E2).forward(Color::White),
            Bitboard::from_square(Square::E3)
        );
        assert_eq!(
            Bitboard::from_square(Square::E2).fill_forward(Color::White).count(),
            7
        );
    }

    #[test]
    fn test_iter() {
        let bb = Bitboard::new(0b1011);
        let squares: Vec<_> = bb.iter().collect();
        assert_eq!(squares, vec![Square::A1, Square::B1, Square::D1]);
        assert_eq!(bb.iter().len(), 3);
    }
}
