//! 遠方駒（ルーク・ビショップ・クイーン）の利き
//!
//! 升ごとに盤端を除いた遮りマスクを持ち、占有をpextで詰めた値を
//! インデックスとして利きテーブルを引く。升 s のテーブルサイズは
//! `2^popcount(mask[s])`。BMI2が有効なビルドではハードウェアの `pext` を使い、
//! それ以外はソフトウェア実装にフォールバックする。

use std::sync::OnceLock;

use crate::types::Square;

use super::tables::{RayDir, ray};
use super::{Bitboard, FILE_BB, RANK_BB};

struct SliderEntry {
    mask: u64,
    offset: usize,
}

struct SliderTable {
    rook: [SliderEntry; Square::NUM],
    bishop: [SliderEntry; Square::NUM],
    attacks: Vec<Bitboard>,
}

static SLIDER_ATTACKS: OnceLock<SliderTable> = OnceLock::new();

#[inline]
fn slider_attacks() -> &'static SliderTable {
    SLIDER_ATTACKS.get_or_init(SliderTable::new)
}

/// 占有 `occ` のうち `mask` のビットを下位へ詰める
#[inline]
pub fn pext(occ: u64, mask: u64) -> u64 {
    #[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
    {
        // SAFETY: bmi2 はコンパイル時に有効
        #[allow(unused_unsafe)]
        unsafe {
            std::arch::x86_64::_pext_u64(occ, mask)
        }
    }
    #[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
    {
        pext_soft(occ, mask)
    }
}

#[cfg_attr(all(target_arch = "x86_64", target_feature = "bmi2"), allow(dead_code))]
#[inline]
fn pext_soft(occ: u64, mut mask: u64) -> u64 {
    let mut result = 0u64;
    let mut bit = 1u64;
    while mask != 0 {
        let low = mask & mask.wrapping_neg();
        if occ & low != 0 {
            result |= bit;
        }
        mask ^= low;
        bit <<= 1;
    }
    result
}

/// レイを1升ずつ辿り、最初の遮り駒（含む）まで利きを伸ばす
fn sliding_attacks(sq: Square, occ: Bitboard, dirs: [RayDir; 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for dir in dirs {
        let (df, dr) = dir.delta();
        let mut cur = sq.offset(df, dr);
        while let Some(s) = cur {
            attacks.set(s);
            if occ.contains(s) {
                break;
            }
            cur = s.offset(df, dr);
        }
    }
    attacks
}

/// 盤端を除いた遮りマスク
fn relevant_mask(sq: Square, dirs: [RayDir; 4]) -> u64 {
    let edges = ((RANK_BB[0] | RANK_BB[7]) & !RANK_BB[sq.rank() as usize])
        | ((FILE_BB[0] | FILE_BB[7]) & !FILE_BB[sq.file() as usize]);
    let mut mask = Bitboard::EMPTY;
    for dir in dirs {
        mask |= ray(sq, dir);
    }
    (mask & !edges).bits()
}

impl SliderTable {
    fn new() -> Self {
        let mut attacks = Vec::new();
        let rook = Self::build(RayDir::ROOK, &mut attacks);
        let bishop = Self::build(RayDir::BISHOP, &mut attacks);
        log::debug!("slider attack table: {} entries", attacks.len());
        SliderTable {
            rook,
            bishop,
            attacks,
        }
    }

    fn build(dirs: [RayDir; 4], attacks: &mut Vec<Bitboard>) -> [SliderEntry; Square::NUM] {
        std::array::from_fn(|i| {
            let sq = Square::new(i as u8);
            let mask = relevant_mask(sq, dirs);
            let offset = attacks.len();
            let size = 1usize << mask.count_ones();
            attacks.resize(offset + size, Bitboard::EMPTY);

            // Carry-Rippler で部分集合を列挙
            let mut subset = 0u64;
            loop {
                let idx = pext_soft(subset, mask) as usize;
                attacks[offset + idx] = sliding_attacks(sq, Bitboard::new(subset), dirs);
                subset = subset.wrapping_sub(mask) & mask;
                if subset == 0 {
                    break;
                }
            }
            SliderEntry { mask, offset }
        })
    }
}

/// ルークの利き
#[inline]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let t = slider_attacks();
    let e = &t.rook[sq.index()];
    t.attacks[e.offset + pext(occ.bits(), e.mask) as usize]
}

/// ビショップの利き
#[inline]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let t = slider_attacks();
    let e = &t.bishop[sq.index()];
    t.attacks[e.offset + pext(occ.bits(), e.mask) as usize]
}

/// クイーンの利き
#[inline]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pext_soft() {
        assert_eq!(pext_soft(0b1010, 0b1110), 0b101);
        assert_eq!(pext_soft(!0, 0xF0), 0xF);
        assert_eq!(pext(0b1010, 0b1110), 0b101);
    }

    #[test]
    fn test_mask_sizes() {
        // 角のルークは12bit、中央のビショップは9bit
        assert_eq!(relevant_mask(Square::A1, RayDir::ROOK).count_ones(), 12);
        assert_eq!(relevant_mask(Square::E4, RayDir::ROOK).count_ones(), 10);
        assert_eq!(relevant_mask(Square::D4, RayDir::BISHOP).count_ones(), 9);
        assert_eq!(relevant_mask(Square::A1, RayDir::BISHOP).count_ones(), 6);
    }

    #[test]
    fn test_slider_attacks_match_ray_walk() {
        // 擬似乱数の占有でテーブル引きとレイ走査を比較
        let mut x = 0x9E37_79B9_7F4A_7C15u64;
        for _ in 0..200 {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            let occ = Bitboard::new(x & x.rotate_left(23));
            for sq in Square::all() {
                assert_eq!(rook_attacks(sq, occ), sliding_attacks(sq, occ, RayDir::ROOK));
                assert_eq!(
                    bishop_attacks(sq, occ),
                    sliding_attacks(sq, occ, RayDir::BISHOP)
                );
            }
        }
    }

    #[test]
    fn test_empty_board_attacks() {
        assert_eq!(rook_attacks(Square::A1, Bitboard::EMPTY).count(), 14);
        assert_eq!(bishop_attacks(Square::D4, Bitboard::EMPTY).count(), 13);
        assert_eq!(queen_attacks(Square::D4, Bitboard::EMPTY).count(), 27);
    }
}
