//! Zobristハッシュ
//!
//! 固定シードの乱数で生成するため、同じ局面はプロセスをまたいでも同じキーになる。

use std::sync::LazyLock;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{CastlingRights, Piece, Square};

const ZOBRIST_SEED: u64 = 0x1234_5678_9ABC_DEF0;

/// Zobrist乱数テーブル
pub struct Zobrist {
    /// 駒×升 [piece][square]（NONEの行は0）
    pub psq: [[u64; Square::NUM]; Piece::NUM],
    /// 黒番のときにXORする値
    pub side: u64,
    /// キャスリング権（4bitマスクでインデックス）
    pub castling: [u64; 16],
    /// アンパッサン筋
    pub ep_file: [u64; 8],
}

impl Zobrist {
    fn new() -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);
        let mut psq = [[0u64; Square::NUM]; Piece::NUM];
        for (pc, row) in psq.iter_mut().enumerate() {
            if Piece::from_u8(pc as u8).piece_type() == crate::types::PieceType::None {
                continue;
            }
            for key in row.iter_mut() {
                *key = rng.random();
            }
        }
        let side = rng.random();
        let mut castling = [0u64; 16];
        for key in castling.iter_mut().skip(1) {
            *key = rng.random();
        }
        let mut ep_file = [0u64; 8];
        for key in ep_file.iter_mut() {
            *key = rng.random();
        }
        Zobrist {
            psq,
            side,
            castling,
            ep_file,
        }
    }
}

/// グローバルなZobristテーブル
pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(Zobrist::new);

/// 駒×升のキー
#[inline]
pub fn zobrist_psq(pc: Piece, sq: Square) -> u64 {
    ZOBRIST.psq[pc.index()][sq.index()]
}

/// 手番のキー
#[inline]
pub fn zobrist_side() -> u64 {
    ZOBRIST.side
}

/// キャスリング権のキー
#[inline]
pub fn zobrist_castling(cr: CastlingRights) -> u64 {
    ZOBRIST.castling[cr.index()]
}

/// EP筋のキー
#[inline]
pub fn zobrist_ep(sq: Square) -> u64 {
    ZOBRIST.ep_file[sq.file() as usize]
}
