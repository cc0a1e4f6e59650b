//! 置換表エントリ

use crate::types::{Bound, Depth, Move, Value};

/// 置換表エントリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TTEntry {
    pub(super) tag: u32,
    pub(super) mv: Move,
    pub(super) score: i16,
    pub(super) depth: i8,
    pub(super) bound: Bound,
    pub(super) generation: u8,
}

const _: () = assert!(std::mem::size_of::<TTEntry>() == 16);

impl TTEntry {
    /// 空エントリ
    pub const EMPTY: TTEntry = TTEntry {
        tag: 0,
        mv: Move::NONE,
        score: 0,
        depth: 0,
        bound: Bound::None,
        generation: 0,
    };

    /// 未使用か
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bound == Bound::None
    }

    #[inline]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// 最善手（なければ `Move::NONE`）
    #[inline]
    pub fn best_move(&self) -> Move {
        self.mv
    }

    /// 格納されたままの評価値（詰みスコアは「この局面から」の距離）
    #[inline]
    pub fn raw_score(&self) -> Value {
        Value::new(self.score as i32)
    }

    /// ルートからの `ply` で補正した評価値
    #[inline]
    pub fn score(&self, ply: i32) -> Value {
        self.raw_score().from_tt(ply)
    }

    #[inline]
    pub fn depth(&self) -> Depth {
        self.depth as Depth
    }

    #[inline]
    pub fn bound(&self) -> Bound {
        self.bound
    }

    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation
    }
}
