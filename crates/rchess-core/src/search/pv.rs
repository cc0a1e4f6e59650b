//! 読み筋（PV）

use crate::types::{MAX_PLY, Move};

const PV_CAPACITY: usize = MAX_PLY as usize;

/// 固定長の読み筋バッファ
///
/// 各ノードが自分の `PvLine` を持ち、子ノードの読み筋を `update` で取り込む。
#[derive(Clone)]
pub struct PvLine {
    moves: [Move; PV_CAPACITY],
    len: usize,
}

impl PvLine {
    pub fn new() -> Self {
        Self {
            moves: [Move::NONE; PV_CAPACITY],
            len: 0,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// `mv` に子ノードの読み筋を続けたものに置き換える
    pub fn update(&mut self, mv: Move, child: &PvLine) {
        self.moves[0] = mv;
        let n = child.len.min(PV_CAPACITY - 1);
        self.moves[1..=n].copy_from_slice(&child.moves[..n]);
        self.len = n + 1;
    }

    #[inline]
    pub fn first(&self) -> Move {
        if self.len == 0 { Move::NONE } else { self.moves[0] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }
}

impl Default for PvLine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PvLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
