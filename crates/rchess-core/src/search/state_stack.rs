//! 局面履歴スタック（千日手・50手ルール判定）
//!
//! make のたびに `(hash, halfmove_clock)` を積み、unmake で取り除く。
//! 連続した配列を後ろから走査するので push/pop は O(1)。

use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StateEntry {
    hash: u64,
    halfmove: u32,
}

/// 局面履歴
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    entries: Vec<StateEntry>,
}

impl StateStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(512),
        }
    }

    /// 現局面だけを積んだ状態にする
    pub fn reset(&mut self, pos: &Position) {
        self.entries.clear();
        self.push(pos);
    }

    /// 全消去
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn push(&mut self, pos: &Position) {
        self.entries.push(StateEntry {
            hash: pos.hash(),
            halfmove: pos.halfmove_clock(),
        });
    }

    #[inline]
    pub fn pop(&mut self) {
        self.entries.pop();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 現局面（最後に積んだ局面）が引き分けか
    ///
    /// - 50手ルール（halfmove_clock >= 100）
    /// - 同一局面が過去に2回（三回目の出現）
    /// - `root_index` 以降（探索木の中）で1回でも同一局面が出現
    pub fn is_draw(&self, root_index: usize) -> bool {
        let Some(current) = self.entries.last() else {
            return false;
        };
        if current.halfmove >= 100 {
            return true;
        }

        let last = self.entries.len() - 1;
        // 不可逆な手より前の局面は同一になり得ない
        let first = last.saturating_sub(current.halfmove as usize);
        let mut matches = 0;
        for i in (first..last).rev() {
            if self.entries[i].hash == current.hash {
                if i >= root_index {
                    return true;
                }
                matches += 1;
                if matches >= 2 {
                    return true;
                }
            }
        }
        false
    }
}
