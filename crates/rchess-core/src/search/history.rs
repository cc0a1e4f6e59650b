//! History統計
//!
//! 探索中の手の成功/失敗を記録し、手の順序付けと削減量の調整に利用する。
//!
//! - `KillerMoves`: [ply] -> 2手
//! - `ButterflyHistory`: [Color][from][to] -> score（上限到達で全体を半減）
//! - `CounterMoves`: [Color][prev_from][prev_to] -> Move
//! - `lmr_reduction`: LMR削減量テーブル

use std::sync::LazyLock;

use crate::types::{Color, Depth, MAX_PLY, Move, Square};

// =============================================================================
// 定数
// =============================================================================

/// History値の上限（絶対値）
pub const HISTORY_MAX: i32 = 8000;

/// カウンター手に与える並べ替えボーナス（どのhistory値よりも大きい）
pub const COUNTER_MOVE_BONUS: i32 = 2 * HISTORY_MAX;

/// LMRテーブルの各次元の大きさ
const LMR_TABLE_SIZE: usize = 64;

// =============================================================================
// KillerMoves
// =============================================================================

/// キラー手: ply ごとに β カットを起こした静かな手を2つ覚える
pub struct KillerMoves {
    table: [[Move; 2]; MAX_PLY as usize + 1],
}

impl KillerMoves {
    pub fn new() -> Self {
        Self {
            table: [[Move::NONE; 2]; MAX_PLY as usize + 1],
        }
    }

    #[inline]
    pub fn get(&self, ply: i32) -> [Move; 2] {
        self.table[ply as usize]
    }

    /// キラーか（スロット番号）
    #[inline]
    pub fn slot(&self, ply: i32, mv: Move) -> Option<usize> {
        self.table[ply as usize].iter().position(|&k| k == mv && k.is_some())
    }

    /// 新しいキラーを先頭に入れ、前の先頭を2番目に下げる
    pub fn update(&mut self, ply: i32, mv: Move) {
        let slot = &mut self.table[ply as usize];
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }

    pub fn clear(&mut self) {
        self.table = [[Move::NONE; 2]; MAX_PLY as usize + 1];
    }
}

impl Default for KillerMoves {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ButterflyHistory
// =============================================================================

/// ButterflyHistory: [Color][from][to] -> score
///
/// 更新式: entry += sign * depth² - entry * depth² / HISTORY_MAX
///
/// 上限に達したら全エントリを半分にする（エージング）。
pub struct ButterflyHistory {
    table: Box<[[[i32; Square::NUM]; Square::NUM]; Color::NUM]>,
}

impl ButterflyHistory {
    pub fn new() -> Self {
        Self {
            table: Box::new([[[0; Square::NUM]; Square::NUM]; Color::NUM]),
        }
    }

    /// 値を取得
    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.table[color.index()][mv.from().index()][mv.to().index()]
    }

    /// βカットを起こした静かな手へのボーナス
    pub fn reward(&mut self, color: Color, mv: Move, depth: Depth) {
        self.update(color, mv, depth * depth);
    }

    /// カットを起こさなかった静かな手へのペナルティ
    pub fn penalize(&mut self, color: Color, mv: Move, depth: Depth) {
        self.update(color, mv, -(depth * depth));
    }

    fn update(&mut self, color: Color, mv: Move, bonus: i32) {
        let entry = &mut self.table[color.index()][mv.from().index()][mv.to().index()];
        let current = *entry;
        let updated = current + bonus - current * bonus.abs() / HISTORY_MAX;
        *entry = updated.clamp(-HISTORY_MAX, HISTORY_MAX);
        if updated.abs() >= HISTORY_MAX {
            self.age();
        }
    }

    /// 全エントリを半分にする
    pub fn age(&mut self) {
        for v in self.table.iter_mut().flatten().flatten() {
            *v /= 2;
        }
    }

    /// クリア
    pub fn clear(&mut self) {
        for v in self.table.iter_mut().flatten().flatten() {
            *v = 0;
        }
    }
}

impl Default for ButterflyHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// CounterMoves
// =============================================================================

/// CounterMoves: 直前の相手の手 [Color][from][to] に対して有効だった応手
pub struct CounterMoves {
    table: Box<[[[Move; Square::NUM]; Square::NUM]; Color::NUM]>,
}

impl CounterMoves {
    pub fn new() -> Self {
        Self {
            table: Box::new([[[Move::NONE; Square::NUM]; Square::NUM]; Color::NUM]),
        }
    }

    /// `color` が `prev` に応じて指すべき手
    #[inline]
    pub fn get(&self, color: Color, prev: Move) -> Move {
        if prev.is_none() {
            return Move::NONE;
        }
        self.table[color.index()][prev.from().index()][prev.to().index()]
    }

    pub fn set(&mut self, color: Color, prev: Move, mv: Move) {
        if prev.is_some() {
            self.table[color.index()][prev.from().index()][prev.to().index()] = mv;
        }
    }

    pub fn clear(&mut self) {
        for m in self.table.iter_mut().flatten().flatten() {
            *m = Move::NONE;
        }
    }
}

impl Default for CounterMoves {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Heuristics
// =============================================================================

/// 探索をまたいで保持する手の順序付け情報（ucinewgameでクリア）
#[derive(Default)]
pub struct Heuristics {
    pub killers: KillerMoves,
    pub history: ButterflyHistory,
    pub counter_moves: CounterMoves,
}

impl Heuristics {
    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
        self.counter_moves.clear();
    }
}

// =============================================================================
// LMR
// =============================================================================

/// LMRテーブル（LazyLockによる遅延初期化）
///
/// `LMR[depth][move_index] = max(2, depth / 4) + move_index / 12`（depth, move_index >= 3）
static LMR_TABLE: LazyLock<[[u8; LMR_TABLE_SIZE]; LMR_TABLE_SIZE]> = LazyLock::new(|| {
    let mut table = [[0u8; LMR_TABLE_SIZE]; LMR_TABLE_SIZE];
    for (depth, row) in table.iter_mut().enumerate().skip(3) {
        for (index, value) in row.iter_mut().enumerate().skip(3) {
            *value = ((depth / 4).max(2) + index / 12) as u8;
        }
    }
    table
});

/// LMRの基本削減量
#[inline]
pub fn lmr_reduction(depth: Depth, move_index: usize) -> Depth {
    let d = depth.clamp(0, LMR_TABLE_SIZE as Depth - 1) as usize;
    let i = move_index.min(LMR_TABLE_SIZE - 1);
    LMR_TABLE[d][i] as Depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Piece;

    fn quiet(from: Square, to: Square) -> Move {
        Move::normal(from, to, Piece::W_KNIGHT, Piece::NONE)
    }

    #[test]
    fn test_killers_demote_previous() {
        let mut killers = KillerMoves::new();
        let a = quiet(Square::G1, Square::F3);
        let b = quiet(Square::B1, Square::C3);
        killers.update(2, a);
        killers.update(2, a);
        assert_eq!(killers.get(2), [a, Move::NONE]);
        killers.update(2, b);
        assert_eq!(killers.get(2), [b, a]);
        assert_eq!(killers.slot(2, a), Some(1));
        assert_eq!(killers.slot(3, a), None);
    }

    #[test]
    fn test_history_gravity_formula() {
        let mut history = ButterflyHistory::new();
        let m = quiet(Square::G1, Square::F3);
        history.reward(Color::White, m, 4);
        assert_eq!(history.get(Color::White, m), 16);
        // 16 + 16 - 16 * 16 / 8000 = 32
        history.reward(Color::White, m, 4);
        assert_eq!(history.get(Color::White, m), 32);
        history.penalize(Color::White, m, 2);
        assert_eq!(history.get(Color::White, m), 28);
        assert_eq!(history.get(Color::Black, m), 0);
    }

    #[test]
    fn test_history_cap_halves_everything() {
        let mut history = ButterflyHistory::new();
        let m = quiet(Square::G1, Square::F3);
        let other = quiet(Square::B1, Square::C3);
        history.reward(Color::White, other, 10);
        // depth² が上限を超えると上限で止まり、全体が半減する
        history.reward(Color::White, m, 100);
        assert_eq!(history.get(Color::White, m), HISTORY_MAX / 2);
        assert_eq!(history.get(Color::White, other), 50);
    }

    #[test]
    fn test_counter_moves() {
        let mut counters = CounterMoves::new();
        let prev = quiet(Square::G8, Square::F6);
        let reply = quiet(Square::B1, Square::C3);
        counters.set(Color::White, prev, reply);
        assert_eq!(counters.get(Color::White, prev), reply);
        assert_eq!(counters.get(Color::Black, prev), Move::NONE);
        assert_eq!(counters.get(Color::White, Move::NONE), Move::NONE);
    }

    #[test]
    fn test_lmr_table() {
        assert_eq!(lmr_reduction(2, 10), 0);
        assert_eq!(lmr_reduction(10, 2), 0);
        assert_eq!(lmr_reduction(3, 3), 2);
        assert_eq!(lmr_reduction(12, 30), 3 + 2);
        assert_eq!(lmr_reduction(200, 200), 15 + 5);
    }
}
