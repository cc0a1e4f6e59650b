//! MovePicker（指し手オーダリング）
//!
//! 生成済みの合法手にスコアを付け、呼ばれるたびに残りの中から最大のものを返す
//! （選択ソート）。βカットが早く起これば残りを並べ替えずに済む。
//!
//! 優先順位:
//! 1. TT/PV手
//! 2. 成り（成り駒の価値順）
//! 3. 捕獲手（MVV-LVA）
//! 4. キラー手（1番目 > 2番目）
//! 5. 静かな手（History + カウンター手ボーナス）
//!
//! MovePickerはHistory参照を保持しない。スコア付けの時点でだけ借用するので、
//! 再帰呼び出し中にHistoryを更新してもエイリアスが発生しない。

use crate::movegen::MoveList;
use crate::types::{Color, MAX_MOVES, Move};

use super::history::{COUNTER_MOVE_BONUS, Heuristics};

// =============================================================================
// スコア定数
// =============================================================================

const TT_MOVE_SCORE: i32 = 10_000_000;
const PROMOTION_SCORE: i32 = 9_000_000;
const CAPTURE_SCORE: i32 = 8_000_000;
const KILLER1_SCORE: i32 = 100_000;
const KILLER2_SCORE: i32 = 90_000;

/// MVV-LVA: 取られる駒を重く、取る駒を軽く見る
#[inline]
fn mvv_lva(m: Move) -> i32 {
    m.captured().piece_type().index() as i32 * 100 - m.moved().piece_type().index() as i32
}

/// 通常探索のオーダリングに使う局面ごとの情報
#[derive(Debug, Clone, Copy)]
pub struct OrderingContext {
    pub tt_move: Move,
    pub killers: [Move; 2],
    pub counter_move: Move,
    pub side_to_move: Color,
}

/// スコア付き指し手列
pub struct MovePicker {
    moves: [Move; MAX_MOVES],
    scores: [i32; MAX_MOVES],
    len: usize,
    cur: usize,
}

impl MovePicker {
    fn empty() -> Self {
        Self {
            moves: [Move::NONE; MAX_MOVES],
            scores: [0; MAX_MOVES],
            len: 0,
            cur: 0,
        }
    }

    /// 通常探索用
    pub fn new(list: &MoveList, ctx: &OrderingContext, heuristics: &Heuristics) -> Self {
        let mut picker = Self::empty();
        for &m in list.iter() {
            picker.push(m, score_main(m, ctx, heuristics));
        }
        picker
    }

    /// 静止探索用（捕獲手・成りのMVV-LVAのみ）
    pub fn captures(list: &MoveList) -> Self {
        let mut picker = Self::empty();
        for &m in list.iter() {
            picker.push(m, score_tactical(m));
        }
        picker
    }

    /// 王手回避用（捕獲・成りを先に、残りは生成順）
    pub fn evasions(list: &MoveList) -> Self {
        let mut picker = Self::empty();
        for &m in list.iter() {
            let score = if m.is_quiet() { 0 } else { score_tactical(m) };
            picker.push(m, score);
        }
        picker
    }

    #[inline]
    fn push(&mut self, m: Move, score: i32) {
        self.moves[self.len] = m;
        self.scores[self.len] = score;
        self.len += 1;
    }

    /// 残りの中でスコア最大の手
    pub fn next_move(&mut self) -> Option<Move> {
        if self.cur >= self.len {
            return None;
        }
        let mut best = self.cur;
        for i in self.cur + 1..self.len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.cur, best);
        self.scores.swap(self.cur, best);
        let m = self.moves[self.cur];
        self.cur += 1;
        Some(m)
    }
}

#[inline]
fn score_tactical(m: Move) -> i32 {
    if m.is_promotion() {
        PROMOTION_SCORE + m.promotion_type().index() as i32 * 100 + mvv_lva(m).max(0)
    } else if m.is_capture() {
        CAPTURE_SCORE + mvv_lva(m)
    } else {
        0
    }
}

fn score_main(m: Move, ctx: &OrderingContext, heuristics: &Heuristics) -> i32 {
    if m == ctx.tt_move {
        return TT_MOVE_SCORE;
    }
    if !m.is_quiet() {
        return score_tactical(m);
    }
    if m == ctx.killers[0] {
        return KILLER1_SCORE;
    }
    if m == ctx.killers[1] {
        return KILLER2_SCORE;
    }
    let mut score = heuristics.history.get(ctx.side_to_move, m);
    if m == ctx.counter_move {
        score += COUNTER_MOVE_BONUS;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::generate_legal;
    use crate::position::Position;

    fn drain(picker: &mut MovePicker) -> Vec<Move> {
        std::iter::from_fn(|| picker.next_move()).collect()
    }

    #[test]
    fn test_priority_order() {
        // 白: e5のポーンがd6のナイト・f6のルークを取れる。a7のポーンが成れる。
        let pos = Position::from_fen("4k3/P7/3n1r2/4P3/8/8/8/R3K3 w - - 0 1").unwrap();
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);

        let tt_move = pos.parse_uci_move("a1a2").unwrap();
        let killer = pos.parse_uci_move("e1d2").unwrap();
        let ctx = OrderingContext {
            tt_move,
            killers: [killer, Move::NONE],
            counter_move: Move::NONE,
            side_to_move: Color::White,
        };
        let heuristics = Heuristics::default();
        let mut picker = MovePicker::new(&list, &ctx, &heuristics);
        let ordered = drain(&mut picker);

        assert_eq!(ordered[0], tt_move);
        assert_eq!(ordered[1].to_uci(), "a7a8q");
        // 成り4種の後に捕獲（ルーク取りが先）
        assert_eq!(ordered[5].to_uci(), "e5f6");
        assert_eq!(ordered[6].to_uci(), "e5d6");
        assert_eq!(ordered[7], killer);
        assert_eq!(ordered.len(), list.len());
    }

    #[test]
    fn test_history_and_counter_move() {
        let pos = Position::startpos();
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);

        let mut heuristics = Heuristics::default();
        let liked = pos.parse_uci_move("d2d4").unwrap();
        let counter = pos.parse_uci_move("g1f3").unwrap();
        heuristics.history.reward(Color::White, liked, 10);
        let ctx = OrderingContext {
            tt_move: Move::NONE,
            killers: [Move::NONE; 2],
            counter_move: counter,
            side_to_move: Color::White,
        };
        let mut picker = MovePicker::new(&list, &ctx, &heuristics);
        assert_eq!(picker.next_move(), Some(counter));
        assert_eq!(picker.next_move(), Some(liked));
    }

    #[test]
    fn test_captures_mvv_lva() {
        // d5のクイーンはポーンとナイトの両方から取れる
        let pos = Position::from_fen("4k3/8/8/3q4/4P3/2N5/8/4K3 w - - 0 1").unwrap();
        let mut list = MoveList::new();
        crate::movegen::generate_legal_captures(&pos, &mut list);
        let mut picker = MovePicker::captures(&list);
        let ordered = drain(&mut picker);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].to_uci(), "e4d5");
        assert_eq!(ordered[1].to_uci(), "c3d5");
    }
}
