//! Alpha-Beta探索の実装
//!
//! fail-hard の Principal Variation Search。
//! - 置換表カットオフ
//! - 各種枝刈り: Razoring, Reverse Futility, NMP, LMP, Futility
//! - Internal Iterative Deepening
//! - LMR（null window での縮小探索と再探索）

use std::sync::atomic::{AtomicBool, Ordering};

use crate::eval::{EvalParams, evaluate};
use crate::movegen::{MoveList, generate_legal};
use crate::position::{Position, UndoInfo};
use crate::tt::TranspositionTable;
use crate::types::{Bound, Depth, MAX_PLY, Move, Value};

use super::TimeManager;
use super::history::{Heuristics, lmr_reduction};
use super::ordering::{MovePicker, OrderingContext};
use super::params::SearchParams;
use super::pv::PvLine;
use super::state_stack::StateStack;
#[cfg(feature = "search-stats")]
use super::stats::SearchStats;
use super::stats::{inc_stat, inc_stat_by_depth};

// =============================================================================
// 定数
// =============================================================================

/// 停止条件をポーリングするノード間隔（2のべき乗）
const POLL_INTERVAL: u64 = 2048;

/// Razoring マージンの倍率
const RAZOR_MARGIN_SCALE: i32 = 3;

/// Reverse futility: 残り深さ1あたりのマージン
const RFP_MARGIN_PER_DEPTH: i32 = 15;

/// IID を行う最小の残り深さと、そのときの削減量
const IID_MIN_DEPTH: Depth = 4;
const IID_REDUCTION: Depth = 3;

/// cutoff 時に malus を与える静かな手の最大数
const MAX_QUIETS_TRACKED: usize = 64;

const ONE: Value = Value::new(1);

/// このノードで null move pruning を試してよいか
///
/// 王手されている局面、直前が null move の局面、PVノード、
/// ポーン以外の駒が無い局面（ツークツワンク）では試さない。
pub(super) fn null_move_allowed(
    pos: &Position,
    params: &SearchParams,
    depth: Depth,
    in_check: bool,
    did_null: bool,
    pv_node: bool,
) -> bool {
    !in_check
        && !did_null
        && !pv_node
        && depth >= params.null_move_min_depth
        && pos.has_non_pawn_material(pos.side_to_move())
}

/// Late move pruning: このノードの `moves_seen` 手目以降の静かな手を読まないか
#[inline]
pub(super) fn lmp_prunes(params: &SearchParams, depth: Depth, moves_seen: i32) -> bool {
    params.lmp_threshold(depth).is_some_and(|threshold| moves_seen > threshold)
}

/// 1回の `go` の間だけ生きる探索状態
///
/// 局面は複製して持ち、置換表・History・局面履歴は Engine から借用する。
pub(super) struct SearchWorker<'a> {
    pub(super) pos: Position,
    pub(super) states: &'a mut StateStack,
    pub(super) tt: &'a mut TranspositionTable,
    pub(super) heuristics: &'a mut Heuristics,
    pub(super) eval_params: &'a EvalParams,
    pub(super) params: &'a SearchParams,
    pub(super) stop: &'a AtomicBool,
    pub(super) time: TimeManager,
    pub(super) node_limit: Option<u64>,
    pub(super) nodes: u64,
    /// ルート局面の局面履歴上の位置
    pub(super) root_index: usize,
    /// 前回イテレーションの最善手（ルートのオーダリング用）
    pub(super) root_move: Move,
    /// 停止条件が成立したら立つ（以降の探索結果は使わない）
    pub(super) aborted: bool,
    #[cfg(feature = "search-stats")]
    pub(super) stats: &'a mut SearchStats,
}

impl SearchWorker<'_> {
    /// 停止判定（POLL_INTERVAL ノードごとに外部フラグ・ノード数・hard limit を見る）
    #[inline]
    pub(super) fn check_abort(&mut self) -> bool {
        if !self.aborted
            && self.nodes & (POLL_INTERVAL - 1) == 0
            && (self.stop.load(Ordering::Relaxed)
                || self.node_limit.is_some_and(|limit| self.nodes >= limit)
                || self.time.hard_limit_reached())
        {
            self.aborted = true;
        }
        self.aborted
    }

    #[inline]
    pub(super) fn static_eval(&self) -> Value {
        evaluate(&self.pos, self.eval_params)
    }

    /// 手を指して局面履歴に積む（違法手なら `None`）
    #[inline]
    fn do_move(&mut self, m: Move) -> Option<UndoInfo> {
        let undo = self.pos.make_move(m)?;
        self.states.push(&self.pos);
        Some(undo)
    }

    #[inline]
    fn undo_move(&mut self, m: Move, undo: &UndoInfo) {
        self.states.pop();
        self.pos.unmake_move(m, undo);
    }

    /// PVS本体
    ///
    /// 戻り値は手番側から見た評価値で、`[alpha, beta]` にクランプされる（fail-hard）。
    /// 探索が中断された場合は `Value::ZERO` を返し、呼び出し側は `aborted` を見て捨てる。
    #[allow(clippy::too_many_arguments)]
    pub(super) fn alphabeta(
        &mut self,
        mut alpha: Value,
        beta: Value,
        mut depth: Depth,
        ply: i32,
        pv: &mut PvLine,
        prev_move: Move,
        did_null: bool,
    ) -> Value {
        pv.clear();
        let root_node = ply == 0;
        let pv_node = beta.raw() - alpha.raw() > 1;

        self.nodes += 1;
        inc_stat!(self, nodes_searched);
        inc_stat_by_depth!(self, nodes_by_depth, depth);
        if self.check_abort() {
            return Value::ZERO;
        }

        if !root_node {
            if self.states.is_draw(self.root_index) {
                return Value::DRAW;
            }
            if ply >= MAX_PLY {
                return self.static_eval();
            }
        }

        let in_check = self.pos.is_in_check();
        if in_check {
            depth += 1;
        }
        if depth <= 0 {
            return self.qsearch(alpha, beta, ply, 0, pv);
        }

        // -----------------------------------------------------------------
        // 置換表
        // -----------------------------------------------------------------
        let hash = self.pos.hash();
        let mut tt_move = Move::NONE;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move();
            if !root_node && !pv_node {
                let (usable, score) = self.tt.use_entry(&entry, depth, alpha, beta, ply, None);
                if usable {
                    inc_stat!(self, tt_cutoff);
                    return score;
                }
            }
        }
        if root_node && tt_move.is_none() {
            tt_move = self.root_move;
        }

        let mut moves = MoveList::new();
        generate_legal(&self.pos, &mut moves);
        if moves.is_empty() {
            return if in_check {
                Value::mated_in(ply)
            } else {
                Value::DRAW
            };
        }
        if !moves.contains(tt_move) {
            tt_move = Move::NONE;
        }

        // -----------------------------------------------------------------
        // 指し手ループ前の枝刈り
        // -----------------------------------------------------------------
        let mut futile = false;
        if !in_check && !pv_node {
            let static_eval = self.static_eval();

            let razor = self
                .params
                .razor_margin(depth)
                .is_some_and(|margin| static_eval.raw() + RAZOR_MARGIN_SCALE * margin < alpha.raw());
            if razor {
                if depth <= 2 {
                    inc_stat!(self, razoring_applied);
                    return alpha;
                }
                // 深さ3は静止探索で確かめてから枝を切る
                let mut qpv = PvLine::new();
                let v = self.qsearch(alpha, alpha + ONE, ply, 0, &mut qpv);
                if self.aborted {
                    return Value::ZERO;
                }
                if v <= alpha {
                    inc_stat!(self, razoring_applied);
                    return alpha;
                }
            }

            if beta < Value::MATE_IN_MAX_PLY
                && static_eval.raw() - RFP_MARGIN_PER_DEPTH * depth >= beta.raw()
            {
                inc_stat!(self, reverse_futility);
                return beta;
            }

            if let Some(margin) = self.params.futility_margin(depth) {
                futile = static_eval.raw() + margin <= alpha.raw();
            }

            if null_move_allowed(&self.pos, self.params, depth, in_check, did_null, pv_node) {
                inc_stat!(self, nmp_attempted);
                let r = 3 + depth / 6;
                let undo = self.pos.make_null_move();
                self.states.push(&self.pos);
                let mut child = PvLine::new();
                let score = -self.alphabeta(
                    -beta,
                    -beta + ONE,
                    depth - 1 - r,
                    ply + 1,
                    &mut child,
                    Move::NONE,
                    true,
                );
                self.states.pop();
                self.pos.unmake_null_move(&undo);
                if self.aborted {
                    return Value::ZERO;
                }
                if score >= beta {
                    inc_stat!(self, nmp_cutoff);
                    return beta;
                }
            }
        }

        // -----------------------------------------------------------------
        // Internal Iterative Deepening
        // -----------------------------------------------------------------
        if tt_move.is_none() && pv_node && depth >= IID_MIN_DEPTH {
            inc_stat!(self, iid_searches);
            let mut iid_pv = PvLine::new();
            self.alphabeta(alpha, beta, depth - IID_REDUCTION, ply, &mut iid_pv, prev_move, did_null);
            if self.aborted {
                return Value::ZERO;
            }
            tt_move = iid_pv.first();
            if tt_move.is_none() {
                tt_move = self.tt.probe(hash).map_or(Move::NONE, |entry| entry.best_move());
            }
            if !moves.contains(tt_move) {
                tt_move = Move::NONE;
            }
        }

        // -----------------------------------------------------------------
        // 指し手ループ
        // -----------------------------------------------------------------
        let us = self.pos.side_to_move();
        let ctx = OrderingContext {
            tt_move,
            killers: self.heuristics.killers.get(ply),
            counter_move: self.heuristics.counter_moves.get(us, prev_move),
            side_to_move: us,
        };
        let mut picker = MovePicker::new(&moves, &ctx, self.heuristics);

        let mut best_move = Move::NONE;
        let mut moves_seen = 0;
        let mut moves_searched = 0usize;
        let mut quiets_tried = [Move::NONE; MAX_QUIETS_TRACKED];
        let mut quiet_count = 0;
        let mut child_pv = PvLine::new();

        while let Some(m) = picker.next_move() {
            let Some(undo) = self.do_move(m) else {
                continue;
            };
            moves_seen += 1;
            let gives_check = self.pos.is_in_check();
            let quiet = m.is_quiet();
            let tactical = !quiet || gives_check;

            if !pv_node && !in_check && !tactical {
                if lmp_prunes(self.params, depth, moves_seen) {
                    self.undo_move(m, &undo);
                    inc_stat!(self, lmp_pruned);
                    continue;
                }
                if futile {
                    self.undo_move(m, &undo);
                    inc_stat!(self, futility_pruned);
                    continue;
                }
            }

            let new_depth = depth - 1;
            let score = if moves_searched == 0 {
                -self.alphabeta(-beta, -alpha, new_depth, ply + 1, &mut child_pv, m, false)
            } else {
                let mut r = 0;
                if quiet && !in_check && depth >= self.params.lmr_depth_limit {
                    r = lmr_reduction(depth, moves_searched);
                    if pv_node {
                        r -= 1;
                    }
                    let history = self.heuristics.history.get(us, m);
                    if history > 0 {
                        r -= 1;
                    } else if history < 0 {
                        r += 1;
                    }
                    if m == ctx.killers[0] || m == ctx.killers[1] {
                        r -= 1;
                    }
                    if gives_check {
                        r -= 1;
                    }
                    r = r.clamp(0, (depth - 2).max(0));
                    if r > 0 {
                        inc_stat!(self, lmr_applied);
                    }
                }

                let mut s = -self.alphabeta(
                    -(alpha + ONE),
                    -alpha,
                    new_depth - r,
                    ply + 1,
                    &mut child_pv,
                    m,
                    false,
                );
                if s > alpha && r > 0 {
                    inc_stat!(self, lmr_research);
                    s = -self.alphabeta(
                        -(alpha + ONE),
                        -alpha,
                        new_depth,
                        ply + 1,
                        &mut child_pv,
                        m,
                        false,
                    );
                }
                if s > alpha && s < beta {
                    s = -self.alphabeta(-beta, -alpha, new_depth, ply + 1, &mut child_pv, m, false);
                }
                s
            };
            self.undo_move(m, &undo);
            moves_searched += 1;

            if self.aborted {
                return Value::ZERO;
            }

            if score >= beta {
                inc_stat_by_depth!(self, cutoff_by_depth, depth);
                if moves_searched == 1 {
                    inc_stat_by_depth!(self, first_move_cutoff_by_depth, depth);
                }
                self.tt.store(hash, depth, ply, m, beta, Bound::Lower);
                if quiet {
                    self.heuristics.killers.update(ply, m);
                    self.heuristics.history.reward(us, m, depth);
                    for &q in &quiets_tried[..quiet_count] {
                        self.heuristics.history.penalize(us, q, depth);
                    }
                    self.heuristics.counter_moves.set(us, prev_move, m);
                }
                return beta;
            }

            if score > alpha {
                alpha = score;
                best_move = m;
                pv.update(m, &child_pv);
                if quiet {
                    self.heuristics.history.reward(us, m, depth);
                }
            }

            if quiet && quiet_count < MAX_QUIETS_TRACKED {
                quiets_tried[quiet_count] = m;
                quiet_count += 1;
            }
        }

        // 全ての手が枝刈りされた
        if moves_searched == 0 {
            return alpha;
        }

        let bound = if best_move.is_some() {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.store(hash, depth, ply, best_move, alpha, bound);
        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_move_never_in_check() {
        let params = SearchParams::default();
        // 黒のルークが白玉に王手
        let pos = Position::from_fen("4k3/8/8/8/8/8/3Q4/r3K3 w - - 0 1").unwrap();
        assert!(pos.is_in_check());
        for depth in 0..20 {
            assert!(!null_move_allowed(&pos, &params, depth, pos.is_in_check(), false, false));
        }
    }

    #[test]
    fn test_lmp_uses_deeper_thresholds_when_enabled() {
        let mut params = SearchParams::default();
        assert!(lmp_prunes(&params, 3, 15));
        assert!(!lmp_prunes(&params, 3, 14));
        assert!(!lmp_prunes(&params, 4, 200));

        params.set_from_uci_name("LMPMaxDepth", 6).expect("known name");
        params.set_from_uci_name("LMPDepth5Plus", 40).expect("known name");
        assert!(lmp_prunes(&params, 4, 21));
        assert!(!lmp_prunes(&params, 6, 40));
        assert!(lmp_prunes(&params, 6, 41));
        assert!(!lmp_prunes(&params, 7, 200));
    }

    #[test]
    fn test_null_move_conditions() {
        let params = SearchParams::default();
        let pos = Position::startpos();
        let min = params.null_move_min_depth;
        assert!(null_move_allowed(&pos, &params, min, false, false, false));
        assert!(!null_move_allowed(&pos, &params, min - 1, false, false, false));
        assert!(!null_move_allowed(&pos, &params, min, false, true, false));
        assert!(!null_move_allowed(&pos, &params, min, false, false, true));

        // キングとポーンだけ（ツークツワンクの危険）
        let pawns = Position::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(!null_move_allowed(&pawns, &params, 8, false, false, false));
    }
}
