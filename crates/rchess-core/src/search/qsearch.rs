//! 静止探索 (Quiescence Search)
//!
//! 駒取りと王手回避だけを延長し、局面が落ち着いたところで静的評価を返す。

use crate::movegen::{MoveList, generate_legal, generate_legal_captures};
use crate::types::{MAX_PLY, Value};

use super::alpha_beta::SearchWorker;
use super::ordering::MovePicker;
use super::pv::PvLine;
use super::stats::inc_stat;

/// 静止探索で王手回避を延長する最大回数
const QS_CHECK_LIMIT: i32 = 10;

impl SearchWorker<'_> {
    /// 静止探索
    ///
    /// `checks` はこの静止探索の中で延長した王手回避の回数。
    pub(super) fn qsearch(
        &mut self,
        mut alpha: Value,
        beta: Value,
        ply: i32,
        checks: i32,
        pv: &mut PvLine,
    ) -> Value {
        pv.clear();
        self.nodes += 1;
        inc_stat!(self, qnodes);
        if self.check_abort() {
            return Value::ZERO;
        }

        let in_check = self.pos.is_in_check();
        if ply >= MAX_PLY {
            return if in_check {
                Value::ZERO
            } else {
                self.static_eval()
            };
        }

        let mut list = MoveList::new();
        let mut picker = if in_check {
            if checks >= QS_CHECK_LIMIT {
                return self.static_eval();
            }
            generate_legal(&self.pos, &mut list);
            if list.is_empty() {
                return Value::mated_in(ply).clamp(alpha, beta);
            }
            MovePicker::evasions(&list)
        } else {
            let stand_pat = self.static_eval();
            if stand_pat >= beta {
                return beta;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            generate_legal_captures(&self.pos, &mut list);
            MovePicker::captures(&list)
        };

        let next_checks = if in_check { checks + 1 } else { checks };
        let mut child_pv = PvLine::new();
        while let Some(m) = picker.next_move() {
            // 王手回避以外では駒損する取り合いを読まない
            if !in_check && !self.pos.see_ge(m, 0) {
                continue;
            }
            let Some(undo) = self.pos.make_move(m) else {
                continue;
            };
            let score = -self.qsearch(-beta, -alpha, ply + 1, next_checks, &mut child_pv);
            self.pos.unmake_move(m, &undo);

            if self.aborted {
                return Value::ZERO;
            }
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
                pv.update(m, &child_pv);
            }
        }
        alpha
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::eval::EvalParams;
    use crate::position::Position;
    use crate::search::TimeManager;
    use crate::search::history::Heuristics;
    use crate::search::params::SearchParams;
    use crate::search::state_stack::StateStack;
    #[cfg(feature = "search-stats")]
    use crate::search::stats::SearchStats;
    use crate::tt::TranspositionTable;
    use crate::types::Move;

    /// SearchWorker が借用する探索状態一式
    struct Fixture {
        states: StateStack,
        tt: TranspositionTable,
        heuristics: Heuristics,
        eval_params: EvalParams,
        params: SearchParams,
        stop: AtomicBool,
        #[cfg(feature = "search-stats")]
        stats: SearchStats,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                states: StateStack::new(),
                tt: TranspositionTable::new(1),
                heuristics: Heuristics::default(),
                eval_params: EvalParams::default(),
                params: SearchParams::default(),
                stop: AtomicBool::new(false),
                #[cfg(feature = "search-stats")]
                stats: SearchStats::default(),
            }
        }

        fn worker(&mut self, fen: &str) -> SearchWorker<'_> {
            let pos = Position::from_fen(fen).unwrap();
            self.states.reset(&pos);
            SearchWorker {
                pos,
                root_index: self.states.len() - 1,
                states: &mut self.states,
                tt: &mut self.tt,
                heuristics: &mut self.heuristics,
                eval_params: &self.eval_params,
                params: &self.params,
                stop: &self.stop,
                time: TimeManager::new(),
                node_limit: None,
                nodes: 0,
                root_move: Move::NONE,
                aborted: false,
                #[cfg(feature = "search-stats")]
                stats: &mut self.stats,
            }
        }
    }

    fn full_window(worker: &mut SearchWorker<'_>, ply: i32, pv: &mut PvLine) -> Value {
        worker.qsearch(-Value::INFINITE, Value::INFINITE, ply, 0, pv)
    }

    #[test]
    fn test_quiet_position_returns_static_eval() {
        let mut fx = Fixture::new();
        let mut worker = fx.worker("4k3/8/8/8/8/8/3P4/4K2R w - - 0 1");
        let mut pv = PvLine::new();
        let stand_pat = worker.static_eval();
        assert_eq!(full_window(&mut worker, 0, &mut pv), stand_pat);
        assert_eq!(worker.nodes, 1);
        assert!(pv.is_empty());
    }

    #[test]
    fn test_stand_pat_cutoff_returns_beta() {
        let mut fx = Fixture::new();
        // 白はクイーン得で、取れる駒もある
        let mut worker = fx.worker("4k3/8/8/3p4/8/8/8/3QK3 w - - 0 1");
        let mut pv = PvLine::new();
        let beta = Value::new(50);
        assert!(worker.static_eval() >= beta);
        assert_eq!(worker.qsearch(Value::ZERO, beta, 0, 0, &mut pv), beta);
        assert_eq!(worker.nodes, 1);
    }

    #[test]
    fn test_losing_capture_is_not_searched() {
        let mut fx = Fixture::new();
        // d5 のポーンは e6 のポーンに守られている
        let mut worker = fx.worker("4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1");
        let mut pv = PvLine::new();
        let stand_pat = worker.static_eval();
        assert_eq!(full_window(&mut worker, 0, &mut pv), stand_pat);
        assert_eq!(worker.nodes, 1, "Qxd5 should be skipped by SEE");
        assert!(pv.is_empty());
    }

    #[test]
    fn test_free_capture_is_searched() {
        let mut fx = Fixture::new();
        let mut worker = fx.worker("4k3/8/8/3p4/8/8/8/3QK3 w - - 0 1");
        let mut pv = PvLine::new();
        let stand_pat = worker.static_eval();
        let score = full_window(&mut worker, 0, &mut pv);
        assert!(score > stand_pat, "{score:?} vs {stand_pat:?}");
        assert_eq!(pv.first().to_uci(), "d1d5");
        assert!(worker.nodes > 1);
    }

    #[test]
    fn test_checkmated_leaf_returns_mate_score() {
        let mut fx = Fixture::new();
        let mate = "R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1";
        let mut worker = fx.worker(mate);
        let mut pv = PvLine::new();
        assert_eq!(full_window(&mut worker, 3, &mut pv), Value::mated_in(3));

        // 窓の下に出た詰みは alpha にクランプされる
        let mut worker = fx.worker(mate);
        let alpha = Value::new(-200);
        assert_eq!(worker.qsearch(alpha, Value::new(200), 3, 0, &mut pv), alpha);
    }

    #[test]
    fn test_check_extension_is_capped() {
        let mut fx = Fixture::new();
        // 黒のルークが王手しているが、回避手はある
        let fen = "4k3/8/8/8/8/8/8/r3K3 w - - 0 1";
        let mut worker = fx.worker(fen);
        let mut pv = PvLine::new();
        let stand_pat = worker.static_eval();
        let capped = worker.qsearch(-Value::INFINITE, Value::INFINITE, 0, QS_CHECK_LIMIT, &mut pv);
        assert_eq!(capped, stand_pat);
        assert_eq!(worker.nodes, 1);

        let mut worker = fx.worker(fen);
        full_window(&mut worker, 0, &mut pv);
        assert!(worker.nodes > 1, "evasions should be searched below the cap");
    }
}
