//! 探索エンジン
//!
//! 局面・局面履歴・置換表・History・評価パラメータを所有するハンドル。
//! `search` が反復深化とaspiration windowでルート探索を回す。
//!
//! 停止フラグだけは `Arc<AtomicBool>` で共有し、別スレッドのドライバから立てられる。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::eval::EvalParams;
use crate::movegen::{MoveList, generate_legal};
use crate::position::{MoveParseError, Position};
use crate::tt::{DEFAULT_TT_MB, TranspositionTable};
use crate::types::{Depth, MAX_PLY, Move, Value};

use super::alpha_beta::SearchWorker;
use super::history::Heuristics;
use super::params::{SearchParams, SearchSetResult};
use super::pv::PvLine;
use super::state_stack::StateStack;
#[cfg(feature = "search-stats")]
use super::stats::SearchStats;
use super::{SearchInfo, SearchLimits, SearchResult, TimeManager};

/// aspiration window を広げる最大回数（超えたら全幅）
const MAX_ASPIRATION_WIDENINGS: i32 = 6;

/// 探索エンジン
pub struct Engine {
    position: Position,
    states: StateStack,
    tt: TranspositionTable,
    heuristics: Box<Heuristics>,
    eval_params: EvalParams,
    params: SearchParams,
    /// 直前の探索の評価値（aspiration window の中心）
    prev_score: Value,
    stop: Arc<AtomicBool>,
    #[cfg(feature = "search-stats")]
    stats: SearchStats,
}

impl Engine {
    /// 置換表サイズ（MiB）を指定して生成
    ///
    /// 置換表の確保は最初の探索まで遅延する。
    pub fn new(tt_mb: usize) -> Self {
        let position = Position::startpos();
        let mut states = StateStack::new();
        states.reset(&position);
        Self {
            position,
            states,
            tt: TranspositionTable::new(tt_mb),
            heuristics: Box::default(),
            eval_params: EvalParams::default(),
            params: SearchParams::default(),
            prev_score: Value::ZERO,
            stop: Arc::new(AtomicBool::new(false)),
            #[cfg(feature = "search-stats")]
            stats: SearchStats::default(),
        }
    }

    // =========================================================================
    // 局面
    // =========================================================================

    /// 局面を設定（局面履歴はこの局面から始まる）
    pub fn set_position(&mut self, pos: Position) {
        self.states.reset(&pos);
        self.position = pos;
    }

    /// UCI形式の指し手を現局面に適用する
    ///
    /// "0000" は null move として手番だけを渡す（王手中は不可）。
    pub fn apply_move(&mut self, text: &str) -> Result<Move, MoveParseError> {
        let m = self.position.parse_uci_move(text)?;
        if m.is_none() {
            if self.position.is_in_check() {
                return Err(MoveParseError::Illegal(text.to_string()));
            }
            self.position.make_null_move();
        } else if self.position.make_move(m).is_none() {
            return Err(MoveParseError::Illegal(text.to_string()));
        }
        self.states.push(&self.position);
        Ok(m)
    }

    /// 現局面
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// 現局面が局面履歴上で引き分け（千日手・50手ルール）か
    pub fn is_draw(&self) -> bool {
        self.states.is_draw(self.states.len())
    }

    /// 新しい対局（置換表・History・局面履歴をクリア）
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.heuristics.clear();
        self.set_position(Position::startpos());
        self.prev_score = Value::ZERO;
    }

    // =========================================================================
    // 設定
    // =========================================================================

    /// 停止フラグ
    ///
    /// `search` はこのフラグを下ろさない。ドライバが探索開始前に `false` にする。
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// 置換表サイズを変更（内容は消える）
    pub fn set_hash_size(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    pub fn hash_size_mb(&self) -> usize {
        self.tt.size_mb()
    }

    pub fn clear_hash(&mut self) {
        self.tt.clear();
    }

    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.tt
    }

    pub fn set_eval_params(&mut self, params: EvalParams) {
        self.eval_params = params;
    }

    pub fn eval_params(&self) -> &EvalParams {
        &self.eval_params
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// UCI option 名で探索パラメータを設定（未知の名前なら `None`）
    pub fn set_option(&mut self, name: &str, value: i32) -> Option<SearchSetResult> {
        self.params.set_from_uci_name(name, value)
    }

    /// 探索統計のレポート（search-stats feature有効時のみ）
    #[cfg(feature = "search-stats")]
    pub fn stats_report(&self) -> String {
        self.stats.format_report()
    }

    // =========================================================================
    // 探索
    // =========================================================================

    /// 反復深化探索
    ///
    /// 各イテレーション完了時に `on_info` を呼ぶ。中断されたイテレーションの結果は捨て、
    /// 最後に完了したイテレーションの読み筋を返す。
    /// 合法手が無い局面では `best_move` が `Move::NONE` の結果をすぐに返す。
    pub fn search(
        &mut self,
        limits: &SearchLimits,
        on_info: &mut dyn FnMut(&SearchInfo),
    ) -> SearchResult {
        let mut root_moves = MoveList::new();
        generate_legal(&self.position, &mut root_moves);
        if root_moves.is_empty() {
            let score = if self.position.is_in_check() {
                Value::mated_in(0)
            } else {
                Value::DRAW
            };
            info!("no legal moves at root (score {})", score.raw());
            return SearchResult {
                best_move: Move::NONE,
                score,
                depth: 0,
                nodes: 0,
                pv: Vec::new(),
            };
        }

        self.tt.ensure_allocated();
        self.tt.new_search();
        #[cfg(feature = "search-stats")]
        self.stats.reset();

        let us = self.position.side_to_move();
        let mut time = TimeManager::new();
        time.init(limits, us, self.position.fullmove_number());
        let max_depth: Depth = limits.depth.unwrap_or(MAX_PLY - 1).clamp(1, MAX_PLY - 1);
        let window = self.params.aspiration_window.max(1);

        let first = root_moves[0];
        let mut result = SearchResult {
            best_move: first,
            score: Value::ZERO,
            depth: 0,
            nodes: 0,
            pv: vec![first],
        };

        let mut worker = SearchWorker {
            pos: self.position.clone(),
            root_index: self.states.len() - 1,
            states: &mut self.states,
            tt: &mut self.tt,
            heuristics: &mut self.heuristics,
            eval_params: &self.eval_params,
            params: &self.params,
            stop: &self.stop,
            time,
            node_limit: limits.nodes,
            nodes: 0,
            root_move: Move::NONE,
            aborted: false,
            #[cfg(feature = "search-stats")]
            stats: &mut self.stats,
        };

        let mut prev_score = self.prev_score;
        let mut last_mate: Option<i32> = None;
        let mut pv = PvLine::new();

        for depth in 1..=max_depth {
            let mut alpha = (prev_score - Value::new(window)).max(-Value::INFINITE);
            let mut beta = (prev_score + Value::new(window)).min(Value::INFINITE);
            let mut widenings = 0;

            let score = loop {
                let s = worker.alphabeta(alpha, beta, depth, 0, &mut pv, Move::NONE, false);
                if worker.aborted {
                    break None;
                }
                let full_window = alpha == -Value::INFINITE && beta == Value::INFINITE;
                if full_window || (s > alpha && s < beta) {
                    break Some(s);
                }
                if widenings >= MAX_ASPIRATION_WIDENINGS {
                    alpha = -Value::INFINITE;
                    beta = Value::INFINITE;
                } else {
                    let step = Value::new(window * (widenings + 1));
                    if s <= alpha {
                        alpha = (alpha - step).max(-Value::INFINITE);
                    } else {
                        beta = (beta + step).min(Value::INFINITE);
                    }
                }
                widenings += 1;
            };

            let Some(score) = score else {
                debug!("depth {depth} aborted after {} nodes", worker.nodes);
                break;
            };

            prev_score = score;
            let best = if pv.is_empty() { result.best_move } else { pv.first() };
            worker.root_move = best;
            result = SearchResult {
                best_move: best,
                score,
                depth,
                nodes: worker.nodes,
                pv: if pv.is_empty() { vec![best] } else { pv.as_slice().to_vec() },
            };

            let elapsed = worker.time.elapsed();
            let search_info = SearchInfo {
                depth,
                score,
                nodes: worker.nodes,
                time_ms: elapsed,
                nps: worker.nodes * 1000 / elapsed.max(1) as u64,
                hashfull: worker.tt.hashfull(),
                pv: result.pv.clone(),
            };
            debug!(
                "depth {} score {} nodes {} time {}ms pv {:?}",
                depth,
                score.raw(),
                worker.nodes,
                elapsed,
                pv
            );
            on_info(&search_info);

            worker.time.update_iteration(best, score);
            if worker.stop.load(Ordering::Relaxed) {
                break;
            }
            if limits.infinite {
                continue;
            }

            // 同じ手数の詰みが2イテレーション続いたら確定とみなす
            if score.is_mate_score() {
                let distance = score.mate_ply();
                if last_mate == Some(distance) {
                    break;
                }
                last_mate = Some(distance);
            } else {
                last_mate = None;
            }

            if worker.time.should_stop_early() {
                break;
            }
            if worker.time.soft_limit_reached()
                && !(worker.time.should_extend() && worker.time.extend())
            {
                break;
            }
        }

        result.nodes = worker.nodes;
        self.prev_score = result.score;
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_TT_MB)
    }
}
