//! 探索条件と探索結果

use crate::types::{Color, Depth, Move, Value};

use super::TimePoint;

/// `go` コマンドで与えられる探索条件
///
/// 時間はミリ秒。指定されなかった項目は `None`（増分は0）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub wtime: Option<TimePoint>,
    pub btime: Option<TimePoint>,
    pub winc: TimePoint,
    pub binc: TimePoint,
    pub movestogo: Option<u32>,
    pub depth: Option<Depth>,
    pub nodes: Option<u64>,
    pub movetime: Option<TimePoint>,
    pub infinite: bool,
}

impl SearchLimits {
    /// 深さ固定の探索
    pub fn depth(depth: Depth) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// 思考時間固定の探索
    pub fn movetime(ms: TimePoint) -> Self {
        Self {
            movetime: Some(ms),
            ..Self::default()
        }
    }

    /// 手番側の残り時間
    #[inline]
    pub fn time_left(&self, us: Color) -> Option<TimePoint> {
        match us {
            Color::White => self.wtime,
            Color::Black => self.btime,
        }
    }

    /// 手番側の増分
    #[inline]
    pub fn increment(&self, us: Color) -> TimePoint {
        match us {
            Color::White => self.winc,
            Color::Black => self.binc,
        }
    }

    /// 時間制御が有効か（infinite・深さ指定のみの探索では無効）
    pub fn uses_clock(&self, us: Color) -> bool {
        !self.infinite && (self.movetime.is_some() || self.time_left(us).is_some())
    }
}

/// 反復深化の1イテレーション完了ごとに通知される情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: Depth,
    /// 手番側から見た評価値
    pub score: Value,
    pub nodes: u64,
    /// 経過時間（ms）
    pub time_ms: TimePoint,
    pub nps: u64,
    /// 置換表使用率（パーミル）
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

impl SearchInfo {
    /// `info` 行の score 部分（`cp N` / `mate N`）
    pub fn score_text(&self) -> String {
        format_score(self.score)
    }

    /// UCI `info` 行
    pub fn to_uci_line(&self) -> String {
        let mut line = format!(
            "info depth {} score {} nodes {} time {} nps {} hashfull {}",
            self.depth,
            self.score_text(),
            self.nodes,
            self.time_ms,
            self.nps,
            self.hashfull
        );
        if !self.pv.is_empty() {
            line.push_str(" pv");
            for m in &self.pv {
                line.push(' ');
                line.push_str(&m.to_uci());
            }
        }
        line
    }
}

/// `cp N` または `mate N` 形式の評価値表記
pub fn format_score(score: Value) -> String {
    match score.mate_moves() {
        Some(n) => format!("mate {n}"),
        None => format!("cp {}", score.raw()),
    }
}

/// 探索結果
///
/// 合法手が無い局面では `best_move` が `Move::NONE`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: Value,
    /// 完了した最大の反復深さ
    pub depth: Depth,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

impl SearchResult {
    /// `bestmove` 行
    pub fn bestmove_line(&self) -> String {
        if self.best_move.is_none() {
            "bestmove (none)".to_string()
        } else {
            format!("bestmove {}", self.best_move.to_uci())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Piece, Square};

    #[test]
    fn test_score_text() {
        assert_eq!(format_score(Value::new(35)), "cp 35");
        assert_eq!(format_score(Value::new(-120)), "cp -120");
        assert_eq!(format_score(Value::mate_in(1)), "mate 1");
        assert_eq!(format_score(Value::mate_in(3)), "mate 2");
        assert_eq!(format_score(Value::mated_in(2)), "mate -1");
    }

    #[test]
    fn test_uci_line_and_bestmove() {
        let m = Move::normal(Square::E2, Square::E4, Piece::W_PAWN, Piece::NONE);
        let info = SearchInfo {
            depth: 3,
            score: Value::new(20),
            nodes: 1000,
            time_ms: 10,
            nps: 100_000,
            hashfull: 0,
            pv: vec![m],
        };
        assert_eq!(
            info.to_uci_line(),
            "info depth 3 score cp 20 nodes 1000 time 10 nps 100000 hashfull 0 pv e2e4"
        );
        let result = SearchResult {
            best_move: m,
            score: Value::ZERO,
            depth: 1,
            nodes: 1,
            pv: vec![m],
        };
        assert_eq!(result.bestmove_line(), "bestmove e2e4");
        let none = SearchResult {
            best_move: Move::NONE,
            ..result
        };
        assert_eq!(none.bestmove_line(), "bestmove (none)");
    }

    #[test]
    fn test_uses_clock() {
        assert!(!SearchLimits::depth(5).uses_clock(Color::White));
        assert!(SearchLimits::movetime(100).uses_clock(Color::Black));
        let limits = SearchLimits {
            wtime: Some(1000),
            ..SearchLimits::default()
        };
        assert!(limits.uses_clock(Color::White));
        assert!(!limits.uses_clock(Color::Black));
        let infinite = SearchLimits {
            infinite: true,
            ..limits
        };
        assert!(!infinite.uses_clock(Color::White));
    }
}
