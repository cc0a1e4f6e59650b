//! 時間管理
//!
//! 残り時間・増分・手数から1手あたりの基本配分を決め、
//! soft limit（反復深化の打ち切り目安）と hard limit（探索中断）を設定する。
//! イテレーションごとに最善手と評価値の安定度を追跡し、早期終了と延長を判断する。

use std::time::Instant;

use crate::types::{Color, Move, Value};

use super::{SearchLimits, TimePoint};

// =============================================================================
// 定数
// =============================================================================

/// movestogo 未指定時に見積もる残り手数の上限・下限
const MOVES_REMAINING_MAX: i64 = 50;
const MOVES_REMAINING_MIN: i64 = 20;

/// 残り時間に対する最大使用割合（movestogo 未指定時, 1/5 = 20%）
const MAX_TIME_DIVISOR: TimePoint = 5;

/// 安全マージン: 残り10秒未満は 1/20, それ以上は 1/50（最低50ms）
const BUFFER_THRESHOLD: TimePoint = 10_000;
const BUFFER_MIN: TimePoint = 50;

/// 早期終了に必要な最善手の連続一致回数
pub const BEST_STABLE_THRESHOLD: u32 = 4;
/// 早期終了に必要な評価値の連続安定回数
pub const SCORE_STABLE_THRESHOLD: u32 = 3;
/// 評価値を「安定」とみなす変動幅（cp）
pub const SCORE_STABLE_MARGIN: i32 = 10;
/// 早期終了を許す最小経過時間（基本配分に対する割合, %）
pub const EARLY_STOP_MIN_PERCENT: TimePoint = 40;

/// 時間管理
#[derive(Debug, Clone)]
pub struct TimeManager {
    start: Instant,
    /// 時間制御が有効か
    active: bool,
    base: TimePoint,
    soft: TimePoint,
    hard: TimePoint,
    max_allowed: TimePoint,
    best_stable: u32,
    score_stable: u32,
    last_best: Move,
    last_score: Option<Value>,
}

impl TimeManager {
    /// 時間制御なしの状態で生成
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            active: false,
            base: 0,
            soft: 0,
            hard: 0,
            max_allowed: 0,
            best_stable: 0,
            score_stable: 0,
            last_best: Move::NONE,
            last_score: None,
        }
    }

    /// 探索開始時の初期化
    ///
    /// `infinite` や深さ指定のみの探索では時間制御を無効にする。
    pub fn init(&mut self, limits: &SearchLimits, us: Color, fullmove: u32) {
        *self = Self::new();

        if limits.infinite {
            return;
        }
        if let Some(movetime) = limits.movetime {
            let t = movetime.max(1);
            self.active = true;
            self.base = t;
            self.soft = t;
            self.hard = t;
            self.max_allowed = t;
            return;
        }
        let Some(remaining) = limits.time_left(us) else {
            return;
        };

        let remaining = remaining.max(1);
        let inc = limits.increment(us).max(0);
        let moves_remaining = match limits.movestogo {
            Some(n) if n > 0 => n as i64,
            _ => (MOVES_REMAINING_MAX - fullmove as i64 / 2)
                .clamp(MOVES_REMAINING_MIN, MOVES_REMAINING_MAX),
        };

        let max_allowed = match limits.movestogo {
            Some(n) if n > 0 => {
                let buffer = if remaining < BUFFER_THRESHOLD {
                    remaining / 20
                } else {
                    remaining / 50
                };
                remaining - buffer.max(BUFFER_MIN)
            }
            _ => remaining / MAX_TIME_DIVISOR,
        }
        .max(1);

        let base = (remaining / moves_remaining + inc * 3 / 4).clamp(1, max_allowed);

        self.active = true;
        self.base = base;
        self.soft = (base * 3 / 5).max(1);
        self.hard = (base * 5 / 2).min(max_allowed);
        self.max_allowed = max_allowed;
    }

    /// 時間制御が有効か
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 探索開始からの経過時間（ms）
    #[inline]
    pub fn elapsed(&self) -> TimePoint {
        self.start.elapsed().as_millis() as TimePoint
    }

    pub fn base(&self) -> TimePoint {
        self.base
    }

    pub fn soft_limit(&self) -> TimePoint {
        self.soft
    }

    pub fn hard_limit(&self) -> TimePoint {
        self.hard
    }

    /// hard limit を超えたか（探索中にポーリングする）
    #[inline]
    pub fn hard_limit_reached(&self) -> bool {
        self.active && self.elapsed() >= self.hard
    }

    /// soft limit を超えたか（イテレーション間で判定する）
    #[inline]
    pub fn soft_limit_reached(&self) -> bool {
        self.active && self.elapsed() >= self.soft
    }

    /// イテレーション完了時に最善手と評価値の安定度を更新
    pub fn update_iteration(&mut self, best: Move, score: Value) {
        if self.last_best.is_some() && best == self.last_best {
            self.best_stable += 1;
        } else {
            self.best_stable = 0;
        }
        match self.last_score {
            Some(prev) if (score.raw() - prev.raw()).abs() <= SCORE_STABLE_MARGIN => {
                self.score_stable += 1;
            }
            _ => self.score_stable = 0,
        }
        self.last_best = best;
        self.last_score = Some(score);
    }

    /// 最善手・評価値ともに安定していて、基本配分の40%以上を使ったか
    pub fn should_stop_early(&self) -> bool {
        self.stop_early_at(self.elapsed())
    }

    fn stop_early_at(&self, elapsed: TimePoint) -> bool {
        self.active
            && self.best_stable >= BEST_STABLE_THRESHOLD
            && self.score_stable >= SCORE_STABLE_THRESHOLD
            && elapsed * 100 >= self.base * EARLY_STOP_MIN_PERCENT
    }

    /// 最善手が変わったばかりで評価値も不安定か
    pub fn should_extend(&self) -> bool {
        self.active && self.best_stable == 0 && self.score_stable < 2
    }

    /// soft limit を基本配分の半分だけ延ばす（hard limit が上限）
    ///
    /// 延長できた場合 `true`。
    pub fn extend(&mut self) -> bool {
        if !self.active || self.soft >= self.hard {
            return false;
        }
        self.soft = (self.soft + self.base / 2).min(self.hard);
        true
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Piece, Square};

    fn sudden_death(ms: TimePoint, inc: TimePoint) -> SearchLimits {
        SearchLimits {
            wtime: Some(ms),
            btime: Some(ms),
            winc: inc,
            binc: inc,
            ..SearchLimits::default()
        }
    }

    #[test]
    fn test_no_clock_is_inactive() {
        let mut tm = TimeManager::new();
        tm.init(&SearchLimits::depth(6), Color::White, 1);
        assert!(!tm.is_active());
        assert!(!tm.hard_limit_reached());
        assert!(!tm.should_extend());

        let infinite = SearchLimits {
            infinite: true,
            ..sudden_death(60_000, 0)
        };
        tm.init(&infinite, Color::White, 1);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_sudden_death_allocation() {
        let mut tm = TimeManager::new();
        // fullmove 1 → 残り50手見積もり, base = 60000/50 + 0.75*1000 = 1950
        tm.init(&sudden_death(60_000, 1_000), Color::White, 1);
        assert_eq!(tm.base(), 1950);
        assert_eq!(tm.soft_limit(), 1170);
        assert_eq!(tm.hard_limit(), 4875);

        // 終盤: fullmove 80 → 残り20手見積もり, base = 10000/20 = 500
        tm.init(&sudden_death(10_000, 0), Color::Black, 80);
        assert_eq!(tm.base(), 500);
        assert_eq!(tm.hard_limit(), 1250);
    }

    #[test]
    fn test_hard_limit_capped_by_max_allowed() {
        let mut tm = TimeManager::new();
        // base = 1000/50 + 0.75*2000 = 1520 > 20% of 1000 = 200
        tm.init(&sudden_death(1_000, 2_000), Color::White, 1);
        assert_eq!(tm.base(), 200);
        assert_eq!(tm.hard_limit(), 200);
    }

    #[test]
    fn test_movestogo_buffer() {
        let mut tm = TimeManager::new();
        let limits = SearchLimits {
            movestogo: Some(1),
            ..sudden_death(5_000, 0)
        };
        tm.init(&limits, Color::White, 30);
        // buffer = 5000/20 = 250 → max = 4750
        assert_eq!(tm.base(), 4750);
        assert_eq!(tm.hard_limit(), 4750);

        let limits = SearchLimits {
            movestogo: Some(1),
            ..sudden_death(100_000, 0)
        };
        tm.init(&limits, Color::White, 30);
        // buffer = 100000/50 = 2000
        assert_eq!(tm.hard_limit(), 98_000);
    }

    #[test]
    fn test_movetime_is_fixed() {
        let mut tm = TimeManager::new();
        tm.init(&SearchLimits::movetime(300), Color::White, 10);
        assert!(tm.is_active());
        assert_eq!(tm.soft_limit(), 300);
        assert_eq!(tm.hard_limit(), 300);
        assert!(!tm.extend());
    }

    #[test]
    fn test_stability_and_early_stop() {
        let mut tm = TimeManager::new();
        tm.init(&sudden_death(60_000, 0), Color::White, 1);
        let m = Move::normal(Square::E2, Square::E4, Piece::W_PAWN, Piece::NONE);
        for i in 0..5 {
            tm.update_iteration(m, Value::new(20 + i));
        }
        assert_eq!(tm.best_stable, 4);
        assert_eq!(tm.score_stable, 4);
        assert!(!tm.stop_early_at(0));
        assert!(tm.stop_early_at(tm.base()));
        assert!(!tm.should_extend());

        let other = Move::normal(Square::D2, Square::D4, Piece::W_PAWN, Piece::NONE);
        tm.update_iteration(other, Value::new(-50));
        assert_eq!(tm.best_stable, 0);
        assert_eq!(tm.score_stable, 0);
        assert!(tm.should_extend());
    }

    #[test]
    fn test_extend_caps_at_hard_limit() {
        let mut tm = TimeManager::new();
        tm.init(&sudden_death(60_000, 0), Color::White, 1);
        // base 1200, soft 720, hard 3000
        assert!(tm.extend());
        assert_eq!(tm.soft_limit(), 1320);
        while tm.extend() {}
        assert_eq!(tm.soft_limit(), tm.hard_limit());
    }
}
