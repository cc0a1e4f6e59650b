//! 探索統計（search-stats feature有効時のみ）
//!
//! 枝刈りの発生回数を記録し、パラメータ調整やデバッグに使用する。

/// 深度別統計の最大深度
#[cfg(feature = "search-stats")]
pub(super) const STATS_MAX_DEPTH: usize = 32;

/// 探索統計カウンタ
#[cfg(feature = "search-stats")]
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// 総ノード数（alphabeta呼び出し回数）
    pub nodes_searched: u64,
    /// 静止探索ノード数
    pub qnodes: u64,
    /// TTカットオフ回数
    pub tt_cutoff: u64,
    /// Razoring適用回数
    pub razoring_applied: u64,
    /// Reverse futility（静的null move）適用回数
    pub reverse_futility: u64,
    /// NMP試行回数
    pub nmp_attempted: u64,
    /// NMPによる枝刈り成功回数
    pub nmp_cutoff: u64,
    /// IID実行回数
    pub iid_searches: u64,
    /// LMPによる枝刈り回数
    pub lmp_pruned: u64,
    /// Futility Pruning回数
    pub futility_pruned: u64,
    /// LMR適用回数
    pub lmr_applied: u64,
    /// LMRによる再探索回数
    pub lmr_research: u64,
    /// 深度別ノード数
    pub nodes_by_depth: [u64; STATS_MAX_DEPTH],
    /// 深度別カットオフ回数
    pub cutoff_by_depth: [u64; STATS_MAX_DEPTH],
    /// 深度別first move cutoff回数（Move Ordering品質）
    pub first_move_cutoff_by_depth: [u64; STATS_MAX_DEPTH],
}

#[cfg(feature = "search-stats")]
impl SearchStats {
    /// 統計をリセット
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 統計をフォーマットして文字列として返す
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Search Statistics ===\n");
        report.push_str(&format!("Nodes searched:      {:>12}\n", self.nodes_searched));
        report.push_str(&format!("QSearch nodes:       {:>12}\n", self.qnodes));
        report.push_str(&format!("TT cutoffs:          {:>12}\n", self.tt_cutoff));
        report.push_str("--- Pre-Move Pruning ---\n");
        report.push_str(&format!("Razoring:            {:>12}\n", self.razoring_applied));
        report.push_str(&format!("Reverse futility:    {:>12}\n", self.reverse_futility));
        report.push_str(&format!("NMP attempted:       {:>12}\n", self.nmp_attempted));
        report.push_str(&format!("NMP cutoffs:         {:>12}\n", self.nmp_cutoff));
        report.push_str(&format!("IID searches:        {:>12}\n", self.iid_searches));
        report.push_str("--- Move Loop ---\n");
        report.push_str(&format!("LMP pruned:          {:>12}\n", self.lmp_pruned));
        report.push_str(&format!("Futility pruned:     {:>12}\n", self.futility_pruned));
        report.push_str(&format!("LMR applied:         {:>12}\n", self.lmr_applied));
        report.push_str(&format!("LMR re-search:       {:>12}\n", self.lmr_research));
        report.push_str("--- Nodes by Depth ---\n");
        for (d, &count) in self.nodes_by_depth.iter().enumerate() {
            if count > 0 {
                report.push_str(&format!("  depth {:>2}: {:>10} nodes\n", d, count));
            }
        }
        report.push_str("--- Move Ordering Quality (First Move Cutoff Rate) ---\n");
        for d in 0..STATS_MAX_DEPTH {
            let first_cut = self.first_move_cutoff_by_depth[d];
            let total_cut = self.cutoff_by_depth[d];
            if total_cut > 0 {
                let rate = first_cut as f64 / total_cut as f64 * 100.0;
                report.push_str(&format!(
                    "  depth {:>2}: {:>6}/{:>6} ({:>5.1}%)\n",
                    d, first_cut, total_cut, rate
                ));
            }
        }
        report
    }
}

// =============================================================================
// 統計マクロ
// =============================================================================

/// 統計カウンタをインクリメントするマクロ（feature有効時のみ実行）
/// SearchWorker から呼び出される（self.stats へアクセス）
#[cfg(feature = "search-stats")]
macro_rules! inc_stat {
    ($self:expr, $field:ident) => {
        $self.stats.$field += 1;
    };
}

#[cfg(not(feature = "search-stats"))]
macro_rules! inc_stat {
    ($self:expr, $field:ident) => {};
}

/// 深度別統計をカウントするマクロ（feature有効時のみ実行）
#[cfg(feature = "search-stats")]
macro_rules! inc_stat_by_depth {
    ($self:expr, $field:ident, $depth:expr) => {
        let d = ($depth.max(0) as usize).min($crate::search::stats::STATS_MAX_DEPTH - 1);
        $self.stats.$field[d] += 1;
    };
}

#[cfg(not(feature = "search-stats"))]
macro_rules! inc_stat_by_depth {
    ($self:expr, $field:ident, $depth:expr) => {};
}

// マクロを search モジュール内で使えるようにする
pub(super) use inc_stat;
pub(super) use inc_stat_by_depth;
