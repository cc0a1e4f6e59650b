//! 探索パラメータ
//!
//! UCI `setoption` で更新できる枝刈り係数を集約する。

use crate::types::Depth;

/// 1つの探索パラメータのUCI定義。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptionSpec {
    /// UCI option 名
    pub uci_name: &'static str,
    /// デフォルト値
    pub default: i32,
    /// 最小値（inclusive）
    pub min: i32,
    /// 最大値（inclusive）
    pub max: i32,
}

/// `setoption` で1項目を適用した結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSetResult {
    /// 反映後の値（必要なら clamp 後）
    pub applied: i32,
    /// 入力値が範囲外で clamp されたか
    pub clamped: bool,
    /// 最小値（inclusive）
    pub min: i32,
    /// 最大値（inclusive）
    pub max: i32,
}

/// 探索係数の集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Futility: 残り深さ1のマージン
    pub futility_margin_depth1: i32,
    /// Futility: 残り深さ2のマージン
    pub futility_margin_depth2: i32,

    /// Razoring: 残り深さ1のマージン（3倍して使う）
    pub razor_margin_depth1: i32,
    /// Razoring: 残り深さ2のマージン（3倍して使う）
    pub razor_margin_depth2: i32,
    /// Razoring: 残り深さ3のマージン
    pub razor_margin_depth3: i32,

    /// LMP: 残り深さごとの着手数しきい値
    pub lmp_depth1: i32,
    pub lmp_depth2: i32,
    pub lmp_depth3: i32,
    pub lmp_depth4: i32,
    pub lmp_depth5_plus: i32,
    /// LMP: 適用する最大の残り深さ（0 で無効）
    pub lmp_max_depth: i32,

    /// LMR: 適用する最小の残り深さ
    pub lmr_depth_limit: i32,
    /// NMP: 適用する最小の残り深さ
    pub null_move_min_depth: i32,

    /// Aspiration window の初期幅
    pub aspiration_window: i32,
}

const OPTION_SPECS: &[SearchOptionSpec] = &[
    SearchOptionSpec {
        uci_name: "FutilityMarginDepth1",
        default: 200,
        min: 0,
        max: 2000,
    },
    SearchOptionSpec {
        uci_name: "FutilityMarginDepth2",
        default: 300,
        min: 0,
        max: 2000,
    },
    SearchOptionSpec {
        uci_name: "RazorMarginDepth1",
        default: 100,
        min: 0,
        max: 2000,
    },
    SearchOptionSpec {
        uci_name: "RazorMarginDepth2",
        default: 150,
        min: 0,
        max: 2000,
    },
    SearchOptionSpec {
        uci_name: "RazorMarginDepth3",
        default: 200,
        min: 0,
        max: 2000,
    },
    SearchOptionSpec {
        uci_name: "LMPDepth1",
        default: 5,
        min: 1,
        max: 256,
    },
    SearchOptionSpec {
        uci_name: "LMPDepth2",
        default: 9,
        min: 1,
        max: 256,
    },
    SearchOptionSpec {
        uci_name: "LMPDepth3",
        default: 14,
        min: 1,
        max: 256,
    },
    SearchOptionSpec {
        uci_name: "LMPDepth4",
        default: 20,
        min: 1,
        max: 256,
    },
    SearchOptionSpec {
        uci_name: "LMPDepth5Plus",
        default: 28,
        min: 1,
        max: 256,
    },
    SearchOptionSpec {
        uci_name: "LMPMaxDepth",
        default: 3,
        min: 0,
        max: 64,
    },
    SearchOptionSpec {
        uci_name: "LMRDepthLimit",
        default: 3,
        min: 1,
        max: 64,
    },
    SearchOptionSpec {
        uci_name: "NullMoveMinDepth",
        default: 3,
        min: 1,
        max: 64,
    },
];

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            futility_margin_depth1: 200,
            futility_margin_depth2: 300,
            razor_margin_depth1: 100,
            razor_margin_depth2: 150,
            razor_margin_depth3: 200,
            lmp_depth1: 5,
            lmp_depth2: 9,
            lmp_depth3: 14,
            lmp_depth4: 20,
            lmp_depth5_plus: 28,
            lmp_max_depth: 3,
            lmr_depth_limit: 3,
            null_move_min_depth: 3,
            aspiration_window: 30,
        }
    }
}

impl SearchParams {
    /// UCIに公開する option 定義を返す。
    pub fn option_specs() -> &'static [SearchOptionSpec] {
        OPTION_SPECS
    }

    /// UCI option 名と値を受け取り、対応する項目を更新する。
    ///
    /// 不明な option 名の場合は `None` を返す。
    pub fn set_from_uci_name(&mut self, name: &str, value: i32) -> Option<SearchSetResult> {
        fn apply(dst: &mut i32, value: i32, min: i32, max: i32) -> SearchSetResult {
            let applied = value.clamp(min, max);
            *dst = applied;
            SearchSetResult {
                applied,
                clamped: applied != value,
                min,
                max,
            }
        }

        let spec = OPTION_SPECS.iter().find(|s| s.uci_name.eq_ignore_ascii_case(name))?;
        let dst = match spec.uci_name {
            "FutilityMarginDepth1" => &mut self.futility_margin_depth1,
            "FutilityMarginDepth2" => &mut self.futility_margin_depth2,
            "RazorMarginDepth1" => &mut self.razor_margin_depth1,
            "RazorMarginDepth2" => &mut self.razor_margin_depth2,
            "RazorMarginDepth3" => &mut self.razor_margin_depth3,
            "LMPDepth1" => &mut self.lmp_depth1,
            "LMPDepth2" => &mut self.lmp_depth2,
            "LMPDepth3" => &mut self.lmp_depth3,
            "LMPDepth4" => &mut self.lmp_depth4,
            "LMPDepth5Plus" => &mut self.lmp_depth5_plus,
            "LMPMaxDepth" => &mut self.lmp_max_depth,
            "LMRDepthLimit" => &mut self.lmr_depth_limit,
            "NullMoveMinDepth" => &mut self.null_move_min_depth,
            _ => return None,
        };
        Some(apply(dst, value, spec.min, spec.max))
    }

    /// Futility マージン（対象外の深さなら `None`）
    #[inline]
    pub fn futility_margin(&self, depth: Depth) -> Option<i32> {
        match depth {
            1 => Some(self.futility_margin_depth1),
            2 => Some(self.futility_margin_depth2),
            _ => None,
        }
    }

    /// Razoring マージン（対象外の深さなら `None`）
    #[inline]
    pub fn razor_margin(&self, depth: Depth) -> Option<i32> {
        match depth {
            1 => Some(self.razor_margin_depth1),
            2 => Some(self.razor_margin_depth2),
            3 => Some(self.razor_margin_depth3),
            _ => None,
        }
    }

    /// LMP しきい値（`lmp_max_depth` を超える深さなら `None`）
    #[inline]
    pub fn lmp_threshold(&self, depth: Depth) -> Option<i32> {
        if depth > self.lmp_max_depth {
            return None;
        }
        Some(match depth {
            ..=1 => self.lmp_depth1,
            2 => self.lmp_depth2,
            3 => self.lmp_depth3,
            4 => self.lmp_depth4,
            _ => self.lmp_depth5_plus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_specs() {
        let defaults = SearchParams::default();
        for spec in SearchParams::option_specs() {
            let mut params = defaults;
            let res = params.set_from_uci_name(spec.uci_name, spec.default).expect("spec must be mappable");
            assert_eq!(res.applied, spec.default);
            assert_eq!(params, defaults, "{} default differs", spec.uci_name);
        }
    }

    #[test]
    fn clamp_is_reported() {
        let mut params = SearchParams::default();
        let res = params.set_from_uci_name("NullMoveMinDepth", 0).expect("known name");
        assert!(res.clamped);
        assert_eq!(res.applied, 1);
        assert_eq!(params.null_move_min_depth, 1);
    }

    #[test]
    fn option_names_are_case_insensitive() {
        let mut params = SearchParams::default();
        assert!(params.set_from_uci_name("lmpdepth3", 7).is_some());
        assert_eq!(params.lmp_threshold(3), Some(7));
        assert!(params.set_from_uci_name("Hash", 16).is_none());
    }

    #[test]
    fn all_specs_support_min_max_clamp() {
        let defaults = SearchParams::default();
        for spec in SearchParams::option_specs() {
            let mut params = defaults;
            let low = params.set_from_uci_name(spec.uci_name, spec.min - 1).expect("spec must be mappable");
            assert_eq!(low.applied, spec.min);
            assert!(low.clamped);

            let high = params.set_from_uci_name(spec.uci_name, spec.max + 1).expect("spec must be mappable");
            assert_eq!(high.applied, spec.max);
            assert!(high.clamped);
        }
    }

    #[test]
    fn margins_by_depth() {
        let params = SearchParams::default();
        assert_eq!(params.futility_margin(1), Some(200));
        assert_eq!(params.futility_margin(3), None);
        assert_eq!(params.razor_margin(3), Some(200));
        assert_eq!(params.lmp_threshold(3), Some(14));
        assert_eq!(params.lmp_threshold(4), None);
    }

    #[test]
    fn deeper_lmp_thresholds_follow_max_depth() {
        let mut params = SearchParams::default();
        params.set_from_uci_name("LMPDepth4", 11).expect("known name");
        params.set_from_uci_name("LMPDepth5Plus", 17).expect("known name");
        assert_eq!(params.lmp_threshold(4), None);

        params.set_from_uci_name("LMPMaxDepth", 8).expect("known name");
        assert_eq!(params.lmp_threshold(4), Some(11));
        assert_eq!(params.lmp_threshold(8), Some(17));
        assert_eq!(params.lmp_threshold(9), None);

        params.set_from_uci_name("LMPMaxDepth", 0).expect("known name");
        assert_eq!(params.lmp_threshold(1), None);
    }
}
