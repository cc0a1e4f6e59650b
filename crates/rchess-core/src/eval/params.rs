//! 評価関数の重み（θ）
//!
//! 重みは機能ファミリーごとにまとめて持ち、`visit` で決まった順序に
//! フラットなベクトル θ と相互変換する。順序と長さは `THETA_LAYOUT` を参照。
//!
//! PSTなど升で引く表はすべて a1=0 の白視点。黒は上下反転した升で引く。

use std::sync::LazyLock;

use super::ModelError;

/// 駒種ごとのモビリティ表の長さ（クイーンの最大移動先数 27 + 1）
pub const MOBILITY_LEN: usize = 28;
/// キング安全度の攻撃ユニット表の長さ
pub const KING_SAFETY_TABLE_LEN: usize = 100;

/// 評価重み
///
/// 駒種インデックスは 0=Pawn .. 5=King。`[i32; 2]` は (MG, EG)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalParams {
    pub pst_mg: [[i32; 64]; 6],
    pub pst_eg: [[i32; 64]; 6],
    pub material_mg: [i32; 6],
    pub material_eg: [i32; 6],
    pub passed_mg: [i32; 64],
    pub passed_eg: [i32; 64],
    /// 候補パスポーンに与える、捕獲先升のパスポーン値に対する割合（%）
    pub candidate_passer_pct: i32,

    pub doubled: [i32; 2],
    pub isolated: [i32; 2],
    pub connected: [i32; 2],
    pub phalanx: [i32; 2],
    pub blocked: [i32; 2],
    pub lever: [i32; 2],
    pub weak_lever: [i32; 2],
    pub backward: [i32; 2],

    pub mobility_mg: [[i32; MOBILITY_LEN]; 6],
    pub mobility_eg: [[i32; MOBILITY_LEN]; 6],
    /// 中央の閉鎖度によるMGモビリティ補正
    /// [閉鎖時のdelta(%), 開放時のdelta(%), ナイトの重み(%), ビショップの重み(%)]
    pub center_mobility: [i32; 4],

    /// 玉の内周に利く駒1枚あたりの攻撃ユニット（駒種別）
    pub king_attack_inner: [i32; 6],
    /// 玉の外周に利く駒1枚あたりの攻撃ユニット（駒種別）
    pub king_attack_outer: [i32; 6],
    pub king_safety_table: [i32; KING_SAFETY_TABLE_LEN],
    /// 攻撃ユニットの補正
    /// [開いた筋, 半開きの筋, 内周の守備マイナー駒, 守備ポーン（最大3）]
    pub king_ring_correlates: [i32; 4],

    /// 終盤の玉 [中央化ペナルティ, 追い詰め（相手玉の中央距離）, 追い詰め（玉同士の接近）]
    pub endgame_king: [i32; 3],
    pub knight_tropism: [i32; 2],

    /// ポーンストーム: 攻め手側から見た段ごとの基本値
    pub storm_rank_base: [i32; 8],
    /// ポーンストーム: 分類ごとの割合（%）[free, lever, weak lever, blocked]
    pub storm_category_pct: [i32; 4],
    /// 自玉の近く（距離2以内）にいる敵ポーン1枚あたりのペナルティ
    pub storm_proximity: i32,
    /// 敵の利きがあり自駒（玉以外）が守っていない玉周り升1つあたりのペナルティ
    pub weak_king_ring: i32,

    pub rook_semi_open: [i32; 2],
    pub rook_open: [i32; 2],
    pub rook_seventh_eg: i32,
    pub rook_seventh_pair_eg: i32,
    pub queen_center_eg: i32,
    pub knight_outpost: [i32; 2],
    pub bishop_outpost: [i32; 2],
    pub stacked_rooks: [i32; 2],
    pub bishop_pair: [i32; 2],
    pub bad_bishop: [i32; 2],
    /// 基準ポーン数からの差 × マイナー駒数 [ナイト, ビショップ]
    pub imbalance: [i32; 2],
    pub space: i32,
    pub tempo: i32,
}

// 見た目どおり8段目を上に書いた表（読み込み時に a1=0 へ並べ替える）
#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    80, 80, 80, 80, 80, 80, 80, 80,
    50, 50, 50, 50, 50, 50, 50, 50,
    30, 30, 30, 30, 30, 30, 30, 30,
    20, 20, 20, 20, 20, 20, 20, 20,
    10, 10, 10, 10, 10, 10, 10, 10,
    10, 10, 10, 10, 10, 10, 10, 10,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  5,  5,  5,  5,  5,  0,-10,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -10,-20,-20,-20,-20,-20,-20,-10,
    20, 20,  0,  0,  0,  0, 20, 20,
    20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
   -50,-40,-30,-20,-20,-30,-40,-50,
   -30,-20,-10,  0,  0,-10,-20,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-30,  0,  0,  0,  0,-30,-30,
   -50,-30,-30,-30,-30,-30,-30,-50,
];

/// 見た目の並び（8段目が先頭）を a1=0 の並びに変換
fn from_visual(t: &[i32; 64]) -> [i32; 64] {
    std::array::from_fn(|sq| t[sq ^ 56])
}

/// 段ごとの値を全筋に広げる
fn by_rank(ranks: [i32; 8]) -> [i32; 64] {
    std::array::from_fn(|sq| ranks[sq >> 3])
}

/// 移動先数 n に対する線形モビリティ（上限 `cap` 以降は頭打ち）
fn linear_mobility(base: i32, step: i32, cap: usize) -> [i32; MOBILITY_LEN] {
    std::array::from_fn(|n| base + step * n.min(cap) as i32)
}

impl Default for EvalParams {
    fn default() -> Self {
        let mut mobility_mg = [[0; MOBILITY_LEN]; 6];
        let mut mobility_eg = [[0; MOBILITY_LEN]; 6];
        mobility_mg[1] = linear_mobility(-20, 5, 8);
        mobility_eg[1] = linear_mobility(-25, 6, 8);
        mobility_mg[2] = linear_mobility(-20, 4, 13);
        mobility_eg[2] = linear_mobility(-30, 5, 13);
        mobility_mg[3] = linear_mobility(-10, 2, 14);
        mobility_eg[3] = linear_mobility(-25, 5, 14);
        mobility_mg[4] = linear_mobility(-10, 1, 27);
        mobility_eg[4] = linear_mobility(-20, 2, 27);

        EvalParams {
            pst_mg: [
                from_visual(&PAWN_MG),
                from_visual(&KNIGHT),
                from_visual(&BISHOP),
                from_visual(&ROOK),
                from_visual(&QUEEN),
                from_visual(&KING_MG),
            ],
            pst_eg: [
                from_visual(&PAWN_EG),
                from_visual(&KNIGHT),
                from_visual(&BISHOP),
                from_visual(&ROOK),
                from_visual(&QUEEN),
                from_visual(&KING_EG),
            ],
            material_mg: [82, 337, 365, 477, 1025, 0],
            material_eg: [94, 281, 297, 512, 936, 0],
            passed_mg: by_rank([0, 5, 10, 15, 25, 40, 60, 0]),
            passed_eg: by_rank([0, 10, 15, 25, 45, 75, 120, 0]),
            candidate_passer_pct: 35,

            doubled: [-10, -20],
            isolated: [-10, -15],
            connected: [8, 10],
            phalanx: [6, 8],
            blocked: [-5, -12],
            lever: [3, 2],
            weak_lever: [-8, -10],
            backward: [-8, -6],

            mobility_mg,
            mobility_eg,
            center_mobility: [20, 20, 100, -100],

            king_attack_inner: [0, 2, 2, 3, 5, 0],
            king_attack_outer: [0, 1, 1, 1, 2, 0],
            king_safety_table: std::array::from_fn(|i| ((i * i) as i32 / 4).min(500)),
            king_ring_correlates: [3, 2, 1, 1],

            endgame_king: [5, 10, 4],
            knight_tropism: [3, 1],

            storm_rank_base: [0, 0, 0, 10, 20, 30, 15, 0],
            storm_category_pct: [100, 120, 150, 40],
            storm_proximity: 6,
            weak_king_ring: 8,

            rook_semi_open: [10, 5],
            rook_open: [25, 10],
            rook_seventh_eg: 20,
            rook_seventh_pair_eg: 15,
            queen_center_eg: 10,
            knight_outpost: [20, 10],
            bishop_outpost: [12, 6],
            stacked_rooks: [10, 5],
            bishop_pair: [30, 50],
            bad_bishop: [-3, -5],
            imbalance: [4, -2],
            space: 2,
            tempo: 10,
        }
    }
}

impl EvalParams {
    /// 各重みグループを θ の順序で列挙する
    pub fn visit(&self, mut f: impl FnMut(&'static str, &[i32])) {
        let mut copy = self.clone();
        copy.visit_mut(|name, slice| f(name, slice));
    }

    /// 各重みグループを θ の順序で可変参照として列挙する
    pub fn visit_mut(&mut self, mut f: impl FnMut(&'static str, &mut [i32])) {
        f("pst_mg", self.pst_mg.as_flattened_mut());
        f("pst_eg", self.pst_eg.as_flattened_mut());
        f("material_mg", &mut self.material_mg);
        f("material_eg", &mut self.material_eg);
        f("passed_mg", &mut self.passed_mg);
        f("passed_eg", &mut self.passed_eg);
        f("candidate_passer_pct", std::slice::from_mut(&mut self.candidate_passer_pct));
        f("doubled", &mut self.doubled);
        f("isolated", &mut self.isolated);
        f("connected", &mut self.connected);
        f("phalanx", &mut self.phalanx);
        f("blocked", &mut self.blocked);
        f("lever", &mut self.lever);
        f("weak_lever", &mut self.weak_lever);
        f("backward", &mut self.backward);
        f("mobility_mg", self.mobility_mg.as_flattened_mut());
        f("mobility_eg", self.mobility_eg.as_flattened_mut());
        f("center_mobility", &mut self.center_mobility);
        f("king_attack_inner", &mut self.king_attack_inner);
        f("king_attack_outer", &mut self.king_attack_outer);
        f("king_safety_table", &mut self.king_safety_table);
        f("king_ring_correlates", &mut self.king_ring_correlates);
        f("endgame_king", &mut self.endgame_king);
        f("knight_tropism", &mut self.knight_tropism);
        f("storm_rank_base", &mut self.storm_rank_base);
        f("storm_category_pct", &mut self.storm_category_pct);
        f("storm_proximity", std::slice::from_mut(&mut self.storm_proximity));
        f("weak_king_ring", std::slice::from_mut(&mut self.weak_king_ring));
        f("rook_semi_open", &mut self.rook_semi_open);
        f("rook_open", &mut self.rook_open);
        f("rook_seventh_eg", std::slice::from_mut(&mut self.rook_seventh_eg));
        f("rook_seventh_pair_eg", std::slice::from_mut(&mut self.rook_seventh_pair_eg));
        f("queen_center_eg", std::slice::from_mut(&mut self.queen_center_eg));
        f("knight_outpost", &mut self.knight_outpost);
        f("bishop_outpost", &mut self.bishop_outpost);
        f("stacked_rooks", &mut self.stacked_rooks);
        f("bishop_pair", &mut self.bishop_pair);
        f("bad_bishop", &mut self.bad_bishop);
        f("imbalance", &mut self.imbalance);
        f("space", std::slice::from_mut(&mut self.space));
        f("tempo", std::slice::from_mut(&mut self.tempo));
    }

    /// θ の長さ
    pub fn theta_len() -> usize {
        THETA_LAYOUT.iter().map(|&(_, len)| len).sum()
    }

    /// フラットな重みベクトルへ変換
    pub fn to_theta(&self) -> Vec<i32> {
        let mut theta = Vec::with_capacity(Self::theta_len());
        self.visit(|_, slice| theta.extend_from_slice(slice));
        theta
    }

    /// フラットな重みベクトルから生成
    pub fn from_theta(theta: &[i32]) -> Result<EvalParams, ModelError> {
        let expected = Self::theta_len();
        if theta.len() != expected {
            return Err(ModelError::Length {
                group: "theta",
                expected,
                found: theta.len(),
            });
        }
        let mut params = EvalParams::default();
        let mut offset = 0;
        params.visit_mut(|_, slice| {
            slice.copy_from_slice(&theta[offset..offset + slice.len()]);
            offset += slice.len();
        });
        params.sanitize();
        Ok(params)
    }

    /// 不変条件を満たすよう重みを補正する
    ///
    /// ポーン・キングのモビリティは常に0、割合系は負にしない。
    pub fn sanitize(&mut self) {
        for table in [&mut self.mobility_mg, &mut self.mobility_eg] {
            table[0] = [0; MOBILITY_LEN];
            table[5] = [0; MOBILITY_LEN];
        }
        self.candidate_passer_pct = self.candidate_passer_pct.clamp(0, 100);
        for pct in &mut self.storm_category_pct {
            *pct = (*pct).max(0);
        }
    }
}

/// θ のレイアウト（グループ名, 長さ）
pub static THETA_LAYOUT: LazyLock<Vec<(&'static str, usize)>> = LazyLock::new(|| {
    let mut layout = Vec::new();
    EvalParams::default().visit(|name, slice| layout.push((name, slice.len())));
    layout
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theta_roundtrip_and_layout() {
        let params = EvalParams::default();
        let theta = params.to_theta();
        assert_eq!(theta.len(), EvalParams::theta_len());
        assert_eq!(EvalParams::from_theta(&theta).unwrap(), params);
        assert_eq!(THETA_LAYOUT[0], ("pst_mg", 384));
        assert!(THETA_LAYOUT.iter().any(|&(n, l)| n == "king_safety_table" && l == 100));
    }

    #[test]
    fn test_from_theta_rejects_wrong_length() {
        assert!(matches!(
            EvalParams::from_theta(&[1, 2, 3]),
            Err(ModelError::Length { .. })
        ));
    }

    #[test]
    fn test_sanitize_zeroes_pawn_and_king_mobility() {
        let mut theta = EvalParams::default().to_theta();
        for v in theta.iter_mut() {
            *v = 7;
        }
        let params = EvalParams::from_theta(&theta).unwrap();
        assert!(params.mobility_mg[0].iter().all(|&v| v == 0));
        assert!(params.mobility_eg[5].iter().all(|&v| v == 0));
        assert_eq!(params.mobility_mg[1][3], 7);
    }

    #[test]
    fn test_default_tables_orientation() {
        let p = EvalParams::default();
        // e2の白ポーンは中央の前進を促すため負、e4は正
        assert_eq!(p.pst_mg[0][12], -20);
        assert_eq!(p.pst_mg[0][28], 20);
        // g1の玉は安全
        assert_eq!(p.pst_mg[5][6], 30);
        assert_eq!(p.passed_eg[48], 120);
    }
}
