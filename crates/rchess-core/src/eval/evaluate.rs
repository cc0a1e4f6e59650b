//! 評価本体
//!
//! 各特徴量は手番ごとに (MG, EG) を積み上げ、白 − 黒 をフェーズで補間する。

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::bitboard::{
    Bitboard, DARK_SQUARES, FILE_BB, LIGHT_SQUARES, RANK_BB, adjacent_files, bishop_attacks, king_attacks,
    knight_attacks, passed_pawn_mask, pawn_attacks, pawn_attacks_bb, queen_attacks, rook_attacks,
};
use crate::position::Position;
use crate::types::{Color, PieceType, Square, Value};

use super::params::{EvalParams, MOBILITY_LEN};
use super::{king, pawns};

/// フェーズの最大値（N,B=1, R=2, Q=4 の初期配置合計）
pub const TOTAL_PHASE: i32 = 24;
/// 評価値の上限（詰みスコアと重ならない範囲）
pub const EVAL_LIMIT: i32 = 20000;
/// キング安全度ペナルティをEGに適用するときの除数
pub const KING_SAFETY_EG_DIVISOR: i32 = 4;

/// 駒割りの偏りを測る基準ポーン数
const IMBALANCE_REF_PAWNS: i32 = 5;
/// このフェーズ以上でスペース評価を行う
const SPACE_PHASE_GATE: i32 = 12;

const CENTER_FILES: Bitboard = Bitboard::new(FILE_BB[3].bits() | FILE_BB[4].bits());
const CENTER4: Bitboard = Bitboard::new(
    (1 << Square::D4.index()) | (1 << Square::E4.index()) | (1 << Square::D5.index()) | (1 << Square::E5.index()),
);
/// 白のスペース領域（c..f筋の2..4段）
const SPACE_ZONE_WHITE: Bitboard = Bitboard::new(
    (FILE_BB[2].bits() | FILE_BB[3].bits() | FILE_BB[4].bits() | FILE_BB[5].bits())
        & (RANK_BB[1].bits() | RANK_BB[2].bits() | RANK_BB[3].bits()),
);
const SPACE_ZONE_BLACK: Bitboard = Bitboard::new(SPACE_ZONE_WHITE.bits().swap_bytes());

// ============================================================================
// Score
// ============================================================================

/// (MG, EG) の組
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Score {
    pub mg: i32,
    pub eg: i32,
}

impl Score {
    #[inline]
    pub const fn new(mg: i32, eg: i32) -> Score {
        Score { mg, eg }
    }

    /// (MG, EG) 重みの `n` 倍
    #[inline]
    pub const fn weighted(w: [i32; 2], n: i32) -> Score {
        Score::new(w[0] * n, w[1] * n)
    }
}

impl Add for Score {
    type Output = Score;
    fn add(self, rhs: Score) -> Score {
        Score::new(self.mg + rhs.mg, self.eg + rhs.eg)
    }
}

impl Sub for Score {
    type Output = Score;
    fn sub(self, rhs: Score) -> Score {
        Score::new(self.mg - rhs.mg, self.eg - rhs.eg)
    }
}

impl Neg for Score {
    type Output = Score;
    fn neg(self) -> Score {
        Score::new(-self.mg, -self.eg)
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        *self = *self + rhs;
    }
}

impl SubAssign for Score {
    fn sub_assign(&mut self, rhs: Score) {
        *self = *self - rhs;
    }
}

// ============================================================================
// Scratch
// ============================================================================

/// 1回の評価の間だけ使う作業領域
pub(super) struct EvalScratch {
    pub pawns: [Bitboard; Color::NUM],
    pub pawn_attacks: [Bitboard; Color::NUM],
    /// 玉以外の全駒の利き（ポーン含む）
    pub attacks: [Bitboard; Color::NUM],
    /// 玉の周囲8升
    pub king_inner: [Bitboard; Color::NUM],
    /// 玉から距離2の升
    pub king_outer: [Bitboard; Color::NUM],
    /// その手番の玉に向けられた攻撃ユニット
    pub king_attack_units: [i32; Color::NUM],
    pub phase: i32,
    /// 中央の閉鎖度によるナイト/ビショップのMGモビリティ倍率（%）
    pub knight_scale: i32,
    pub bishop_scale: i32,
}

impl EvalScratch {
    pub(super) fn new(pos: &Position, params: &EvalParams) -> Self {
        let pawns = [pos.pieces(Color::White, PieceType::Pawn), pos.pieces(Color::Black, PieceType::Pawn)];
        let pawn_attacks = [
            pawn_attacks_bb(Color::White, pawns[0]),
            pawn_attacks_bb(Color::Black, pawns[1]),
        ];

        let mut king_inner = [Bitboard::EMPTY; Color::NUM];
        let mut king_outer = [Bitboard::EMPTY; Color::NUM];
        for color in Color::ALL {
            let ksq = pos.king_square(color);
            if ksq.is_none() {
                continue;
            }
            let inner = king_attacks(ksq);
            let reach = inner.iter().fold(inner, |acc, sq| acc | king_attacks(sq));
            king_inner[color.index()] = inner;
            king_outer[color.index()] = reach & !inner & !Bitboard::from_square(ksq);
        }

        let delta = center_delta(pawns, pawn_attacks, params);
        EvalScratch {
            pawns,
            pawn_attacks,
            attacks: pawn_attacks,
            king_inner,
            king_outer,
            king_attack_units: [0; Color::NUM],
            phase: game_phase(pos),
            knight_scale: 100 + delta * params.center_mobility[2] / 100,
            bishop_scale: 100 + delta * params.center_mobility[3] / 100,
        }
    }
}

/// 中央の閉鎖度（%）。閉鎖なら正、開放筋があれば負
fn center_delta(pawns: [Bitboard; 2], pawn_attacks: [Bitboard; 2], params: &EvalParams) -> i32 {
    let [white, black] = pawns;
    let facing = white.forward(Color::White) & black & CENTER_FILES;
    let levers = ((pawn_attacks[0] & black) | (pawn_attacks[1] & white)) & CENTER_FILES;
    let open_files = [FILE_BB[3], FILE_BB[4]]
        .into_iter()
        .filter(|&file| (file & (white | black)).is_empty())
        .count() as i32;

    if facing.is_not_empty() && levers.is_empty() && open_files == 0 {
        params.center_mobility[0]
    } else {
        -(params.center_mobility[1] * open_files / 2)
    }
}

/// ゲームフェーズ（0 = 終盤, `TOTAL_PHASE` = 中盤）
pub fn game_phase(pos: &Position) -> i32 {
    let phase: i32 = [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen]
        .into_iter()
        .map(|pt| pos.pieces_by_type(pt).count() as i32 * pt.phase_weight())
        .sum();
    phase.min(TOTAL_PHASE)
}

// ============================================================================
// 評価
// ============================================================================

/// 白視点の評価値（センチポーン）
pub fn evaluate_white(pos: &Position, params: &EvalParams) -> i32 {
    let mut scratch = EvalScratch::new(pos, params);

    let mut score = Score::default();
    for color in Color::ALL {
        let side = material_and_psqt(pos, params, color)
            + pieces(pos, params, &mut scratch, color)
            + pawns::evaluate(params, &scratch, color);
        score += if color == Color::White { side } else { -side };
    }
    // 利きと攻撃ユニットが揃ってから玉周りを評価する
    for color in Color::ALL {
        let side = king::evaluate(pos, params, &scratch, color);
        score += if color == Color::White { side } else { -side };
    }
    score += king::endgame(pos, params, &scratch);

    let tempo = params.tempo * pos.side_to_move().sign();
    score += Score::new(tempo, tempo);

    let phase = scratch.phase;
    let tapered = (score.mg * phase + score.eg * (TOTAL_PHASE - phase)) / TOTAL_PHASE;
    tapered.clamp(-EVAL_LIMIT, EVAL_LIMIT)
}

/// 手番視点の評価値
pub fn evaluate(pos: &Position, params: &EvalParams) -> Value {
    Value::new(evaluate_white(pos, params) * pos.side_to_move().sign())
}

fn material_and_psqt(pos: &Position, params: &EvalParams, us: Color) -> Score {
    let mut score = Score::default();
    for pt in PieceType::ALL {
        let pi = pt.index() - 1;
        for sq in pos.pieces(us, pt) {
            let psq = sq.relative(us).index();
            score += Score::new(
                params.material_mg[pi] + params.pst_mg[pi][psq],
                params.material_eg[pi] + params.pst_eg[pi][psq],
            );
        }
    }
    score
}

/// マイナー駒・大駒の評価（モビリティ、配置、駒割り）
///
/// 自駒の利きと相手玉への攻撃ユニットを `scratch` に記録する。
fn pieces(pos: &Position, params: &EvalParams, scratch: &mut EvalScratch, us: Color) -> Score {
    let them = us.opponent();
    let occ = pos.occupied();
    let own_pawns = scratch.pawns[us.index()];
    let enemy_pawns = scratch.pawns[them.index()];
    let area = !pos.occupancy(us) & !scratch.pawn_attacks[them.index()];
    let enemy_king = pos.king_square(them);

    let mut score = Score::default();
    for pt in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        let pi = pt.index() - 1;
        for sq in pos.pieces(us, pt) {
            let attacks = match pt {
                PieceType::Knight => knight_attacks(sq),
                PieceType::Bishop => bishop_attacks(sq, occ),
                PieceType::Rook => rook_attacks(sq, occ),
                _ => queen_attacks(sq, occ),
            };
            scratch.attacks[us.index()] |= attacks;

            let n = ((attacks & area).count() as usize).min(MOBILITY_LEN - 1);
            let mut mg = params.mobility_mg[pi][n];
            match pt {
                PieceType::Knight => mg = mg * scratch.knight_scale / 100,
                PieceType::Bishop => mg = mg * scratch.bishop_scale / 100,
                _ => {}
            }
            score += Score::new(mg, params.mobility_eg[pi][n]);

            if (attacks & scratch.king_inner[them.index()]).is_not_empty() {
                scratch.king_attack_units[them.index()] += params.king_attack_inner[pi];
            }
            if (attacks & scratch.king_outer[them.index()]).is_not_empty() {
                scratch.king_attack_units[them.index()] += params.king_attack_outer[pi];
            }
        }
    }

    // ポーンによる玉への攻撃
    for sq in own_pawns {
        let attacks = pawn_attacks(us, sq);
        if (attacks & scratch.king_inner[them.index()]).is_not_empty() {
            scratch.king_attack_units[them.index()] += params.king_attack_inner[0];
        }
        if (attacks & scratch.king_outer[them.index()]).is_not_empty() {
            scratch.king_attack_units[them.index()] += params.king_attack_outer[0];
        }
    }

    let is_outpost = |sq: Square| {
        (3..=5).contains(&sq.relative_rank(us))
            && (pawn_attacks(them, sq) & own_pawns).is_not_empty()
            && (passed_pawn_mask(us, sq) & adjacent_files(sq.file()) & enemy_pawns).is_empty()
    };

    let knights = pos.pieces(us, PieceType::Knight);
    for sq in knights {
        if is_outpost(sq) {
            score += Score::weighted(params.knight_outpost, 1);
        }
        if enemy_king.is_some() {
            score += Score::weighted(params.knight_tropism, 7 - sq.distance(enemy_king) as i32);
        }
    }

    let bishops = pos.pieces(us, PieceType::Bishop);
    // 前方が塞がっている自ポーン
    let fixed_pawns = own_pawns & occ.forward(them);
    for sq in bishops {
        if is_outpost(sq) {
            score += Score::weighted(params.bishop_outpost, 1);
        }
        let complex = if LIGHT_SQUARES.contains(sq) { LIGHT_SQUARES } else { DARK_SQUARES };
        score += Score::weighted(params.bad_bishop, (fixed_pawns & complex).count() as i32);
    }
    if bishops.more_than_one() && !pos.pieces(them, PieceType::Bishop).more_than_one() {
        score += Score::new(
            params.bishop_pair[0] * scratch.bishop_scale / 100,
            params.bishop_pair[1],
        );
    }

    let rooks = pos.pieces(us, PieceType::Rook);
    let mut on_seventh = 0;
    for sq in rooks {
        let file = FILE_BB[sq.file() as usize];
        if (file & (own_pawns | enemy_pawns)).is_empty() {
            score += Score::weighted(params.rook_open, 1);
        } else if (file & own_pawns).is_empty() {
            score += Score::weighted(params.rook_semi_open, 1);
        }
        if sq.relative_rank(us) == 6 {
            on_seventh += 1;
        }
        // 同じ筋で間に駒のないルーク
        let stacked = (rook_attacks(sq, occ) & rooks & file).iter().filter(|&other| other > sq).count();
        score += Score::weighted(params.stacked_rooks, stacked as i32);
    }
    score.eg += params.rook_seventh_eg * on_seventh;
    if on_seventh >= 2 {
        score.eg += params.rook_seventh_pair_eg;
    }

    let queens = pos.pieces(us, PieceType::Queen);
    score.eg += params.queen_center_eg * (queens & CENTER4).count() as i32;

    let pawn_delta = own_pawns.count() as i32 - IMBALANCE_REF_PAWNS;
    let imbalance = pawn_delta
        * (knights.count() as i32 * params.imbalance[0] + bishops.count() as i32 * params.imbalance[1]);
    score += Score::new(imbalance, imbalance);

    if scratch.phase >= SPACE_PHASE_GATE {
        let zone = if us == Color::White { SPACE_ZONE_WHITE } else { SPACE_ZONE_BLACK };
        let safe = zone & !scratch.pawn_attacks[them.index()] & !own_pawns;
        let behind = own_pawns.fill_forward(them) & !own_pawns;
        let count = (safe.count() + (safe & behind).count()) as i32;
        score.mg += params.space * count;
    }

    score
}
