//! キング安全度、ポーンストーム、終盤の玉

use crate::bitboard::{Bitboard, FILE_BB, pawn_attacks};
use crate::position::Position;
use crate::types::{Color, PieceType, Square};

use super::KING_SAFETY_TABLE_LEN;
use super::evaluate::{EvalScratch, KING_SAFETY_EG_DIVISOR, Score};
use super::params::EvalParams;

/// このフェーズ以下かつクイーンがいなければ終盤の玉評価を行う
const ENDGAME_PHASE_GATE: i32 = 8;
/// 追い詰め評価に切り替える駒得（EG駒価値）
const MOP_UP_MARGIN: i32 = 200;
/// ストームで数える守備側の筋（玉の筋 ±1）
const STORM_FILE_SPAN: i32 = 1;

/// `us` の玉周りの評価（ペナルティは負）
pub(super) fn evaluate(pos: &Position, params: &EvalParams, scratch: &EvalScratch, us: Color) -> Score {
    let ksq = pos.king_square(us);
    if ksq.is_none() {
        return Score::default();
    }
    let them = us.opponent();
    let mut score = Score::default();

    let penalty = king_danger(pos, params, scratch, us, ksq);
    score -= Score::new(penalty, penalty / KING_SAFETY_EG_DIVISOR);

    score.mg -= pawn_storm(pos, params, scratch, us, ksq);

    // 距離2以内の敵ポーン
    let near = scratch.king_inner[us.index()] | scratch.king_outer[us.index()];
    score.mg -= params.storm_proximity * (near & scratch.pawns[them.index()]).count() as i32;

    let weak = scratch.king_inner[us.index()] & scratch.attacks[them.index()] & !scratch.attacks[us.index()];
    score.mg -= params.weak_king_ring * weak.count() as i32;

    score
}

/// 玉筋とその両隣の筋
fn king_files(ksq: Square) -> impl Iterator<Item = Bitboard> {
    let file = ksq.file() as i32;
    (file - STORM_FILE_SPAN..=file + STORM_FILE_SPAN)
        .filter(|f| (0..8).contains(f))
        .map(|f| FILE_BB[f as usize])
}

/// 攻撃ユニットを表で引いた危険度
fn king_danger(pos: &Position, params: &EvalParams, scratch: &EvalScratch, us: Color, ksq: Square) -> i32 {
    let [open_w, semi_w, minor_w, pawn_w] = params.king_ring_correlates;
    let own_pawns = scratch.pawns[us.index()];
    let all_pawns = own_pawns | scratch.pawns[us.opponent().index()];
    let inner = scratch.king_inner[us.index()];

    let mut units = scratch.king_attack_units[us.index()];
    for file in king_files(ksq) {
        if (file & all_pawns).is_empty() {
            units += open_w;
        } else if (file & own_pawns).is_empty() {
            units += semi_w;
        }
    }
    let minors = pos.pieces(us, PieceType::Knight) | pos.pieces(us, PieceType::Bishop);
    units -= minor_w * (minors & inner).count() as i32;
    units -= pawn_w * (own_pawns & inner).count().min(3) as i32;

    let index = units.clamp(0, KING_SAFETY_TABLE_LEN as i32 - 1) as usize;
    params.king_safety_table[index]
}

/// 玉の前に迫る敵ポーンのペナルティ（MG）
fn pawn_storm(pos: &Position, params: &EvalParams, scratch: &EvalScratch, us: Color, ksq: Square) -> i32 {
    let them = us.opponent();
    let own = scratch.pawns[us.index()];
    let enemy = scratch.pawns[them.index()];
    let zone = king_files(ksq).fold(Bitboard::EMPTY, |acc, f| acc | f);

    let mut total = 0;
    for sq in enemy & zone {
        let base = params.storm_rank_base[sq.relative_rank(them) as usize];
        let targets = pawn_attacks(them, sq) & own;
        let category = if (Bitboard::from_square(sq).forward(them) & own).is_not_empty() {
            3
        } else if targets.is_empty() {
            0
        } else if (targets & !scratch.pawn_attacks[us.index()]).is_not_empty() {
            2
        } else {
            1
        };
        total += base * params.storm_category_pct[category] / 100;
    }

    // 反対翼の玉同士なら倍
    let their_king = pos.king_square(them);
    if their_king.is_some() && opposite_wings(ksq, their_king) {
        total *= 2;
    }
    total
}

fn opposite_wings(a: Square, b: Square) -> bool {
    (a.file() <= 2 && b.file() >= 5) || (a.file() >= 5 && b.file() <= 2)
}

/// 中央4升からのマンハッタン距離（0..=6）
fn center_distance(sq: Square) -> i32 {
    let file = sq.file() as i32;
    let rank = sq.rank() as i32;
    (3 - file).max(file - 4) + (3 - rank).max(rank - 4)
}

/// 終盤の玉（白視点）
///
/// 駒得が小さければ双方の玉の中央化、大きければ優勢側に追い詰めのボーナス。
pub(super) fn endgame(pos: &Position, params: &EvalParams, scratch: &EvalScratch) -> Score {
    let kings = [pos.king_square(Color::White), pos.king_square(Color::Black)];
    if scratch.phase > ENDGAME_PHASE_GATE
        || pos.pieces_by_type(PieceType::Queen).is_not_empty()
        || kings.iter().any(|k| k.is_none())
    {
        return Score::default();
    }
    let [center_w, mop_center_w, mop_prox_w] = params.endgame_king;

    let material = |c: Color| -> i32 {
        PieceType::ALL[..5]
            .iter()
            .map(|&pt| pos.pieces(c, pt).count() as i32 * params.material_eg[pt.index() - 1])
            .sum()
    };
    let diff = material(Color::White) - material(Color::Black);

    let eg = if diff.abs() < MOP_UP_MARGIN {
        center_w * (center_distance(kings[1]) - center_distance(kings[0]))
    } else {
        let (winner, loser) = if diff > 0 { (kings[0], kings[1]) } else { (kings[1], kings[0]) };
        let bonus = mop_center_w * center_distance(loser) + mop_prox_w * (14 - winner.manhattan(loser) as i32);
        if diff > 0 { bonus } else { -bonus }
    };
    Score::new(0, eg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_distance() {
        assert_eq!(center_distance(Square::E4), 0);
        assert_eq!(center_distance(Square::A1), 6);
        assert_eq!(center_distance(Square::H8), 6);
        assert_eq!(center_distance(Square::C3), 2);
    }

    #[test]
    fn test_mop_up_prefers_cornered_enemy_king() {
        let params = EvalParams::default();
        let score = |fen: &str| {
            let pos = Position::from_fen(fen).unwrap();
            let scratch = EvalScratch::new(&pos, &params);
            endgame(&pos, &params, &scratch)
        };
        let cornered = score("7k/8/6K1/8/8/8/8/R7 w - - 0 1");
        let central = score("8/8/8/4k3/8/8/8/R3K3 w - - 0 1");
        assert!(cornered.eg > central.eg);
        assert!(cornered.eg > 0);
    }

    #[test]
    fn test_endgame_gate_ignores_queens() {
        let params = EvalParams::default();
        let pos = Position::from_fen("7k/8/6K1/8/8/8/8/Q7 w - - 0 1").unwrap();
        let scratch = EvalScratch::new(&pos, &params);
        assert_eq!(endgame(&pos, &params, &scratch), Score::default());
    }

    #[test]
    fn test_open_king_is_more_dangerous() {
        let params = EvalParams::default();
        let danger = |fen: &str| {
            let pos = Position::from_fen(fen).unwrap();
            let scratch = EvalScratch::new(&pos, &params);
            let ksq = pos.king_square(Color::White);
            king_danger(&pos, &params, &scratch, Color::White, ksq)
        };
        // 同じ攻め駒で、g筋のポーンの有無だけが違う
        let sheltered = danger("6k1/8/8/8/8/6q1/5PPP/6K1 w - - 0 1");
        let open = danger("6k1/8/8/8/8/6q1/5P1P/6K1 w - - 0 1");
        assert!(open >= sheltered);
    }

    #[test]
    fn test_storm_doubles_on_opposite_wings() {
        let mut params = EvalParams::from_theta(&vec![0; EvalParams::theta_len()]).unwrap();
        params.storm_rank_base = [10; 8];
        params.storm_category_pct = [100, 100, 100, 100];
        let storm = |fen: &str| {
            let pos = Position::from_fen(fen).unwrap();
            let scratch = EvalScratch::new(&pos, &params);
            pawn_storm(&pos, &params, &scratch, Color::White, pos.king_square(Color::White))
        };
        assert_eq!(storm("2k5/8/8/8/6p1/8/8/6K1 w - - 0 1"), 20);
        assert_eq!(storm("6k1/8/8/8/6p1/8/8/6K1 w - - 0 1"), 10);
    }
}
