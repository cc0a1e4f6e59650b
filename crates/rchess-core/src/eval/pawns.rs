//! ポーン構造とパスポーン

use crate::bitboard::{
    Bitboard, RANK_BB, adjacent_files, forward_file_bb, passed_pawn_mask, pawn_attacks,
};
use crate::types::Color;

use super::evaluate::{EvalScratch, Score};
use super::params::EvalParams;

/// `us` 側のポーン評価
pub(super) fn evaluate(params: &EvalParams, scratch: &EvalScratch, us: Color) -> Score {
    let them = us.opponent();
    let own = scratch.pawns[us.index()];
    let enemy = scratch.pawns[them.index()];

    let mut score = Score::default();
    for sq in own {
        let bb = Bitboard::from_square(sq);
        let adjacent = adjacent_files(sq.file());
        let ahead = forward_file_bb(us, sq);
        let stop = bb.forward(us);
        let supporters = pawn_attacks(them, sq) & own;
        let phalanx = (bb.east() | bb.west()) & own;
        // 互いに取り合える敵ポーン（この升を攻める敵ポーンと同じ集合）
        let levers = pawn_attacks(us, sq) & enemy;
        let isolated = (adjacent & own).is_empty();

        if (ahead & own).is_not_empty() {
            score += Score::weighted(params.doubled, 1);
        }
        if isolated {
            score += Score::weighted(params.isolated, 1);
        }
        if supporters.is_not_empty() {
            score += Score::weighted(params.connected, 1);
        }
        if phalanx.is_not_empty() {
            score += Score::weighted(params.phalanx, 1);
        }
        if sq.relative_rank(us) >= 3 && (stop & enemy).is_not_empty() {
            score += Score::weighted(params.blocked, 1);
        }
        if levers.is_not_empty() {
            score += Score::weighted(params.lever, 1);
        }
        if levers.more_than_one() && supporters.is_empty() {
            score += Score::weighted(params.weak_lever, 1);
        }

        // 後ろ（同じ段を含む）の隣接筋に味方ポーンがおらず、前進升を敵ポーンが押さえている
        let behind = (passed_pawn_mask(them, sq) | RANK_BB[sq.rank() as usize]) & adjacent;
        if !isolated
            && supporters.is_empty()
            && (behind & own).is_empty()
            && (stop & scratch.pawn_attacks[them.index()]).is_not_empty()
        {
            score += Score::weighted(params.backward, 1);
        }

        let blockers = passed_pawn_mask(us, sq) & enemy;
        if blockers.is_empty() && (ahead & own).is_empty() {
            let psq = sq.relative(us).index();
            score += Score::new(params.passed_mg[psq], params.passed_eg[psq]);
        } else if !blockers.more_than_one()
            && blockers == levers
            && (ahead & (own | enemy)).is_empty()
        {
            // 1回の捕獲でパスポーンになる候補。捕獲先の升の値の一部を与える
            let dest = blockers.lsb().relative(us).index();
            let pct = params.candidate_passer_pct;
            score += Score::new(params.passed_mg[dest] * pct / 100, params.passed_eg[dest] * pct / 100);
        }
    }
    score
}
