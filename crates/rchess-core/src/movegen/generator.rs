//! 指し手生成器

use crate::bitboard::{
    Bitboard, RANK_BB, between_bb, bishop_attacks, king_attacks, knight_attacks, line_bb,
    pawn_attacks, queen_attacks, rook_attacks,
};
use crate::position::Position;
use crate::types::{CastlingRights, Color, Move, MoveFlag, Piece, PieceType, Square};

use super::MoveList;

/// 生成する指し手の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    /// すべて
    All,
    /// 捕獲（アンパッサン・捕獲を伴う成りを含む）
    Captures,
    /// 非捕獲（捕獲を伴わない成り・キャスリングを含む）
    Quiets,
}

/// 王手・ピン情報
#[derive(Debug, Clone, Copy)]
pub struct CheckInfo {
    /// 手番側の玉の升
    pub king_sq: Square,
    /// 王手をかけている駒
    pub checkers: Bitboard,
    /// 王手を解消できる升（王手でなければ全升、両王手なら空）
    pub check_mask: Bitboard,
    /// 手番側のピンされた駒
    pub pinned: Bitboard,
}

impl CheckInfo {
    pub fn new(pos: &Position) -> Self {
        let us = pos.side_to_move();
        let them = !us;
        let king_sq = pos.king_square(us);
        if king_sq.is_none() {
            return CheckInfo {
                king_sq,
                checkers: Bitboard::EMPTY,
                check_mask: Bitboard::ALL,
                pinned: Bitboard::EMPTY,
            };
        }
        let checkers = pos.checkers();
        let check_mask = match checkers.count() {
            0 => Bitboard::ALL,
            1 => {
                // ナイト・ポーンの王手では between が空になり、取る手だけが残る
                let c = checkers.lsb();
                between_bb(king_sq, c) | Bitboard::from_square(c)
            }
            _ => Bitboard::EMPTY,
        };

        let occ = pos.occupied();
        let snipers = (rook_attacks(king_sq, Bitboard::EMPTY) & pos.rook_sliders(them))
            | (bishop_attacks(king_sq, Bitboard::EMPTY) & pos.bishop_sliders(them));
        let mut pinned = Bitboard::EMPTY;
        for s in snipers {
            let blockers = between_bb(king_sq, s) & occ;
            if blockers.count() == 1 && (blockers & pos.occupancy(us)).is_not_empty() {
                pinned |= blockers;
            }
        }

        CheckInfo {
            king_sq,
            checkers,
            check_mask,
            pinned,
        }
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers.is_not_empty()
    }

    #[inline]
    pub fn double_check(&self) -> bool {
        self.checkers.more_than_one()
    }

    /// ピンされた駒が動ける升（ピンされていなければ空）
    #[inline]
    pub fn pin_line(&self, sq: Square) -> Bitboard {
        if self.pinned.contains(sq) {
            line_bb(self.king_sq, sq)
        } else {
            Bitboard::EMPTY
        }
    }

    /// `from` の駒の移動先制限（王手マスクとピン軸）
    #[inline]
    fn restriction(&self, from: Square) -> Bitboard {
        if self.pinned.contains(from) {
            self.check_mask & line_bb(self.king_sq, from)
        } else {
            self.check_mask
        }
    }
}

// ============================================================================
// 公開API
// ============================================================================

/// 合法手をすべて生成
#[inline]
pub fn generate_legal(pos: &Position, list: &mut MoveList) {
    generate::<true>(pos, GenType::All, list);
}

/// 合法な捕獲手を生成
#[inline]
pub fn generate_legal_captures(pos: &Position, list: &mut MoveList) {
    generate::<true>(pos, GenType::Captures, list);
}

/// 合法な非捕獲手を生成
#[inline]
pub fn generate_legal_quiets(pos: &Position, list: &mut MoveList) {
    generate::<true>(pos, GenType::Quiets, list);
}

/// 種類を指定して合法手を生成
#[inline]
pub fn generate_legal_with(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    generate::<true>(pos, gen_type, list);
}

/// 擬似合法手をすべて生成
#[inline]
pub fn generate_pseudo(pos: &Position, list: &mut MoveList) {
    generate::<false>(pos, GenType::All, list);
}

/// 種類を指定して擬似合法手を生成
#[inline]
pub fn generate_pseudo_with(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    generate::<false>(pos, gen_type, list);
}

// ============================================================================
// 駒種別の生成
// ============================================================================

fn generate<const LEGAL: bool>(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    let us = pos.side_to_move();
    let info = CheckInfo::new(pos);

    let target = match gen_type {
        GenType::All => !pos.occupancy(us),
        GenType::Captures => pos.occupancy(!us),
        GenType::Quiets => !pos.occupied(),
    };

    if !LEGAL || !info.double_check() {
        generate_pawn_moves::<LEGAL>(pos, &info, gen_type, list);
        for pt in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
            generate_piece_moves::<LEGAL>(pos, &info, pt, target, list);
        }
    }
    generate_king_moves::<LEGAL>(pos, &info, target, list);
    if gen_type != GenType::Captures && (!LEGAL || !info.in_check()) {
        generate_castling::<LEGAL>(pos, list);
    }
}

#[inline]
fn push_move(pos: &Position, list: &mut MoveList, from: Square, to: Square) {
    list.push(Move::normal(from, to, pos.piece_on(from), pos.piece_on(to)));
}

fn generate_piece_moves<const LEGAL: bool>(
    pos: &Position,
    info: &CheckInfo,
    pt: PieceType,
    target: Bitboard,
    list: &mut MoveList,
) {
    let us = pos.side_to_move();
    let occ = pos.occupied();
    for from in pos.pieces(us, pt) {
        let mut attacks = match pt {
            PieceType::Knight => knight_attacks(from),
            PieceType::Bishop => bishop_attacks(from, occ),
            PieceType::Rook => rook_attacks(from, occ),
            _ => queen_attacks(from, occ),
        } & target;
        if LEGAL {
            attacks &= info.restriction(from);
        }
        for to in attacks {
            push_move(pos, list, from, to);
        }
    }
}

fn push_pawn_move(list: &mut MoveList, from: Square, to: Square, pawn: Piece, captured: Piece) {
    let us = pawn.color();
    if to.relative_rank(us) == 7 {
        for pt in PieceType::PROMOTIONS {
            list.push(Move::new(
                from,
                to,
                pawn,
                captured,
                Piece::new(us, pt),
                MoveFlag::None,
            ));
        }
    } else {
        list.push(Move::normal(from, to, pawn, captured));
    }
}

fn generate_pawn_moves<const LEGAL: bool>(
    pos: &Position,
    info: &CheckInfo,
    gen_type: GenType,
    list: &mut MoveList,
) {
    let us = pos.side_to_move();
    let them = !us;
    let pawn = Piece::new(us, PieceType::Pawn);
    let pawns = pos.pieces(us, PieceType::Pawn);
    if pawns.is_empty() {
        return;
    }
    let empty = !pos.occupied();
    let enemies = pos.occupancy(them);
    let start_rank = RANK_BB[if us == Color::White { 1 } else { 6 }];
    let fwd = us.forward();

    for from in pawns {
        let restriction = if LEGAL {
            info.restriction(from)
        } else {
            Bitboard::ALL
        };

        if gen_type != GenType::Captures {
            let one = Square::new((from.raw() as i8 + fwd) as u8);
            if empty.contains(one) {
                if restriction.contains(one) {
                    push_pawn_move(list, from, one, pawn, Piece::NONE);
                }
                if start_rank.contains(from) {
                    let two = Square::new((one.raw() as i8 + fwd) as u8);
                    if empty.contains(two) && restriction.contains(two) {
                        list.push(Move::normal(from, two, pawn, Piece::NONE));
                    }
                }
            }
        }

        if gen_type != GenType::Quiets {
            let attacks = pawn_attacks(us, from);
            for to in attacks & enemies & restriction {
                push_pawn_move(list, from, to, pawn, pos.piece_on(to));
            }

            let ep = pos.ep_square();
            if ep.is_some() && attacks.contains(ep) {
                let victim = Square::new((ep.raw() as i8 - fwd) as u8);
                if !LEGAL || ep_is_legal(pos, info, from, ep, victim) {
                    list.push(Move::new(
                        from,
                        ep,
                        pawn,
                        Piece::new(them, PieceType::Pawn),
                        Piece::NONE,
                        MoveFlag::EnPassant,
                    ));
                }
            }
        }
    }
}

/// アンパッサンの合法性を占有のシミュレーションで判定する
///
/// 移動するポーンと取られるポーンを外し、移動先にポーンを置いた占有で玉への利きを調べる。
/// 横一列のピン（取る側と取られる側が同時に抜ける）もこれで検出できる。
fn ep_is_legal(pos: &Position, info: &CheckInfo, from: Square, ep: Square, victim: Square) -> bool {
    if info.king_sq.is_none() {
        return true;
    }
    let mut occ = pos.occupied();
    occ.clear(from);
    occ.clear(victim);
    occ.set(ep);
    !pos.is_square_attacked(info.king_sq, !pos.side_to_move(), occ)
}

fn generate_king_moves<const LEGAL: bool>(
    pos: &Position,
    info: &CheckInfo,
    target: Bitboard,
    list: &mut MoveList,
) {
    let us = pos.side_to_move();
    let ksq = info.king_sq;
    if ksq.is_none() {
        return;
    }
    let mut occ = pos.occupied();
    occ.clear(ksq);
    for to in king_attacks(ksq) & target {
        if LEGAL && pos.is_square_attacked(to, !us, occ) {
            continue;
        }
        push_move(pos, list, ksq, to);
    }
}

fn generate_castling<const LEGAL: bool>(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let them = !us;
    let rights = pos.castling_rights();
    let (king_side, queen_side) = CastlingRights::for_color(us);
    let occ = pos.occupied();
    let king = Piece::new(us, PieceType::King);
    let base = if us == Color::White { 0u8 } else { 56u8 };
    let sq = |file: u8| Square::new(base + file);

    // (権利, 空いている必要のある升, 攻撃されてはいけない升, 玉の移動先)
    let candidates: [(CastlingRights, &[u8], [u8; 3], u8); 2] = [
        (king_side, &[5, 6], [4, 5, 6], 6),
        (queen_side, &[1, 2, 3], [4, 3, 2], 2),
    ];

    for (right, empty_files, safe_files, dest) in candidates {
        if !rights.contains(right) {
            continue;
        }
        if empty_files.iter().any(|&f| occ.contains(sq(f))) {
            continue;
        }
        if LEGAL && safe_files.iter().any(|&f| pos.is_square_attacked(sq(f), them, occ)) {
            continue;
        }
        list.push(Move::new(
            sq(4),
            sq(dest),
            king,
            Piece::NONE,
            Piece::NONE,
            MoveFlag::Castle,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal(fen: &str) -> MoveList {
        let pos = Position::from_fen(fen).unwrap();
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        list
    }

    fn ucis(list: &MoveList) -> Vec<String> {
        let mut v: Vec<String> = list.iter().map(|m| m.to_uci()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_ep_pin_exposure() {
        let list = legal("8/8/8/K2pP2r/8/8/8/8 w - d6 0 1");
        let moves = ucis(&list);
        assert!(!moves.contains(&"e5d6".to_string()));
        assert!(moves.contains(&"e5e6".to_string()));
        for m in list.iter() {
            let pt = m.moved().piece_type();
            assert!(pt == PieceType::King || m.to_uci() == "e5e6", "unexpected {m}");
        }
    }

    #[test]
    fn test_stalemate_has_no_moves() {
        let list = legal("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(list.is_empty());
    }

    #[test]
    fn test_double_check_only_king_moves() {
        // e1の玉にe8のルークとb4のビショップで両王手
        let pos = Position::from_fen("4r2k/8/8/8/1b6/8/8/4K3 w - - 0 1").unwrap();
        let info = CheckInfo::new(&pos);
        assert!(info.double_check());
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        assert!(!list.is_empty());
        assert!(list.iter().all(|m| m.moved().piece_type() == PieceType::King));
    }

    #[test]
    fn test_single_check_block_or_capture() {
        // e8のルークによる王手: c3のビショップはe5へ合駒できるが、d4へは動けない
        let list = legal("4r2k/8/8/8/8/2B5/8/4K3 w - - 0 1");
        let moves = ucis(&list);
        assert!(moves.contains(&"c3e5".to_string()));
        assert!(!moves.contains(&"c3d4".to_string()));
    }

    #[test]
    fn test_pinned_piece_moves_along_line() {
        // e2のルークはe8のルークにピンされているがe筋上は動ける
        let list = legal("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let rook_moves: Vec<_> = list
            .iter()
            .filter(|m| m.moved().piece_type() == PieceType::Rook)
            .map(|m| m.to_uci())
            .collect();
        assert_eq!(rook_moves.len(), 6);
        assert!(rook_moves.iter().all(|u| u.as_bytes()[2] == b'e'));
    }

    #[test]
    fn test_promotions_and_filters() {
        let fen = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        let mut caps = MoveList::new();
        generate_legal_captures(&pos, &mut caps);
        assert_eq!(ucis(&caps), vec!["a7b8b", "a7b8n", "a7b8q", "a7b8r"]);
        let mut quiets = MoveList::new();
        generate_legal_quiets(&pos, &mut quiets);
        assert!(quiets.iter().any(|m| m.to_uci() == "a7a8q"));
        let mut all = MoveList::new();
        generate_legal(&pos, &mut all);
        assert_eq!(all.len(), caps.len() + quiets.len());
    }

    #[test]
    fn test_castling_generation() {
        let list = legal("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = ucis(&list);
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));
        // d1が攻撃されているのでクイーンサイドは不可、b1は攻撃されていても良い
        let list = legal("r2rk3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = ucis(&list);
        assert!(!moves.contains(&"e1c1".to_string()));
        assert!(moves.contains(&"e1g1".to_string()));
        let list = legal("1r2k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(ucis(&list).contains(&"e1c1".to_string()));
    }

    #[test]
    fn test_legal_subset_of_pseudo() {
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let mut legal = MoveList::new();
        generate_legal(&pos, &mut legal);
        let mut pseudo = MoveList::new();
        generate_pseudo(&pos, &mut pseudo);
        for m in legal.iter() {
            assert!(pseudo.contains(*m));
        }
        for &m in pseudo.iter() {
            let mut p = pos.clone();
            assert_eq!(p.make_move(m).is_some(), legal.contains(m), "{m}");
        }
    }
}
