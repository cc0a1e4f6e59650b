//! ランダムウォークによる局面の不変条件テスト
//!
//! 固定シードで合法手をランダムに辿り、各局面で次を確かめる。
//! - make → unmake で局面（Zobristキーを含む）が完全に戻る
//! - 差分更新したキーと全計算したキーが一致する
//! - 王手判定が玉の升への利き判定と一致する
//! - FEN と UCI 指し手文字列の往復
//! - 擬似合法手のうち合法手でないものは、自玉を王手に晒す手だけ

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use rchess_core::eval::{EVAL_LIMIT, EvalParams, evaluate};
use rchess_core::movegen::{MoveList, generate_legal, generate_pseudo};
use rchess_core::{Color, Position};

const SEED: u64 = 0x5eed_c0de;
const GAMES: usize = 40;
const MAX_GAME_PLIES: usize = 120;

const START_FENS: [&str; 3] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
];

fn check_position(pos: &mut Position, params: &EvalParams) {
    assert_eq!(pos.validate(), Ok(()));
    assert_eq!(pos.compute_zobrist(), pos.hash());

    for color in Color::ALL {
        let ksq = pos.king_square(color);
        if ksq.is_some() {
            assert_eq!(
                pos.in_check(color),
                pos.is_square_attacked(ksq, !color, pos.occupied())
            );
        }
    }

    let fen = pos.to_fen();
    let reparsed = Position::from_fen(&fen).unwrap();
    assert_eq!(reparsed.to_fen(), fen);
    assert_eq!(reparsed.hash(), pos.hash());

    assert!(evaluate(pos, params).raw().abs() <= EVAL_LIMIT);

    let mut legal = MoveList::new();
    generate_legal(pos, &mut legal);
    let mut pseudo = MoveList::new();
    generate_pseudo(pos, &mut pseudo);

    for &m in legal.iter() {
        assert!(pseudo.contains(m), "legal move {m} missing from pseudo list in {fen}");
        assert_eq!(pos.parse_uci_move(&m.to_uci()), Ok(m));
    }

    let before = pos.clone();
    for &m in pseudo.iter() {
        match pos.make_move(m) {
            Some(undo) => {
                assert!(legal.contains(m), "make_move accepted {m} in {fen}");
                assert!(!pos.in_check(!pos.side_to_move()));
                pos.unmake_move(m, &undo);
                assert!(*pos == before, "unmake of {m} did not restore {fen}");
            }
            None => {
                assert!(!legal.contains(m), "make_move rejected legal {m} in {fen}");
                assert!(*pos == before);
            }
        }
    }

    if !pos.is_in_check() {
        let undo = pos.make_null_move();
        assert_eq!(pos.compute_zobrist(), pos.hash());
        pos.unmake_null_move(&undo);
        assert!(*pos == before);
    }
}

#[test]
fn random_walk_invariants() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED);
    let params = EvalParams::default();

    for game in 0..GAMES {
        let mut pos = Position::from_fen(START_FENS[game % START_FENS.len()]).unwrap();
        for _ in 0..MAX_GAME_PLIES {
            check_position(&mut pos, &params);

            let mut list = MoveList::new();
            generate_legal(&pos, &mut list);
            if list.is_empty() || pos.halfmove_clock() >= 100 {
                break;
            }
            let m = list[rng.random_range(0..list.len())];
            pos.make_move(m).unwrap();
        }
    }
}
