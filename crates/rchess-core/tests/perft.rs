//! perft による指し手生成の検証
//!
//! 深い深さは時間がかかるため `#[ignore]`。`cargo test -- --ignored` で実行する。

use rchess_core::Position;
use rchess_core::movegen::{perft, perft_divide};

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

fn run(fen: &str, depth: u32) -> u64 {
    let mut pos = Position::from_fen(fen).unwrap();
    let nodes = perft(&mut pos, depth);
    // perft は局面を元に戻す
    assert_eq!(pos.to_fen(), Position::from_fen(fen).unwrap().to_fen());
    nodes
}

#[test]
fn startpos_shallow() {
    assert_eq!(run(STARTPOS, 1), 20);
    assert_eq!(run(STARTPOS, 2), 400);
    assert_eq!(run(STARTPOS, 3), 8902);
}

#[test]
fn startpos_depth4() {
    assert_eq!(run(STARTPOS, 4), 197_281);
}

#[test]
#[ignore]
fn startpos_depth5() {
    assert_eq!(run(STARTPOS, 5), 4_865_609);
}

#[test]
fn kiwipete_shallow() {
    assert_eq!(run(KIWIPETE, 1), 48);
    assert_eq!(run(KIWIPETE, 2), 2039);
    assert_eq!(run(KIWIPETE, 3), 97_862);
}

#[test]
#[ignore]
fn kiwipete_depth4() {
    assert_eq!(run(KIWIPETE, 4), 4_085_603);
}

#[test]
#[ignore]
fn kiwipete_depth5() {
    assert_eq!(run(KIWIPETE, 5), 193_690_690);
}

#[test]
fn endgame_shallow() {
    assert_eq!(run(ENDGAME, 1), 14);
    assert_eq!(run(ENDGAME, 2), 191);
    assert_eq!(run(ENDGAME, 3), 2812);
    assert_eq!(run(ENDGAME, 4), 43_238);
}

#[test]
#[ignore]
fn endgame_depth5() {
    assert_eq!(run(ENDGAME, 5), 674_624);
}

#[test]
fn divide_sums_to_perft() {
    let mut pos = Position::from_fen(KIWIPETE).unwrap();
    let divide = perft_divide(&mut pos, 2);
    assert_eq!(divide.len(), 48);
    assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 2039);
}
