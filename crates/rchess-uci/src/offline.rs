//! Offline subcommands: perft and bench

use anyhow::{Context, Result};
use rchess_core::movegen::{perft, perft_divide};
use rchess_core::search::{Engine, SearchLimits, format_score};
use rchess_core::types::Depth;
use rchess_core::{FEN_STARTPOS, Position};
use std::time::Instant;

/// bench で探索する局面
const BENCH_POSITIONS: &[&str] = &[
    FEN_STARTPOS,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
];

/// bench で使う置換表サイズ（MiB）
const BENCH_HASH_MB: usize = 16;

fn nps(nodes: u64, elapsed_ms: u128) -> u64 {
    (nodes as u128 * 1000 / elapsed_ms.max(1)) as u64
}

/// perft を実行して結果を標準出力に書く
pub fn run_perft(fen: Option<&str>, depth: u32, divide: bool) -> Result<()> {
    let fen = fen.unwrap_or(FEN_STARTPOS);
    let mut pos = Position::from_fen(fen).with_context(|| format!("invalid FEN '{fen}'"))?;

    let start = Instant::now();
    let nodes = if divide {
        let mut total = 0;
        for (m, count) in perft_divide(&mut pos, depth) {
            println!("{}: {count}", m.to_uci());
            total += count;
        }
        println!();
        total
    } else {
        perft(&mut pos, depth)
    };
    let elapsed = start.elapsed().as_millis();

    println!("Nodes searched: {nodes}");
    println!("Time: {elapsed} ms ({} nps)", nps(nodes, elapsed));
    Ok(())
}

/// 固定深さで複数局面を探索し、ノード数とNPSを出す
pub fn run_bench(depth: Depth) -> Result<()> {
    let mut engine = Engine::new(BENCH_HASH_MB);
    let limits = SearchLimits::depth(depth.max(1));
    let mut total_nodes = 0u64;
    let start = Instant::now();

    for (i, fen) in BENCH_POSITIONS.iter().enumerate() {
        let pos = Position::from_fen(fen).with_context(|| format!("invalid bench FEN '{fen}'"))?;
        engine.new_game();
        engine.set_position(pos);

        let started = Instant::now();
        let result = engine.search(&limits, &mut |_| {});
        let elapsed = started.elapsed().as_millis();
        total_nodes += result.nodes;

        println!(
            "position {:>2}: {} score {} nodes {} time {elapsed} ms",
            i + 1,
            result.bestmove_line(),
            format_score(result.score),
            result.nodes
        );
        #[cfg(feature = "search-stats")]
        println!("{}", engine.stats_report());
    }

    let elapsed = start.elapsed().as_millis();
    println!("===========================");
    println!("Total time (ms) : {elapsed}");
    println!("Nodes searched  : {total_nodes}");
    println!("Nodes/second    : {}", nps(total_nodes, elapsed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_positions_are_valid() {
        for fen in BENCH_POSITIONS {
            let pos = Position::from_fen(fen).unwrap();
            assert!(pos.validate().is_ok(), "{fen}");
        }
    }

    #[test]
    fn test_nps_handles_zero_time() {
        assert_eq!(nps(5000, 0), 5_000_000);
        assert_eq!(nps(5000, 1000), 5000);
    }
}
