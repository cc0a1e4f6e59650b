//! UCIフロー統合テスト
//!
//! バイナリに UCI スクリプトを流し込み、標準出力を検証する。

use assert_cmd::Command;
use rchess_core::Position;
use rchess_core::movegen::{MoveList, generate_legal};

fn run_script(script: &str) -> String {
    let output = Command::cargo_bin("rchess-uci")
        .unwrap()
        .args(["--hash", "16"])
        .write_stdin(script)
        .output()
        .unwrap();
    assert!(output.status.success(), "exit status: {:?}", output.status);
    String::from_utf8(output.stdout).unwrap()
}

fn bestmove_lines(stdout: &str) -> Vec<&str> {
    stdout.lines().filter(|l| l.starts_with("bestmove ")).collect()
}

fn legal_uci_moves(pos: &Position) -> Vec<String> {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    list.iter().map(|m| m.to_uci()).collect()
}

#[test]
fn test_uci_handshake() {
    let out = run_script("uci\nisready\nquit\n");
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines[0].starts_with("id name rchess"));
    assert!(lines.contains(&"id author the rchess developers"));
    assert!(lines.contains(&"option name Hash type spin default 256 min 1 max 65536"));
    assert!(lines.contains(&"option name Clear Hash type button"));
    assert!(lines.iter().any(|l| l.starts_with("option name FutilityMarginDepth1 type spin")));
    assert!(lines.iter().any(|l| l.starts_with("option name LMPDepth5Plus type spin")));
    assert!(lines.contains(&"option name LMPMaxDepth type spin default 3 min 0 max 64"));
    assert!(lines.iter().any(|l| l.starts_with("option name NullMoveMinDepth type spin")));

    let uciok = lines.iter().position(|&l| l == "uciok").unwrap();
    let readyok = lines.iter().position(|&l| l == "readyok").unwrap();
    assert!(uciok < readyok);
}

#[test]
fn test_go_depth_emits_info_and_single_bestmove() {
    let out = run_script("uci\nucinewgame\nposition startpos moves e2e4\ngo depth 4\n");

    let infos: Vec<&str> = out.lines().filter(|l| l.starts_with("info depth ")).collect();
    assert_eq!(infos.len(), 4);
    for (i, info) in infos.iter().enumerate() {
        assert!(info.starts_with(&format!("info depth {} score ", i + 1)), "{info}");
        assert!(info.contains(" nodes ") && info.contains(" nps "), "{info}");
        assert!(info.contains(" pv "), "{info}");
    }

    let best = bestmove_lines(&out);
    assert_eq!(best.len(), 1, "{out}");
    let mv = best[0].trim_start_matches("bestmove ");

    let mut pos = Position::startpos();
    let e2e4 = pos.parse_uci_move("e2e4").unwrap();
    pos.make_move(e2e4).unwrap();
    assert!(legal_uci_moves(&pos).iter().any(|m| m == mv), "illegal bestmove {mv}");
}

#[test]
fn test_mate_in_one_reports_mate_score() {
    // 入力の終端では深さ指定の探索を最後まで走らせる
    let out = run_script("position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1\ngo depth 4\n");
    assert!(out.lines().any(|l| l.contains("score mate 1 ")), "{out}");
    assert_eq!(bestmove_lines(&out), vec!["bestmove a1a8"]);
}

#[test]
fn test_checkmated_position_has_no_bestmove() {
    let out = run_script("position fen R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1\ngo depth 3\n");
    assert_eq!(bestmove_lines(&out), vec!["bestmove (none)"]);
}

#[test]
fn test_infinite_search_stops_on_command() {
    let out = run_script("position startpos\ngo infinite\nstop\nquit\n");
    let best = bestmove_lines(&out);
    assert_eq!(best.len(), 1, "{out}");
    let mv = best[0].trim_start_matches("bestmove ");
    assert!(legal_uci_moves(&Position::startpos()).iter().any(|m| m == mv));
}

#[test]
fn test_movetime_search_finishes() {
    let out = run_script("position startpos\ngo movetime 100\n");
    assert_eq!(bestmove_lines(&out).len(), 1, "{out}");
}

#[test]
fn test_errors_are_reported_as_info_string() {
    let out = run_script(
        "position fen this-is-not-a-fen\n\
         position startpos moves e2e5\n\
         setoption name NoSuchOption value 3\n\
         setoption name Hash value many\n\
         frobnicate\n\
         isready\n\
         quit\n",
    );
    let info_strings: Vec<&str> = out.lines().filter(|l| l.starts_with("info string ")).collect();
    assert!(info_strings.len() >= 5, "{out}");
    assert!(info_strings.iter().any(|l| l.contains("invalid FEN")));
    assert!(info_strings.iter().any(|l| l.contains("e2e5")));
    assert!(info_strings.iter().any(|l| l.contains("unknown option: NoSuchOption")));
    assert!(info_strings.iter().any(|l| l.contains("Unknown command: frobnicate")));
    assert!(out.lines().any(|l| l == "readyok"));
}

#[test]
fn test_setoption_clamped_value_is_reported() {
    let out = run_script("setoption name LMRDepthLimit value 1000\nisready\nquit\n");
    assert!(out.lines().any(|l| l.starts_with("info string LMRDepthLimit clamped to 64")), "{out}");
}

#[test]
fn test_perft_subcommand() {
    let output = Command::cargo_bin("rchess-uci")
        .unwrap()
        .args(["perft", "--depth", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = String::from_utf8(output.stdout).unwrap();
    assert!(out.contains("Nodes searched: 8902"), "{out}");
}

#[test]
fn test_perft_divide_subcommand() {
    let output = Command::cargo_bin("rchess-uci")
        .unwrap()
        .args([
            "perft",
            "--fen",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "--depth",
            "1",
            "--divide",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = String::from_utf8(output.stdout).unwrap();
    assert!(out.lines().any(|l| l == "e1g1: 1"), "{out}");
    assert!(out.lines().any(|l| l == "e1c1: 1"), "{out}");
    assert!(out.contains("Nodes searched: 48"), "{out}");
}

#[test]
fn test_bench_subcommand() {
    let output = Command::cargo_bin("rchess-uci")
        .unwrap()
        .args(["bench", "--depth", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = String::from_utf8(output.stdout).unwrap();
    assert!(out.contains("Nodes searched"), "{out}");
    assert!(out.lines().filter(|l| l.starts_with("position ")).count() >= 5);
}

#[test]
fn test_missing_eval_file_fails_at_startup() {
    let output = Command::cargo_bin("rchess-uci")
        .unwrap()
        .args(["--eval-file", "/nonexistent/rchess-model.json"])
        .write_stdin("quit\n")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
