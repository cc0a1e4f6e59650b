//! UCI protocol command parser

use super::commands::{GoParams, UciCommand};
use anyhow::{Result, anyhow};
use log::warn;
use std::str::FromStr;

/// Parse UCI command from input line
pub fn parse_uci_command(line: &str) -> Result<UciCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Err(anyhow!("Empty command"));
    }

    match parts[0] {
        "uci" => Ok(UciCommand::Uci),
        "isready" => Ok(UciCommand::IsReady),
        "ucinewgame" => Ok(UciCommand::UciNewGame),
        "quit" => Ok(UciCommand::Quit),
        "stop" => Ok(UciCommand::Stop),

        "setoption" => parse_setoption(&parts[1..]),
        "position" => parse_position(&parts[1..]),
        "go" => parse_go(&parts[1..]),

        _ => Err(anyhow!("Unknown command: {}", parts[0])),
    }
}

/// Parse setoption command
fn parse_setoption(parts: &[&str]) -> Result<UciCommand> {
    // Expected format: name <name> [value <value>]
    if parts.len() < 2 || parts[0] != "name" {
        return Err(anyhow!("Invalid setoption format"));
    }

    let value_pos = parts.iter().position(|&p| p == "value");
    let name_end = value_pos.unwrap_or(parts.len());
    if name_end <= 1 {
        return Err(anyhow!("setoption requires an option name"));
    }
    let name = parts[1..name_end].join(" ");

    // "value" without anything after it is treated as no value
    let value = value_pos
        .map(|pos| parts[pos + 1..].join(" "))
        .filter(|v| !v.is_empty());

    Ok(UciCommand::SetOption { name, value })
}

/// Parse position command
fn parse_position(parts: &[&str]) -> Result<UciCommand> {
    if parts.is_empty() {
        return Err(anyhow!("Invalid position format"));
    }

    let moves_pos = parts.iter().position(|&p| p == "moves");
    let (startpos, fen) = match parts[0] {
        "startpos" => {
            if moves_pos.is_some_and(|pos| pos != 1) || (moves_pos.is_none() && parts.len() > 1) {
                return Err(anyhow!("Unexpected token after startpos: {}", parts[1]));
            }
            (true, None)
        }
        "fen" => {
            let fen_end = moves_pos.unwrap_or(parts.len());
            if fen_end <= 1 {
                return Err(anyhow!("position fen requires a FEN string"));
            }
            (false, Some(parts[1..fen_end].join(" ")))
        }
        other => return Err(anyhow!("Position must start with 'startpos' or 'fen', got '{other}'")),
    };

    // "moves" with an empty list is accepted (some GUIs send it)
    let moves = match moves_pos {
        Some(pos) => parts[pos + 1..].iter().map(|&s| s.to_string()).collect(),
        None => Vec::new(),
    };

    Ok(UciCommand::Position {
        startpos,
        fen,
        moves,
    })
}

/// `go` の数値引数を1つ読む
fn parse_value<T: FromStr>(parts: &[&str], i: &mut usize, key: &str) -> Result<T> {
    *i += 1;
    let raw = parts.get(*i).ok_or_else(|| anyhow!("go {key} requires a value"))?;
    raw.parse().map_err(|_| anyhow!("Invalid {key} value: {raw}"))
}

/// Parse go command
fn parse_go(parts: &[&str]) -> Result<UciCommand> {
    let mut params = GoParams::default();
    let mut i = 0;

    while i < parts.len() {
        match parts[i] {
            "infinite" => params.infinite = true,
            "wtime" => params.wtime = Some(parse_value(parts, &mut i, "wtime")?),
            "btime" => params.btime = Some(parse_value(parts, &mut i, "btime")?),
            "winc" => params.winc = Some(parse_value(parts, &mut i, "winc")?),
            "binc" => params.binc = Some(parse_value(parts, &mut i, "binc")?),
            "movestogo" => params.movestogo = Some(parse_value(parts, &mut i, "movestogo")?),
            "depth" => params.depth = Some(parse_value(parts, &mut i, "depth")?),
            "nodes" => params.nodes = Some(parse_value(parts, &mut i, "nodes")?),
            "movetime" => params.movetime = Some(parse_value(parts, &mut i, "movetime")?),
            // ponder / searchmoves / mate は未対応。トークンだけ読み飛ばす
            "ponder" => warn!("go ponder is not supported; searching normally"),
            other => warn!("Ignoring unknown go parameter: {other}"),
        }
        i += 1;
    }

    Ok(UciCommand::Go(params))
}
