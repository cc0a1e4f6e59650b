//! UCI protocol output formatting

use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;

/// UCI protocol responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciResponse {
    /// Engine identification - name
    IdName(String),

    /// Engine identification - author
    IdAuthor(String),

    /// Engine option (full line after `option `)
    Option(String),

    /// UCI mode confirmed
    UciOk,

    /// Ready confirmation
    ReadyOk,

    /// Search information (formatted `info` line)
    Info(String),

    /// Best move found (`(none)` when the position has no legal move)
    BestMove(String),

    /// String message (for errors/warnings)
    String(String),
}

impl fmt::Display for UciResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciResponse::IdName(name) => write!(f, "id name {name}"),
            UciResponse::IdAuthor(author) => write!(f, "id author {author}"),
            UciResponse::Option(spec) => write!(f, "option {spec}"),
            UciResponse::UciOk => write!(f, "uciok"),
            UciResponse::ReadyOk => write!(f, "readyok"),
            UciResponse::Info(line) => write!(f, "{line}"),
            UciResponse::BestMove(line) => write!(f, "{line}"),
            UciResponse::String(msg) => {
                // 改行を含むとプロトコルが壊れるので1行にまとめる
                let flat: String = msg.lines().collect::<Vec<_>>().join(" | ");
                write!(f, "info string {flat}")
            }
        }
    }
}

/// Send response to stdout and flush
pub fn send_response(response: UciResponse) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{response}").context("failed to write to stdout")?;
    out.flush().context("failed to flush stdout")?;
    log::debug!("> {response}");
    Ok(())
}

/// Send `info string ...`
pub fn send_info_string(message: impl Into<String>) -> Result<()> {
    send_response(UciResponse::String(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_display() {
        assert_eq!(UciResponse::IdName("rchess 0.1.0".to_string()).to_string(), "id name rchess 0.1.0");
        assert_eq!(UciResponse::UciOk.to_string(), "uciok");
        assert_eq!(UciResponse::ReadyOk.to_string(), "readyok");
        assert_eq!(
            UciResponse::Option("name Hash type spin default 256 min 1 max 65536".to_string())
                .to_string(),
            "option name Hash type spin default 256 min 1 max 65536"
        );
        assert_eq!(
            UciResponse::BestMove("bestmove e2e4".to_string()).to_string(),
            "bestmove e2e4"
        );
    }

    #[test]
    fn test_info_string_is_single_line() {
        let resp = UciResponse::String("first\nsecond".to_string());
        assert_eq!(resp.to_string(), "info string first | second");
    }
}
