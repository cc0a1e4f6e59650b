//! UCI protocol command definitions

use rchess_core::search::{SearchLimits, TimePoint};
use rchess_core::types::Depth;

/// UCI protocol commands
#[derive(Debug, Clone, PartialEq)]
pub enum UciCommand {
    /// Initialize UCI mode
    Uci,

    /// Check if engine is ready
    IsReady,

    /// Set engine option
    SetOption { name: String, value: Option<String> },

    /// New game notification
    UciNewGame,

    /// Set position
    Position {
        startpos: bool,
        fen: Option<String>,
        moves: Vec<String>,
    },

    /// Start search
    Go(GoParams),

    /// Stop searching
    Stop,

    /// Quit the engine
    Quit,
}

/// Parameters for go command
///
/// Times are in milliseconds. GUIs occasionally send negative clock values,
/// so they are kept signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// White time in milliseconds
    pub wtime: Option<TimePoint>,

    /// Black time in milliseconds
    pub btime: Option<TimePoint>,

    /// White increment in milliseconds
    pub winc: Option<TimePoint>,

    /// Black increment in milliseconds
    pub binc: Option<TimePoint>,

    /// Moves until next time control
    pub movestogo: Option<u32>,

    /// Maximum search depth
    pub depth: Option<u32>,

    /// Maximum nodes to search
    pub nodes: Option<u64>,

    /// Fixed time per move in milliseconds
    pub movetime: Option<TimePoint>,

    /// Search until `stop`
    pub infinite: bool,
}

impl GoParams {
    /// Convert to the core search limits
    pub fn to_limits(&self) -> SearchLimits {
        SearchLimits {
            wtime: self.wtime,
            btime: self.btime,
            winc: self.winc.unwrap_or(0).max(0),
            binc: self.binc.unwrap_or(0).max(0),
            movestogo: self.movestogo.filter(|&n| n > 0),
            depth: self.depth.map(|d| Depth::try_from(d).unwrap_or(Depth::MAX)),
            nodes: self.nodes,
            movetime: self.movetime.map(|t| t.max(1)),
            infinite: self.infinite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_limits_defaults() {
        let limits = GoParams::default().to_limits();
        assert_eq!(limits, SearchLimits::default());
    }

    #[test]
    fn test_to_limits_sanitizes_values() {
        let params = GoParams {
            wtime: Some(-50),
            winc: Some(-10),
            movestogo: Some(0),
            depth: Some(u32::MAX),
            movetime: Some(0),
            ..GoParams::default()
        };
        let limits = params.to_limits();
        assert_eq!(limits.wtime, Some(-50));
        assert_eq!(limits.winc, 0);
        assert_eq!(limits.movestogo, None);
        assert_eq!(limits.depth, Some(Depth::MAX));
        assert_eq!(limits.movetime, Some(1));
    }
}
