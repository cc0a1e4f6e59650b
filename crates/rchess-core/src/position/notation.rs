//! UCI指し手文字列の解析

use thiserror::Error;

use crate::movegen::{MoveList, generate_legal};
use crate::types::{Move, PieceType, Square};

use super::Position;

/// 指し手文字列の解析エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    /// 形式が不正
    #[error("malformed move text: {0}")]
    Malformed(String),
    /// この局面では合法手でない
    #[error("illegal move in this position: {0}")]
    Illegal(String),
}

impl Position {
    /// UCI形式の指し手（"e2e4", "e7e8q", "e1g1"）を合法手リストと照合して解決する
    ///
    /// "0000" は `Move::NONE`（null move）として返す。
    pub fn parse_uci_move(&self, text: &str) -> Result<Move, MoveParseError> {
        if text == "0000" {
            return Ok(Move::NONE);
        }
        if !(4..=5).contains(&text.len()) || !text.is_ascii() {
            return Err(MoveParseError::Malformed(text.to_string()));
        }
        let from = Square::from_name(&text[0..2])
            .ok_or_else(|| MoveParseError::Malformed(text.to_string()))?;
        let to = Square::from_name(&text[2..4])
            .ok_or_else(|| MoveParseError::Malformed(text.to_string()))?;
        let promo = match text[4..].chars().next() {
            None => PieceType::None,
            Some(c) => match PieceType::from_char(c) {
                Some(pt @ (PieceType::Queen | PieceType::Rook | PieceType::Bishop | PieceType::Knight)) => pt,
                _ => return Err(MoveParseError::Malformed(text.to_string())),
            },
        };

        let mut list = MoveList::new();
        generate_legal(self, &mut list);
        list.iter()
            .copied()
            .find(|m| m.from() == from && m.to() == to && m.promotion_type() == promo)
            .ok_or_else(|| MoveParseError::Illegal(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip_for_legal_moves() {
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        for &m in list.iter() {
            assert_eq!(pos.parse_uci_move(&m.to_uci()), Ok(m));
        }
    }

    #[test]
    fn test_parse_errors() {
        let pos = Position::startpos();
        assert_eq!(pos.parse_uci_move("0000"), Ok(Move::NONE));
        assert!(matches!(pos.parse_uci_move("e2"), Err(MoveParseError::Malformed(_))));
        assert!(matches!(pos.parse_uci_move("z2e4"), Err(MoveParseError::Malformed(_))));
        assert!(matches!(pos.parse_uci_move("e2e4k"), Err(MoveParseError::Malformed(_))));
        assert!(matches!(pos.parse_uci_move("e2e5"), Err(MoveParseError::Illegal(_))));
        let m = pos.parse_uci_move("g1f3").unwrap();
        assert_eq!(m.moved(), crate::types::Piece::W_KNIGHT);
    }

    #[test]
    fn test_parse_promotion_requires_suffix() {
        let pos = Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(pos.parse_uci_move("a7a8").is_err());
        let m = pos.parse_uci_move("a7a8n").unwrap();
        assert_eq!(m.promotion_type(), PieceType::Knight);
    }
}
