//! FEN形式の解析・出力

use thiserror::Error;

use crate::types::{CastlingRights, Color, Piece, PieceType, Square};

use super::Position;
use super::zobrist::{zobrist_castling, zobrist_ep, zobrist_side};

/// 初期局面のFEN
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN解析エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    /// 必須フィールドが欠けている
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    /// 盤面の形式が不正
    #[error("invalid board: {0}")]
    Board(String),
    /// 手番の形式が不正
    #[error("invalid side to move: {0}")]
    SideToMove(String),
    /// キャスリング権の形式が不正
    #[error("invalid castling rights: {0}")]
    Castling(String),
    /// アンパッサン升が不正
    #[error("invalid en passant square: {0}")]
    EnPassant(String),
    /// 手数の形式が不正
    #[error("invalid move clock: {0}")]
    Clock(String),
    /// 玉の数が不正（手番側はちょうど1枚、相手側は1枚以下）
    #[error("side to move must have exactly one king and the other side at most one")]
    KingCount,
    /// 1段目・8段目にポーンがある
    #[error("pawn on first or last rank")]
    PawnOnBackRank,
    /// 手番でない側が王手されている
    #[error("side not to move is in check")]
    OpponentInCheck,
}

impl Position {
    /// FEN文字列から局面を生成
    ///
    /// halfmove/fullmove が省略されていれば 0/1 とみなす。
    /// 玉・ルークが初期位置にないキャスリング権は警告を出して落とす。
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField("placement"))?;
        let side = fields.next().ok_or(FenError::MissingField("side to move"))?;
        let castling = fields.next().ok_or(FenError::MissingField("castling"))?;
        let ep = fields.next().ok_or(FenError::MissingField("en passant"))?;
        let halfmove = fields.next();
        let fullmove = fields.next();

        let mut pos = Position::empty();
        parse_placement(&mut pos, placement)?;

        pos.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::SideToMove(side.to_string())),
        };

        pos.castling = parse_castling(castling)?;
        let sanitized = sanitize_castling(&pos, pos.castling);
        if sanitized != pos.castling {
            log::warn!(
                "dropping castling rights {} -> {} (king or rook not on its home square)",
                pos.castling.to_fen(),
                sanitized.to_fen()
            );
            pos.castling = sanitized;
        }

        pos.ep_square = if ep == "-" {
            Square::NONE
        } else {
            let sq = Square::from_name(ep).ok_or_else(|| FenError::EnPassant(ep.to_string()))?;
            let expected_rank = match pos.side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            if sq.rank() != expected_rank {
                return Err(FenError::EnPassant(ep.to_string()));
            }
            if ep_square_consistent(&pos, sq) {
                sq
            } else {
                log::warn!("dropping en passant square {ep} (no double-pushed pawn behind it)");
                Square::NONE
            }
        };

        pos.halfmove = match halfmove {
            Some(s) => s.parse().map_err(|_| FenError::Clock(s.to_string()))?,
            None => 0,
        };
        pos.fullmove = match fullmove {
            Some(s) => s.parse::<u32>().map_err(|_| FenError::Clock(s.to_string()))?.max(1),
            None => 1,
        };

        if pos.pieces(pos.side_to_move, PieceType::King).count() != 1
            || pos.pieces(!pos.side_to_move, PieceType::King).count() > 1
        {
            return Err(FenError::KingCount);
        }
        let back_ranks = crate::bitboard::RANK_BB[0] | crate::bitboard::RANK_BB[7];
        if (pos.pieces_by_type(PieceType::Pawn) & back_ranks).is_not_empty() {
            return Err(FenError::PawnOnBackRank);
        }
        if pos.in_check(!pos.side_to_move) {
            return Err(FenError::OpponentInCheck);
        }

        if pos.side_to_move == Color::Black {
            pos.key ^= zobrist_side();
        }
        pos.key ^= zobrist_castling(pos.castling);
        if pos.ep_square.is_some() {
            pos.key ^= zobrist_ep(pos.ep_square);
        }
        pos.checkers = pos.compute_checkers();
        debug_assert_eq!(pos.validate(), Ok(()));
        Ok(pos)
    }

    /// FEN文字列を出力
    pub fn to_fen(&self) -> String {
        let mut s = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let pc = self.piece_on(Square::from_file_rank(file, rank));
                if pc.is_none() {
                    empty += 1;
                } else {
                    if empty > 0 {
                        s.push(char::from(b'0' + empty));
                        empty = 0;
                    }
                    s.push(pc.to_char());
                }
            }
            if empty > 0 {
                s.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        s.push(' ');
        s.push_str(&self.castling.to_fen());
        s.push(' ');
        s.push_str(&self.ep_square.to_string());
        s.push_str(&format!(" {} {}", self.halfmove, self.fullmove));
        s
    }
}

fn parse_placement(pos: &mut Position, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::Board(format!("expected 8 ranks, got {}", ranks.len())));
    }
    for (i, row) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(d) = c.to_digit(10) {
                if !(1..=8).contains(&d) {
                    return Err(FenError::Board(format!("bad empty count '{c}'")));
                }
                file += d as u8;
            } else {
                let pc = Piece::from_char(c)
                    .ok_or_else(|| FenError::Board(format!("unknown piece '{c}'")))?;
                if file >= 8 {
                    return Err(FenError::Board(format!("rank {} too long", rank + 1)));
                }
                pos.put_piece_keyed(Square::from_file_rank(file, rank), pc);
                file += 1;
            }
            if file > 8 {
                return Err(FenError::Board(format!("rank {} too long", rank + 1)));
            }
        }
        if file != 8 {
            return Err(FenError::Board(format!("rank {} has {file} files", rank + 1)));
        }
    }
    Ok(())
}

fn parse_castling(s: &str) -> Result<CastlingRights, FenError> {
    if s == "-" {
        return Ok(CastlingRights::NONE);
    }
    let mut cr = CastlingRights::NONE;
    for c in s.chars() {
        let right = match c {
            'K' => CastlingRights::WHITE_KING,
            'Q' => CastlingRights::WHITE_QUEEN,
            'k' => CastlingRights::BLACK_KING,
            'q' => CastlingRights::BLACK_QUEEN,
            _ => return Err(FenError::Castling(s.to_string())),
        };
        cr.insert(right);
    }
    Ok(cr)
}

fn sanitize_castling(pos: &Position, mut cr: CastlingRights) -> CastlingRights {
    for (right, king_sq, rook_sq) in CastlingRights::HOMES {
        let color = if king_sq.rank() == 0 {
            Color::White
        } else {
            Color::Black
        };
        if cr.contains(right)
            && (pos.piece_on(king_sq) != Piece::new(color, PieceType::King)
                || pos.piece_on(rook_sq) != Piece::new(color, PieceType::Rook))
        {
            cr.remove(right);
        }
    }
    cr
}

/// 直前に2歩進んだ相手ポーンがいて、通過升と移動元が空いているか
fn ep_square_consistent(pos: &Position, ep: Square) -> bool {
    let us = pos.side_to_move;
    let (victim, origin) = match us {
        Color::White => (ep.raw() - 8, ep.raw() + 8),
        Color::Black => (ep.raw() + 8, ep.raw() - 8),
    };
    pos.piece_on(Square::new(victim)) == Piece::new(!us, PieceType::Pawn)
        && pos.piece_on(ep).is_none()
        && pos.piece_on(Square::new(origin)).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_fen_roundtrip() {
        for fen in [
            FEN_STARTPOS,
            KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2pP4/8/8/PPP1PPPP/RNBQKBNR w KQkq c6 0 3",
            "8/8/8/8/4P3/8/8/K6k b - e3 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
            let again = Position::from_fen(&pos.to_fen()).unwrap();
            assert_eq!(again, pos);
        }
    }

    #[test]
    fn test_missing_clocks_default() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_castling_rights_sanitized() {
        // h1にルークがいないのでKは落とされる
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K3 w KQkq - 0 1").unwrap();
        assert_eq!(pos.castling_rights().to_fen(), "Qkq");
        assert!(pos.validate().is_ok());
    }

    #[test]
    fn test_ep_square_without_pawn_is_dropped() {
        use crate::movegen::{MoveList, generate_legal};

        // d5 に黒ポーンがいないので d6 は無効
        let mut pos = Position::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert!(pos.ep_square().is_none());
        assert_eq!(pos.to_fen(), "4k3/8/8/4P3/8/8/8/4K3 w - - 0 1");
        assert_eq!(pos, Position::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - - 0 1").unwrap());

        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        assert!(list.iter().all(|m| m.to_uci() != "e5d6"));
        for &m in list.iter() {
            let undo = pos.make_move(m).unwrap();
            assert_eq!(pos.validate(), Ok(()), "after {}", m.to_uci());
            pos.unmake_move(m, &undo);
        }

        // 通過升や移動元が埋まっている場合も落とす
        let blocked = Position::from_fen("4k3/3n4/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert!(blocked.ep_square().is_none());
    }

    #[test]
    fn test_ep_square_after_double_push_is_kept() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.ep_square(), Square::from_name("e3").unwrap());
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_fen_errors() {
        assert_eq!(Position::from_fen(""), Err(FenError::MissingField("placement")));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::Board(_))
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(FenError::SideToMove(_))
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w X - 0 1"),
            Err(FenError::Castling(_))
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - e3 0 1"),
            Err(FenError::EnPassant(_))
        ));
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/4K3 b - - 0 1"),
            Err(FenError::KingCount)
        );
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/4KK2 w - - 0 1"),
            Err(FenError::KingCount)
        );
        // 手番でない側の玉は省略できる（局所的な検証局面用）
        assert!(Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").is_ok());
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/P3K3 w - - 0 1"),
            Err(FenError::PawnOnBackRank)
        );
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").map(|_| ()),
            Ok(())
        );
        assert_eq!(
            Position::from_fen("4k2R/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::OpponentInCheck)
        );
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1"),
            Err(FenError::Clock(_))
        ));
    }
}
