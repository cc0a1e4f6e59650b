//! 駒種（PieceType）と駒（Piece）
//!
//! 駒は `type = p & 7`, `color = (p >> 3) & 1` となるように符号化する。
//! 白は 1..=6、黒は 9..=14、`Piece::NONE = 0`。

use super::Color;

/// 駒種
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PieceType {
    None = 0,
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceType {
    /// 駒種の数（None含む）
    pub const NUM: usize = 7;

    /// 盤上の駒種（None除く）
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// 成れる駒種（クイーン、ルーク、ビショップ、ナイトの順）
    pub const PROMOTIONS: [PieceType; 4] =
        [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];

    /// u8から変換（範囲外はNone）
    #[inline]
    pub const fn from_u8(v: u8) -> PieceType {
        match v {
            1 => PieceType::Pawn,
            2 => PieceType::Knight,
            3 => PieceType::Bishop,
            4 => PieceType::Rook,
            5 => PieceType::Queen,
            6 => PieceType::King,
            _ => PieceType::None,
        }
    }

    /// 配列アクセス用インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// ゲームフェーズ重み（N=1, B=1, R=2, Q=4）
    #[inline]
    pub const fn phase_weight(self) -> i32 {
        match self {
            PieceType::Knight | PieceType::Bishop => 1,
            PieceType::Rook => 2,
            PieceType::Queen => 4,
            _ => 0,
        }
    }

    /// UCI/FENの小文字表記
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            PieceType::None => '.',
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// 小文字表記から変換
    #[inline]
    pub const fn from_char(c: char) -> Option<PieceType> {
        match c {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }
}

/// 駒（先後付き）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Piece(u8);

impl Piece {
    /// 駒の種類数（配列サイズ、0..16）
    pub const NUM: usize = 16;

    pub const NONE: Piece = Piece(0);

    pub const W_PAWN: Piece = Piece(1);
    pub const W_KNIGHT: Piece = Piece(2);
    pub const W_BISHOP: Piece = Piece(3);
    pub const W_ROOK: Piece = Piece(4);
    pub const W_QUEEN: Piece = Piece(5);
    pub const W_KING: Piece = Piece(6);

    pub const B_PAWN: Piece = Piece(9);
    pub const B_KNIGHT: Piece = Piece(10);
    pub const B_BISHOP: Piece = Piece(11);
    pub const B_ROOK: Piece = Piece(12);
    pub const B_QUEEN: Piece = Piece(13);
    pub const B_KING: Piece = Piece(14);

    /// 先後と駒種から生成
    #[inline]
    pub const fn new(color: Color, pt: PieceType) -> Piece {
        Piece(((color as u8) << 3) | pt as u8)
    }

    /// 生の値から生成（下位4bitのみ使用）
    #[inline]
    pub const fn from_u8(v: u8) -> Piece {
        Piece(v & 15)
    }

    /// 駒種
    #[inline]
    pub const fn piece_type(self) -> PieceType {
        PieceType::from_u8(self.0 & 7)
    }

    /// 先後（NONEの場合は白を返すので、呼び出し側で is_none を確認すること）
    #[inline]
    pub const fn color(self) -> Color {
        if (self.0 >> 3) & 1 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// 駒なしか
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// 駒ありか
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// 配列アクセス用インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// FEN表記（白は大文字）
    pub fn to_char(self) -> char {
        let c = self.piece_type().to_char();
        match self.color() {
            Color::White if self.is_some() => c.to_ascii_uppercase(),
            _ => c,
        }
    }

    /// FEN表記から変換
    pub fn from_char(c: char) -> Option<Piece> {
        let pt = PieceType::from_char(c.to_ascii_lowercase())?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(color, pt))
    }
}
