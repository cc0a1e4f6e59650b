//! 事前計算テーブル
//!
//! 近接駒の利き、方向別レイ、2升間のマスクを初回アクセス時に一度だけ構築する。

use std::sync::OnceLock;

use crate::types::{Color, Square};

use super::Bitboard;

/// 筋マスク（a..h）
pub const FILE_BB: [Bitboard; 8] = {
    let mut t = [Bitboard::EMPTY; 8];
    let mut f = 0;
    while f < 8 {
        t[f] = Bitboard::new(0x0101_0101_0101_0101u64 << f);
        f += 1;
    }
    t
};

/// 段マスク（1..8）
pub const RANK_BB: [Bitboard; 8] = {
    let mut t = [Bitboard::EMPTY; 8];
    let mut r = 0;
    while r < 8 {
        t[r] = Bitboard::new(0xFFu64 << (8 * r));
        r += 1;
    }
    t
};

/// 明るい升（b1, a2, ...）
pub const LIGHT_SQUARES: Bitboard = Bitboard::new(0x55AA_55AA_55AA_55AA);
/// 暗い升（a1, ...）
pub const DARK_SQUARES: Bitboard = Bitboard::new(!0x55AA_55AA_55AA_55AA);

/// 飛び駒の方向（ルーク4方向 + ビショップ4方向）
///
/// `rook_ray` は N, S, E, W、`bishop_ray` は NE, NW, SE, SW の順。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayDir {
    N = 0,
    S = 1,
    E = 2,
    W = 3,
    NE = 4,
    NW = 5,
    SE = 6,
    SW = 7,
}

impl RayDir {
    pub const ROOK: [RayDir; 4] = [RayDir::N, RayDir::S, RayDir::E, RayDir::W];
    pub const BISHOP: [RayDir; 4] = [RayDir::NE, RayDir::NW, RayDir::SE, RayDir::SW];

    /// (筋方向, 段方向)
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            RayDir::N => (0, 1),
            RayDir::S => (0, -1),
            RayDir::E => (1, 0),
            RayDir::W => (-1, 0),
            RayDir::NE => (1, 1),
            RayDir::NW => (-1, 1),
            RayDir::SE => (1, -1),
            RayDir::SW => (-1, -1),
        }
    }

    /// 升番号が増える方向か（最初の遮り駒をlsbで取れる）
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, RayDir::N | RayDir::E | RayDir::NE | RayDir::NW)
    }

    /// ルーク系の方向か
    #[inline]
    pub const fn is_orthogonal(self) -> bool {
        (self as usize) < 4
    }
}

struct Tables {
    knight: [Bitboard; Square::NUM],
    king: [Bitboard; Square::NUM],
    pawn: [[Bitboard; Square::NUM]; Color::NUM],
    rays: [[Bitboard; 8]; Square::NUM],
    king_ray_union: [Bitboard; Square::NUM],
    between: Box<[[Bitboard; Square::NUM]; Square::NUM]>,
    line: Box<[[Bitboard; Square::NUM]; Square::NUM]>,
    passed_mask: [[Bitboard; Square::NUM]; Color::NUM],
    forward_file: [[Bitboard; Square::NUM]; Color::NUM],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline]
fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::new)
}

fn step_attacks(deltas: &[(i32, i32)]) -> [Bitboard; Square::NUM] {
    let mut table = [Bitboard::EMPTY; Square::NUM];
    for sq in Square::all() {
        let mut bb = Bitboard::EMPTY;
        for &(df, dr) in deltas {
            if let Some(to) = sq.offset(df, dr) {
                bb.set(to);
            }
        }
        table[sq.index()] = bb;
    }
    table
}

fn ray_from(sq: Square, dir: RayDir) -> Bitboard {
    let (df, dr) = dir.delta();
    ray_from_delta(sq, df, dr)
}

impl Tables {
    fn new() -> Self {
        const KNIGHT_DELTAS: [(i32, i32); 8] = [
            (1, 2),
            (2, 1),
            (2, -1),
            (1, -2),
            (-1, -2),
            (-2, -1),
            (-2, 1),
            (-1, 2),
        ];
        const KING_DELTAS: [(i32, i32); 8] = [
            (0, 1),
            (1, 1),
            (1, 0),
            (1, -1),
            (0, -1),
            (-1, -1),
            (-1, 0),
            (-1, 1),
        ];

        let knight = step_attacks(&KNIGHT_DELTAS);
        let king = step_attacks(&KING_DELTAS);
        let pawn = [step_attacks(&[(-1, 1), (1, 1)]), step_attacks(&[(-1, -1), (1, -1)])];

        let mut rays = [[Bitboard::EMPTY; 8]; Square::NUM];
        let mut king_ray_union = [Bitboard::EMPTY; Square::NUM];
        for sq in Square::all() {
            for dir in RayDir::ROOK.into_iter().chain(RayDir::BISHOP) {
                let ray = ray_from(sq, dir);
                rays[sq.index()][dir as usize] = ray;
                king_ray_union[sq.index()] |= ray;
            }
        }

        let mut between = Box::new([[Bitboard::EMPTY; Square::NUM]; Square::NUM]);
        let mut line = Box::new([[Bitboard::EMPTY; Square::NUM]; Square::NUM]);
        for a in Square::all() {
            for dir in RayDir::ROOK.into_iter().chain(RayDir::BISHOP) {
                let ray = rays[a.index()][dir as usize];
                // 逆方向のレイ
                let (df, dr) = dir.delta();
                let opposite = ray_from_delta(a, -df, -dr);
                let full = ray | opposite | Bitboard::from_square(a);
                let mut acc = Bitboard::EMPTY;
                let mut cur = a.offset(df, dr);
                while let Some(b) = cur {
                    between[a.index()][b.index()] = acc;
                    line[a.index()][b.index()] = full;
                    acc.set(b);
                    cur = b.offset(df, dr);
                }
            }
        }

        let mut passed_mask = [[Bitboard::EMPTY; Square::NUM]; Color::NUM];
        let mut forward_file = [[Bitboard::EMPTY; Square::NUM]; Color::NUM];
        for color in Color::ALL {
            for sq in Square::all() {
                let front = match sq.offset(0, if color == Color::White { 1 } else { -1 }) {
                    Some(s) => Bitboard::from_square(s).fill_forward(color),
                    None => Bitboard::EMPTY,
                };
                forward_file[color.index()][sq.index()] = front;
                passed_mask[color.index()][sq.index()] = front | front.east() | front.west();
            }
        }

        Tables {
            knight,
            king,
            pawn,
            rays,
            king_ray_union,
            between,
            line,
            passed_mask,
            forward_file,
        }
    }
}

fn ray_from_delta(sq: Square, df: i32, dr: i32) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    let mut cur = sq.offset(df, dr);
    while let Some(s) = cur {
        bb.set(s);
        cur = s.offset(df, dr);
    }
    bb
}

/// ナイトの利き
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().knight[sq.index()]
}

/// キングの利き
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables().king[sq.index()]
}

/// `color` のポーンが `sq` から利いている升
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    tables().pawn[color.index()][sq.index()]
}

/// ポーン集合全体の利き
#[inline]
pub fn pawn_attacks_bb(color: Color, pawns: Bitboard) -> Bitboard {
    let f = pawns.forward(color);
    f.east() | f.west()
}

/// 方向別レイ（起点を含まない、盤端まで）
#[inline]
pub fn ray(sq: Square, dir: RayDir) -> Bitboard {
    tables().rays[sq.index()][dir as usize]
}

/// ルークのレイ（dir: 0=N, 1=S, 2=E, 3=W）
#[inline]
pub fn rook_ray(sq: Square, dir: usize) -> Bitboard {
    tables().rays[sq.index()][dir]
}

/// ビショップのレイ（dir: 0=NE, 1=NW, 2=SE, 3=SW）
#[inline]
pub fn bishop_ray(sq: Square, dir: usize) -> Bitboard {
    tables().rays[sq.index()][4 + dir]
}

/// ルーク・ビショップ全レイの和集合（make_moveの王手判定ゲートに使う）
#[inline]
pub fn king_ray_union(sq: Square) -> Bitboard {
    tables().king_ray_union[sq.index()]
}

/// 2升間（両端を含まない）。同一直線上にない場合は空
#[inline]
pub fn between_bb(a: Square, b: Square) -> Bitboard {
    tables().between[a.index()][b.index()]
}

/// 2升を通る直線全体（両端を含む）。同一直線上にない場合は空
#[inline]
pub fn line_bb(a: Square, b: Square) -> Bitboard {
    tables().line[a.index()][b.index()]
}

/// 3升が同一直線上にあるか
#[inline]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line_bb(a, b).contains(c)
}

/// パスポーン判定用マスク（前方の同筋と隣接筋）
#[inline]
pub fn passed_pawn_mask(color: Color, sq: Square) -> Bitboard {
    tables().passed_mask[color.index()][sq.index()]
}

/// 前方の同筋
#[inline]
pub fn forward_file_bb(color: Color, sq: Square) -> Bitboard {
    tables().forward_file[color.index()][sq.index()]
}

/// 隣接筋
#[inline]
pub fn adjacent_files(file: u8) -> Bitboard {
    let f = FILE_BB[file as usize];
    f.east() | f.west()
}

/// 方向レイ上の最初の遮り駒（なければNONE）
#[inline]
pub fn first_blocker(sq: Square, dir: RayDir, occ: Bitboard) -> Square {
    let blockers = ray(sq, dir) & occ;
    if dir.is_positive() {
        blockers.lsb()
    } else {
        blockers.msb()
    }
}
