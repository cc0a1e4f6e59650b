//! 置換表の境界種別（Bound）

/// 置換表エントリの値の性質
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Bound {
    /// 空エントリ
    #[default]
    None = 0,
    /// 真の値以上（fail-high, beta cut）
    Lower = 1,
    /// 真の値以下（fail-low, alphaを更新しなかった）
    Upper = 2,
    /// 正確な値
    Exact = 3,
}

impl Bound {
    /// u8から変換（不正値はNone）
    #[inline]
    pub const fn from_u8(v: u8) -> Bound {
        match v {
            1 => Bound::Lower,
            2 => Bound::Upper,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }
}
