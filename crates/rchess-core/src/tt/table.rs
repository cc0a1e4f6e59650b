//! TranspositionTable本体
//!
//! - Bucket: エントリのグループ
//! - TranspositionTable: テーブル本体
//! - probe/store操作

use super::entry::TTEntry;
use super::{BUCKET_SIZE, DEFAULT_TT_MB};
use crate::types::{Bound, Depth, Move, Value};

/// 空き枠の置換スコア（常に最優先で選ばれる）
const EMPTY_SLOT_SCORE: i32 = -10000;

/// バケット構造
#[derive(Debug, Clone, Copy, Default)]
#[repr(C, align(64))]
pub struct Bucket {
    entries: [TTEntry; BUCKET_SIZE],
}

// バケットは64バイトであることを保証（キャッシュラインサイズ）
const _: () = assert!(std::mem::size_of::<Bucket>() == 64);

impl Bucket {
    const EMPTY: Bucket = Bucket {
        entries: [TTEntry::EMPTY; BUCKET_SIZE],
    };
}

/// MiB から求めるバケット数（切り捨て）
fn bucket_count(mb: usize) -> usize {
    mb * 1024 * 1024 / (BUCKET_SIZE * std::mem::size_of::<TTEntry>())
}

/// バケット配列を確保する。確保に失敗したらサイズを半分にして再試行する
fn allocate(mb: usize) -> (Vec<Bucket>, usize) {
    let mut mb = mb.max(1);
    loop {
        let count = bucket_count(mb).max(1);
        let mut buckets = Vec::new();
        match buckets.try_reserve_exact(count) {
            Ok(()) => {
                buckets.resize(count, Bucket::EMPTY);
                return (buckets, mb);
            }
            Err(err) if mb > 1 => {
                log::warn!("failed to allocate {mb} MiB transposition table ({err}), retrying with {} MiB", mb / 2);
                mb /= 2;
            }
            Err(err) => {
                log::warn!("failed to allocate transposition table ({err}), using a single bucket");
                return (vec![Bucket::EMPTY], 0);
            }
        }
    }
}

/// 置換表
///
/// 領域は最初の探索の直前（`ensure_allocated`）に確保する。
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    /// 要求サイズ（MiB）
    requested_mb: usize,
    /// 実際に確保できたサイズ（MiB）
    allocated_mb: usize,
    generation: u8,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TT_MB)
    }
}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位、確保は遅延）
    pub fn new(mb: usize) -> Self {
        Self {
            buckets: Vec::new(),
            requested_mb: mb,
            allocated_mb: 0,
            generation: 0,
        }
    }

    /// 確保済みでなければ確保する
    pub fn ensure_allocated(&mut self) {
        if self.buckets.is_empty() {
            let (buckets, mb) = allocate(self.requested_mb);
            log::debug!("transposition table: {} buckets ({mb} MiB)", buckets.len());
            self.buckets = buckets;
            self.allocated_mb = mb;
        }
    }

    /// サイズを変更（内容は破棄され、次の探索で確保し直す）
    pub fn resize(&mut self, mb: usize) {
        if mb != self.requested_mb || self.buckets.is_empty() {
            self.requested_mb = mb;
            self.buckets = Vec::new();
            self.allocated_mb = 0;
        }
        self.generation = 0;
    }

    /// クリア
    pub fn clear(&mut self) {
        self.buckets.fill(Bucket::EMPTY);
        self.generation = 0;
    }

    /// 要求サイズ（MiB）
    pub fn size_mb(&self) -> usize {
        self.requested_mb
    }

    /// 確保済みのサイズ（MiB、未確保なら0）
    pub fn allocated_mb(&self) -> usize {
        self.allocated_mb
    }

    /// バケット数（未確保なら0）
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// 新しい探索を開始（世代を進める。0には戻さない）
    pub fn new_search(&mut self) {
        self.generation = match self.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
    }

    /// 現在の世代を取得
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash as u32 as usize) % self.buckets.len()
    }

    #[inline]
    fn tag(hash: u64) -> u32 {
        (hash >> 32) as u32
    }

    /// 置換表を検索
    pub fn probe(&self, hash: u64) -> Option<TTEntry> {
        if self.buckets.is_empty() {
            return None;
        }
        let tag = Self::tag(hash);
        self.buckets[self.index(hash)]
            .entries
            .iter()
            .find(|e| !e.is_empty() && e.tag == tag)
            .copied()
    }

    /// 置換スコア（低いほど置き換えられやすい）
    fn replacement_score(&self, entry: &TTEntry, new_depth: Depth) -> i32 {
        if entry.is_empty() {
            return EMPTY_SLOT_SCORE;
        }
        let old_depth = entry.depth();
        let age = self.generation.wrapping_sub(entry.generation) as i32;
        let mut score = old_depth * 8 - age * 4;
        if entry.bound == Bound::Exact {
            score += 4;
        }
        score - 2 * (new_depth - old_depth - 2).max(0)
    }

    /// 置換表に書き込む
    ///
    /// 同じタグのエントリがあれば更新し、なければバケット内で置換スコア最小の枠を使う。
    pub fn store(&mut self, hash: u64, depth: Depth, ply: i32, mv: Move, score: Value, bound: Bound) {
        if self.buckets.is_empty() {
            return;
        }
        let tag = Self::tag(hash);
        let new_entry = TTEntry {
            tag,
            mv,
            score: score.to_tt(ply).raw() as i16,
            depth: depth.clamp(i8::MIN as Depth, i8::MAX as Depth) as i8,
            bound,
            generation: self.generation,
        };

        let index = self.index(hash);
        if let Some(slot) = self.buckets[index]
            .entries
            .iter()
            .position(|e| !e.is_empty() && e.tag == tag)
        {
            let generation = self.generation;
            let existing = &mut self.buckets[index].entries[slot];
            if new_entry.depth >= existing.depth || existing.generation != generation {
                let kept_move = existing.mv;
                *existing = new_entry;
                if mv.is_none() {
                    existing.mv = kept_move;
                }
            } else if existing.mv.is_none() {
                existing.mv = mv;
            }
            return;
        }

        let victim = (0..BUCKET_SIZE)
            .min_by_key(|&i| self.replacement_score(&self.buckets[index].entries[i], depth))
            .unwrap_or(0);
        self.buckets[index].entries[victim] = new_entry;
    }

    /// エントリの値がこのノードでそのまま使えるか
    ///
    /// fail-hard: 上界なら `alpha`、下界なら `beta` を返す。
    /// 除外手付きの探索ではエントリを使わない。
    pub fn use_entry(
        &self,
        entry: &TTEntry,
        depth: Depth,
        alpha: Value,
        beta: Value,
        ply: i32,
        excluded: Option<Move>,
    ) -> (bool, Value) {
        let score = entry.score(ply);
        if excluded.is_some() || entry.depth() < depth {
            return (false, score);
        }
        match entry.bound {
            Bound::Exact => (true, score),
            Bound::Upper if score <= alpha => (true, alpha),
            Bound::Lower if score >= beta => (true, beta),
            _ => (false, score),
        }
    }

    /// 使用率（1000分率、現世代のエントリのみ）
    pub fn hashfull(&self) -> u32 {
        let sample = self.buckets.len().min(1000 / BUCKET_SIZE);
        if sample == 0 {
            return 0;
        }
        let used = self.buckets[..sample]
            .iter()
            .flat_map(|b| b.entries.iter())
            .filter(|e| !e.is_empty() && e.generation == self.generation)
            .count();
        (used * 1000 / (sample * BUCKET_SIZE)) as u32
    }
}
