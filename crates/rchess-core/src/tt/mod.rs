//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTEntry`: エントリ（16バイト、キー上位32bitのタグ）
//! - `Bucket`: `BUCKET_SIZE` 個のエントリ（64バイト）
//! - `TranspositionTable`: テーブル本体、世代管理、置換ポリシー
//!
//! バケットはキーの下位32bitで選び、バケット内はタグ（上位32bit）で照合する。
//! 探索は単一スレッドなので、エントリは素の値として読み書きする。

mod entry;
mod table;

pub use entry::TTEntry;
pub use table::{Bucket, TranspositionTable};

/// バケット内のエントリ数
pub const BUCKET_SIZE: usize = 4;

/// 既定のサイズ（MiB）
pub const DEFAULT_TT_MB: usize = 256;
