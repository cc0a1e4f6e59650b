/// `go` 1回分の探索スレッドの状態
///
/// `bestmove` を出した時点で `Idle` に戻る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// 探索していない（直前の `go` の bestmove は送信済み）
    Idle,
    /// 探索スレッドが走っている、または `go infinite` の結果を保留中
    Searching,
    /// `stop` / `quit` を受けて停止フラグを立てた
    StopRequested,
}

impl SearchState {
    /// bestmove をまだ送っていない `go` があるか
    pub fn is_searching(&self) -> bool {
        matches!(self, SearchState::Searching | SearchState::StopRequested)
    }

    pub fn stop_requested(&self) -> bool {
        matches!(self, SearchState::StopRequested)
    }
}
