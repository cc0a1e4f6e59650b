use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use rchess_core::search::{Engine, SearchLimits, SearchResult};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// 探索スレッドのスタックサイズ（再帰探索 + PV配列用）
const SEARCH_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Messages from worker thread to main thread
#[derive(Debug)]
pub enum WorkerMessage {
    /// Completed iteration, already formatted as an `info` line
    Info { line: String, search_id: u64 },

    /// Search finished
    Finished {
        result: SearchResult,
        search_id: u64,
    },
}

/// Lock a mutex, recovering the inner value if a previous holder panicked
pub fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("Mutex was poisoned, attempting recovery");
            poisoned.into_inner()
        }
    }
}

/// Spawn the search thread
///
/// The engine lock is held for the whole search. The caller resets the stop
/// flag before spawning and sets it to interrupt.
pub fn spawn_search(
    engine: Arc<Mutex<Engine>>,
    limits: SearchLimits,
    search_id: u64,
    tx: Sender<WorkerMessage>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("search-{search_id}"))
        .stack_size(SEARCH_STACK_SIZE)
        .spawn(move || {
            log::debug!("search {search_id} started: {limits:?}");
            let mut engine = lock_or_recover(&engine);
            let result = engine.search(&limits, &mut |info| {
                let line = info.to_uci_line();
                if tx.send(WorkerMessage::Info { line, search_id }).is_err() {
                    log::debug!("main thread gone, dropping info");
                }
            });

            #[cfg(feature = "search-stats")]
            log::info!("search statistics:\n{}", engine.stats_report());

            drop(engine);
            log::debug!(
                "search {search_id} finished: depth {} nodes {}",
                result.depth,
                result.nodes
            );
            if tx.send(WorkerMessage::Finished { result, search_id }).is_err() {
                log::warn!("main thread gone before search {search_id} finished");
            }
        })
        .context("failed to spawn search thread")
}
