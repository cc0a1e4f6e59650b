use crate::options::{apply_option, option_lines};
use crate::state::SearchState;
use crate::uci::{GoParams, UciCommand, UciResponse, send_info_string, send_response};
use crate::worker::{WorkerMessage, lock_or_recover, spawn_search};
use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use rchess_core::search::{Engine, SearchResult};
use rchess_core::{FEN_STARTPOS, Position};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// `id name` で名乗るエンジン名
pub const ENGINE_NAME: &str = "rchess";
pub const ENGINE_AUTHOR: &str = "the rchess developers";

/// 探索終了待ちでスレッドの生存を確認する間隔
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Context for handling UCI commands
///
/// `go` 1回につき `bestmove` をちょうど1回出すための状態をまとめて持つ。
pub struct CommandContext {
    pub engine: Arc<Mutex<Engine>>,
    /// Engine の停止フラグ（ロックなしで立てられる）
    pub stop_flag: Arc<AtomicBool>,
    pub worker_tx: Sender<WorkerMessage>,
    pub worker_rx: Receiver<WorkerMessage>,
    pub worker_handle: Option<JoinHandle<()>>,
    pub search_state: SearchState,
    pub search_id_counter: u64,
    pub current_search_id: u64,
    pub current_search_infinite: bool,
    /// `go infinite` が `stop` より先に終わったときの結果
    pub pending_result: Option<SearchResult>,
}

impl CommandContext {
    pub fn new(engine: Engine) -> Self {
        let stop_flag = engine.stop_handle();
        let (worker_tx, worker_rx) = unbounded();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            stop_flag,
            worker_tx,
            worker_rx,
            worker_handle: None,
            search_state: SearchState::Idle,
            search_id_counter: 0,
            current_search_id: 0,
            current_search_infinite: false,
            pending_result: None,
        }
    }

    // =========================================================================
    // Worker messages
    // =========================================================================

    /// Handle worker messages during normal operation
    pub fn handle_worker_message(&mut self, msg: WorkerMessage) -> Result<()> {
        match msg {
            WorkerMessage::Info { line, search_id } => {
                if search_id == self.current_search_id {
                    send_response(UciResponse::Info(line))?;
                }
            }
            WorkerMessage::Finished { result, search_id } => {
                if search_id != self.current_search_id || !self.search_state.is_searching() {
                    log::debug!("Ignoring stale result from search {search_id}");
                    return Ok(());
                }
                self.join_worker();
                if self.current_search_infinite && !self.search_state.stop_requested() {
                    // go infinite は stop を受けるまで bestmove を返さない
                    log::debug!("infinite search finished before stop; holding bestmove");
                    self.pending_result = Some(result);
                } else {
                    self.emit_bestmove(&result)?;
                }
            }
        }
        Ok(())
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker_handle.take() {
            if handle.join().is_err() {
                log::error!("Search thread panicked");
            }
        }
    }

    fn emit_bestmove(&mut self, result: &SearchResult) -> Result<()> {
        self.search_state = SearchState::Idle;
        self.pending_result = None;
        send_response(UciResponse::BestMove(result.bestmove_line()))
    }

    fn request_stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if self.search_state == SearchState::Searching {
            self.search_state = SearchState::StopRequested;
        }
    }

    /// 探索中なら（`stop` が真なら止めてから）終了を待ち、bestmove を出す
    pub fn finish_search(&mut self, stop: bool) -> Result<()> {
        if !self.search_state.is_searching() {
            return Ok(());
        }
        if stop {
            self.request_stop();
        }

        loop {
            if let Some(result) = self.pending_result.take() {
                return self.emit_bestmove(&result);
            }
            if !self.search_state.is_searching() {
                return Ok(());
            }

            match self.worker_rx.recv_timeout(WORKER_POLL_INTERVAL) {
                Ok(msg) => self.handle_worker_message(msg)?,
                Err(RecvTimeoutError::Timeout) => {
                    let dead = self.worker_handle.as_ref().is_none_or(|h| h.is_finished());
                    if dead {
                        match self.worker_rx.try_recv() {
                            Ok(msg) => self.handle_worker_message(msg)?,
                            Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                                self.join_worker();
                                self.search_state = SearchState::Idle;
                                bail!("search thread terminated without a result");
                            }
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.search_state = SearchState::Idle;
                    bail!("search thread disconnected");
                }
            }
        }
    }

    /// 入力が閉じたときの後始末
    ///
    /// 深さ・時間で終わる探索は最後まで走らせ、`go infinite` だけは止める。
    pub fn drain(&mut self) -> Result<()> {
        let stop = self.current_search_infinite;
        self.finish_search(stop)
    }
}

// =============================================================================
// Command handlers
// =============================================================================

/// Handle a UCI command other than `quit`
pub fn handle_command(cmd: UciCommand, ctx: &mut CommandContext) -> Result<()> {
    match cmd {
        UciCommand::Uci => handle_uci(),
        UciCommand::IsReady => send_response(UciResponse::ReadyOk),
        UciCommand::SetOption { name, value } => {
            ctx.finish_search(true)?;
            let note = {
                let mut engine = lock_or_recover(&ctx.engine);
                apply_option(&mut engine, &name, value.as_deref())?
            };
            if let Some(note) = note {
                send_info_string(note)?;
            }
            Ok(())
        }
        UciCommand::UciNewGame => {
            ctx.finish_search(true)?;
            lock_or_recover(&ctx.engine).new_game();
            log::debug!("new game");
            Ok(())
        }
        UciCommand::Position {
            startpos,
            fen,
            moves,
        } => {
            ctx.finish_search(true)?;
            handle_position(ctx, startpos, fen.as_deref(), &moves)
        }
        UciCommand::Go(params) => handle_go(ctx, &params),
        UciCommand::Stop => {
            if ctx.search_state.is_searching() {
                ctx.request_stop();
                if let Some(result) = ctx.pending_result.take() {
                    ctx.emit_bestmove(&result)?;
                }
            } else {
                log::debug!("stop received while idle");
            }
            Ok(())
        }
        UciCommand::Quit => Err(anyhow!("quit must be handled by the main loop")),
    }
}

fn handle_uci() -> Result<()> {
    send_response(UciResponse::IdName(format!("{ENGINE_NAME} {}", env!("CARGO_PKG_VERSION"))))?;
    send_response(UciResponse::IdAuthor(ENGINE_AUTHOR.to_string()))?;
    for line in option_lines() {
        send_response(UciResponse::Option(line))?;
    }
    send_response(UciResponse::UciOk)
}

/// `position` を適用する
///
/// FEN が不正なら局面は変えない。指し手列の途中で失敗した場合は、
/// 失敗した手の直前までを適用した局面が残る。
fn handle_position(
    ctx: &mut CommandContext,
    startpos: bool,
    fen: Option<&str>,
    moves: &[String],
) -> Result<()> {
    let pos = if startpos {
        Position::startpos()
    } else {
        let fen = fen.unwrap_or(FEN_STARTPOS);
        Position::from_fen(fen).with_context(|| format!("invalid FEN '{fen}'"))?
    };

    let mut engine = lock_or_recover(&ctx.engine);
    engine.set_position(pos);
    for (i, text) in moves.iter().enumerate() {
        engine
            .apply_move(text)
            .with_context(|| format!("move {} '{text}' rejected", i + 1))?;
    }
    log::debug!("position set: {}", engine.position().to_fen());
    Ok(())
}

fn handle_go(ctx: &mut CommandContext, params: &GoParams) -> Result<()> {
    ctx.finish_search(true)?;

    ctx.stop_flag.store(false, Ordering::Relaxed);
    ctx.search_id_counter += 1;
    ctx.current_search_id = ctx.search_id_counter;
    ctx.current_search_infinite = params.infinite;
    ctx.pending_result = None;

    let limits = params.to_limits();
    let handle = spawn_search(
        Arc::clone(&ctx.engine),
        limits,
        ctx.current_search_id,
        ctx.worker_tx.clone(),
    )?;
    ctx.worker_handle = Some(handle);
    ctx.search_state = SearchState::Searching;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CommandContext {
        CommandContext::new(Engine::new(1))
    }

    fn go_depth(ctx: &mut CommandContext, depth: u32) {
        let params = GoParams {
            depth: Some(depth),
            ..GoParams::default()
        };
        handle_command(UciCommand::Go(params), ctx).unwrap();
    }

    #[test]
    fn test_position_startpos_with_moves() {
        let mut ctx = context();
        handle_command(
            UciCommand::Position {
                startpos: true,
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            },
            &mut ctx,
        )
        .unwrap();
        let engine = lock_or_recover(&ctx.engine);
        assert_eq!(
            engine.position().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn test_position_invalid_fen_keeps_previous() {
        let mut ctx = context();
        let err = handle_command(
            UciCommand::Position {
                startpos: false,
                fen: Some("not a fen".to_string()),
                moves: vec![],
            },
            &mut ctx,
        );
        assert!(err.is_err());
        let engine = lock_or_recover(&ctx.engine);
        assert_eq!(engine.position().to_fen(), FEN_STARTPOS);
    }

    #[test]
    fn test_position_illegal_move_keeps_prefix() {
        let mut ctx = context();
        let err = handle_command(
            UciCommand::Position {
                startpos: true,
                fen: None,
                moves: vec!["e2e4".to_string(), "e2e4".to_string()],
            },
            &mut ctx,
        );
        assert!(err.unwrap_err().to_string().contains("move 2"));
        let engine = lock_or_recover(&ctx.engine);
        assert_eq!(
            engine.position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_go_then_finish_returns_to_idle() {
        let mut ctx = context();
        go_depth(&mut ctx, 2);
        assert!(ctx.search_state.is_searching());
        assert_eq!(ctx.current_search_id, 1);

        ctx.finish_search(false).unwrap();
        assert_eq!(ctx.search_state, SearchState::Idle);
        assert!(ctx.worker_handle.is_none());
        assert!(ctx.pending_result.is_none());
    }

    #[test]
    fn test_second_go_finishes_previous_search() {
        let mut ctx = context();
        go_depth(&mut ctx, 3);
        go_depth(&mut ctx, 1);
        assert_eq!(ctx.current_search_id, 2);
        ctx.finish_search(false).unwrap();
        assert_eq!(ctx.search_state, SearchState::Idle);
    }

    #[test]
    fn test_infinite_search_waits_for_stop() {
        let mut ctx = context();
        let params = GoParams {
            infinite: true,
            ..GoParams::default()
        };
        handle_command(UciCommand::Go(params), &mut ctx).unwrap();
        assert!(ctx.current_search_infinite);

        handle_command(UciCommand::Stop, &mut ctx).unwrap();
        assert!(ctx.search_state.is_searching() || ctx.search_state == SearchState::Idle);
        ctx.finish_search(false).unwrap();
        assert_eq!(ctx.search_state, SearchState::Idle);
        // 次の go のために停止フラグはリセットされる
        go_depth(&mut ctx, 1);
        assert!(!ctx.stop_flag.load(Ordering::Relaxed));
        ctx.finish_search(false).unwrap();
    }

    #[test]
    fn test_stale_finished_message_is_ignored() {
        let mut ctx = context();
        ctx.current_search_id = 5;
        let result = SearchResult {
            best_move: rchess_core::Move::NONE,
            score: rchess_core::Value::ZERO,
            depth: 0,
            nodes: 0,
            pv: vec![],
        };
        ctx.handle_worker_message(WorkerMessage::Finished {
            result,
            search_id: 4,
        })
        .unwrap();
        assert_eq!(ctx.search_state, SearchState::Idle);
        assert!(ctx.pending_result.is_none());
    }

    #[test]
    fn test_setoption_and_newgame() {
        let mut ctx = context();
        handle_command(
            UciCommand::SetOption {
                name: "NullMoveMinDepth".to_string(),
                value: Some("4".to_string()),
            },
            &mut ctx,
        )
        .unwrap();
        assert_eq!(lock_or_recover(&ctx.engine).params().null_move_min_depth, 4);

        assert!(
            handle_command(
                UciCommand::SetOption {
                    name: "Ponder".to_string(),
                    value: Some("true".to_string()),
                },
                &mut ctx,
            )
            .is_err()
        );

        handle_command(UciCommand::UciNewGame, &mut ctx).unwrap();
    }
}
