// UCI (Universal Chess Interface) front end

mod command_handler;
mod offline;
mod options;
mod state;
mod stdin_reader;
mod uci;
mod worker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use command_handler::{CommandContext, handle_command};
use crossbeam_channel::{select, unbounded};
use rchess_core::eval::EvalParams;
use rchess_core::search::Engine;
use rchess_core::tt::DEFAULT_TT_MB;
use std::path::PathBuf;
use stdin_reader::{InputEvent, spawn_stdin_reader};
use uci::{UciCommand, send_info_string};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Transposition table size in MiB
    #[arg(long, value_name = "MB", default_value_t = DEFAULT_TT_MB)]
    hash: usize,

    /// Evaluation model (JSON weight file)
    #[arg(long, value_name = "FILE")]
    eval_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count leaf nodes of the legal move tree
    Perft {
        /// Root position (defaults to the initial position)
        #[arg(long)]
        fen: Option<String>,
        #[arg(long, default_value_t = 5)]
        depth: u32,
        /// Print the node count below each root move
        #[arg(long)]
        divide: bool,
    },
    /// Fixed-depth search over built-in positions
    Bench {
        #[arg(long, default_value_t = 8)]
        depth: i32,
    },
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    use std::io::Write;
    let log_level = if args.debug { "debug" } else { "info" };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    );
    builder
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .write_style(env_logger::WriteStyle::Never)
        // stdout は UCI 専用
        .target(env_logger::Target::Stderr)
        .init();

    let outcome = match &args.command {
        Some(Commands::Perft { fen, depth, divide }) => {
            offline::run_perft(fen.as_deref(), *depth, *divide)
        }
        Some(Commands::Bench { depth }) => offline::run_bench(*depth),
        None => build_engine(&args).and_then(run_engine),
    };

    if let Err(e) = outcome {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn build_engine(args: &Args) -> Result<Engine> {
    let mut engine = Engine::new(args.hash.max(1));
    if let Some(path) = &args.eval_file {
        let params = EvalParams::load_model(path)
            .with_context(|| format!("failed to load eval file {}", path.display()))?;
        engine.set_eval_params(params);
        log::info!("evaluation model loaded from {}", path.display());
    }
    Ok(engine)
}

fn run_engine(engine: Engine) -> Result<()> {
    let mut ctx = CommandContext::new(engine);
    let worker_rx = ctx.worker_rx.clone();

    let (input_tx, input_rx) = unbounded::<InputEvent>();
    // stdin の読み取りはブロックするので join しない
    let _stdin_handle = spawn_stdin_reader(input_tx);

    // Main event loop - process UCI commands and worker messages concurrently
    loop {
        select! {
            recv(input_rx) -> event => {
                match event {
                    Ok(InputEvent::Command(UciCommand::Quit)) => {
                        log::debug!("quit received");
                        ctx.finish_search(true)?;
                        break;
                    }
                    Ok(InputEvent::Command(cmd)) => {
                        log::debug!("UCI command received: {cmd:?}");
                        if let Err(e) = handle_command(cmd, &mut ctx) {
                            log::warn!("{e:#}");
                            send_info_string(format!("{e:#}"))?;
                        }
                    }
                    Ok(InputEvent::Closed) | Err(_) => {
                        log::debug!("input closed");
                        ctx.drain()?;
                        break;
                    }
                }
            }
            recv(worker_rx) -> msg => {
                match msg {
                    Ok(msg) => ctx.handle_worker_message(msg)?,
                    Err(_) => log::debug!("Worker channel closed"),
                }
            }
        }
    }

    log::debug!("Shutdown complete");
    Ok(())
}
