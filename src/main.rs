//! Flick drawer replay - plays a touch scenario against the bottom drawer
//!
//! Features:
//! - Fast-forward replay on simulated frame time (default)
//! - Real-time replay on a calloop frame timer (`--realtime`)
//! - Plain text or JSON report

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_drawer::replay::{Replay, ReplayReport, Scenario};
use flick_drawer::DrawerConfig;

#[derive(Parser, Debug)]
#[command(name = "flick-drawer")]
#[command(about = "Replay touch scenarios against the Flick bottom drawer", long_about = None)]
struct Args {
    /// Scenario file (TOML)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Drawer config file (TOML); stock values when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Play the scenario in real time on a frame timer
    #[arg(short, long)]
    realtime: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,
}

/// Event loop state for a real-time replay
struct RealtimeState {
    replay: Replay,
    start: Instant,
    running: bool,
}

fn run_realtime(replay: Replay) -> Result<ReplayReport> {
    let frame = replay.scenario().frame();
    let mut event_loop: EventLoop<RealtimeState> = EventLoop::try_new()?;

    event_loop
        .handle()
        .insert_source(Timer::immediate(), move |_, _, state| {
            let now = state.start.elapsed();
            if state.replay.advance(now) {
                TimeoutAction::ToDuration(frame)
            } else {
                state.running = false;
                TimeoutAction::Drop
            }
        })
        .map_err(|e| anyhow::anyhow!("Failed to insert frame timer: {:?}", e))?;

    let mut state = RealtimeState {
        replay,
        start: Instant::now(),
        running: true,
    };

    info!(frame_ms = frame.as_millis() as u64, "Entering replay loop");
    while state.running {
        event_loop
            .dispatch(Some(Duration::from_millis(1)), &mut state)
            .map_err(|e| anyhow::anyhow!("Event loop error: {:?}", e))?;
    }
    Ok(state.replay.report(state.start.elapsed()))
}

/// Replay state directory: `$XDG_STATE_HOME/flick-drawer`, falling back to
/// `~/.local/state` and then `/tmp`
///
/// Kept apart from the compositor's `flick/` directory so replay runs never
/// rotate compositor logs away.
fn state_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("flick-drawer")
}

fn main() -> Result<()> {
    let log_dir = state_dir();
    std::fs::create_dir_all(&log_dir).ok();

    // A replay that panics mid-scenario leaves its stamp next to drawer.log
    let crash_log = log_dir.join("crash.log");
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&crash_log)
        {
            use std::io::Write;
            let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
        }
    }));

    let args = Args::parse();

    // Settle and arbitration traces land in drawer.log; stdout stays free for
    // the report so --json output can be piped
    let file_appender = rolling::daily(&log_dir, "drawer.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Transitions and settles at info; --debug adds every arbitration decision
    let default_filter = if args.debug {
        "debug,flick_drawer=debug"
    } else {
        "warn,flick_drawer=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(log_path = %log_dir.display(), "Flick drawer replay starting");

    let config = DrawerConfig::load_or_default(args.config.as_deref())
        .context("Failed to load drawer config")?;
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    let replay = Replay::new(scenario, config).context("Failed to set up replay")?;

    let report = if args.realtime {
        run_realtime(replay)?
    } else {
        replay.run_to_end()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    if report.expectation_met == Some(false) {
        bail!("Scenario {} ended in an unexpected state", report.scenario);
    }
    Ok(())
}
