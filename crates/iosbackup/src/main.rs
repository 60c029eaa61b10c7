//! `iosbackup` station binary
//!
//! ```bash
//! iosbackup                       # wait for a phone and back it up
//! iosbackup boot-message          # owner card
//! iosbackup last-backup           # time of the newest backup
//! iosbackup unplug-notify         # "Backup interrupted at ..."
//! iosbackup --frames-dir /tmp/f   # also dump every frame as PNG
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use eink_emulator::Emulator;
use eink_specs::displays::WAVESHARE_2_13_V4;

use iosbackup::config::{self, Config, ConfigLocation};
use iosbackup::logging::{self, SessionLog};
use iosbackup::notice;
use iosbackup::process::{CommandBackupTool, CommandDeviceProbe, DfDiskUsage};
use iosbackup::{signals, RefreshController, RefreshSettings, Screen, Session, SessionContext};

#[derive(Parser)]
#[command(name = "iosbackup", about = "iOS backup station with e-paper status display", version)]
struct Cli {
    /// Config file (default: $IOSBACKUP_CONFIG, then /etc/iosbackup/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write every displayed frame to this directory as PNG
    #[arg(long, global = true)]
    frames_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a device and run one backup (default)
    Run,
    /// Show the owner card
    BootMessage,
    /// Show when the last backup was taken
    LastBackup,
    /// Show that a backup was interrupted
    UnplugNotify,
}

fn main() -> ExitCode {
    logging::init_tracing();
    match run(Cli::parse()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    tracing::info!("{}", platform::config::banner());
    let location = ConfigLocation::resolve(cli.config.as_deref());
    let config = config::load(&location).context("loading configuration")?;
    config.apply_env();

    let mut screen = open_screen(&config, cli.frames_dir.as_deref())?;
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_session(config, screen),
        Commands::BootMessage => {
            notice::show_notice(&mut screen, &notice::boot_notice(&config.owner_lines))?;
            Ok(0)
        }
        Commands::LastBackup => {
            let latest = notice::latest_backup_time(&config.backup_dir);
            notice::show_notice(&mut screen, &notice::last_backup_notice(latest))?;
            Ok(0)
        }
        Commands::UnplugNotify => {
            notice::show_notice(&mut screen, &notice::unplug_notice(Local::now(), &config.owner_lines))?;
            Ok(0)
        }
    }
}

/// The station ships without a transport-backed driver; frames go to the
/// headless emulator (and optionally to PNG files).
fn open_screen(config: &Config, frames_dir: Option<&Path>) -> Result<Screen<Emulator>> {
    let mut panel = Emulator::new(&WAVESHARE_2_13_V4).with_simulated_timing(true);
    if let Some(dir) = frames_dir {
        panel = panel
            .with_frame_dir(dir)
            .with_context(|| format!("creating frame directory {}", dir.display()))?;
    }
    let settings = RefreshSettings {
        partial_reset_threshold: config.partial_reset_threshold,
        busy_backoff: config.busy_backoff(),
        ..RefreshSettings::default()
    };
    Ok(Screen::new(RefreshController::new(panel, settings), config.orientation))
}

fn run_session(config: Config, screen: Screen<Emulator>) -> Result<u8> {
    let interrupt = signals::install().context("installing signal handlers")?;
    let ctx = SessionContext::new(config, interrupt);
    let cfg = &ctx.config;

    let log = SessionLog::open(&cfg.log_dir, Local::now(), true).unwrap_or_else(|e| {
        tracing::warn!(error = %e, dir = %cfg.log_dir.display(), "session log unavailable; output goes to stdout only");
        SessionLog::disabled(true)
    });

    let session = Session::new(
        &ctx,
        screen.into_shared(),
        CommandDeviceProbe::new(&cfg.device_list_command, &cfg.pair_command),
        CommandBackupTool::new(&cfg.backup_command, ctx.interrupt.clone()),
        DfDiskUsage::new(&cfg.disk_device),
        log,
    );
    let outcome = session.run();
    tracing::info!(?outcome, "session finished");
    Ok(outcome.exit_code())
}
