//! `cms-preview` command-line entry point.
//!
//! Inspects the configuration and replays recorded frame events through the
//! real preview controller, backed by the in-memory document adapters.
//!
//! ```text
//! cms-preview devices                      -- list the device catalog
//! cms-preview check-config                 -- validate the config file
//! cms-preview replay trace.jsonl           -- relay frame events, print host events
//! ```
//!
//! # Replay traces
//!
//! One JSON frame event per line:
//!
//! ```json
//! {"kind":"pointerover","target":{"key":"plugin-1","is_plugin":true},"client_x":10,"client_y":15}
//! {"kind":"keydown","key":"Shift"}
//! ```
//!
//! Every event dispatched on the host is printed as one JSON line.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cms_preview::application::context::{KeyValueStore, PreviewContext};
use cms_preview::application::preview::ResponsivePreview;
use cms_preview::application::relay::FrameEvent;
use cms_preview::infrastructure::dom::mock::MockDom;
use cms_preview::infrastructure::storage::config::{self, AppConfig};
use cms_preview::infrastructure::storage::store::{JsonFileStore, MemoryStore};
use cms_preview_core::FrameOffset;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "cms-preview", version, about = "CMS responsive preview tools")]
struct Cli {
    /// Config file.  Defaults to the platform config directory.
    #[arg(long, env = "CMS_PREVIEW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the device catalog.
    Devices,
    /// Load and validate the configuration.
    CheckConfig,
    /// Relay recorded frame events and print the resulting host events.
    Replay {
        /// JSON-lines trace of frame events.
        trace: PathBuf,
        /// Device to select before replaying.
        #[arg(long)]
        device: Option<String>,
        /// Page offset of the preview wrapper in the host document.
        #[arg(long, default_value_t = 0.0)]
        offset_left: f64,
        #[arg(long, default_value_t = 0.0)]
        offset_top: f64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("failed to load configuration")?;

    // Level from the config file, overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.preview.log_level)),
        )
        .init();

    match cli.command {
        Command::Devices => list_devices(&cfg),
        Command::CheckConfig => check_config(&cfg),
        Command::Replay {
            trace,
            device,
            offset_left,
            offset_top,
        } => {
            replay(
                &cfg,
                &trace,
                device.as_deref(),
                FrameOffset::new(offset_left, offset_top),
            )
            .await
        }
    }
}

fn list_devices(cfg: &AppConfig) -> anyhow::Result<()> {
    let catalog = cfg.catalog()?;
    let mut out = std::io::stdout().lock();
    for device in catalog.iter() {
        writeln!(out, "{:<16} {:>6} x {:<6}", device.name, device.width, device.height)?;
    }
    Ok(())
}

fn check_config(cfg: &AppConfig) -> anyhow::Result<()> {
    let catalog = cfg.catalog()?;
    let timings = cfg.timings();
    info!(
        devices = catalog.len(),
        settle_ms = timings.settle_delay.as_millis() as u64,
        transition_ms = timings.transition.as_millis() as u64,
        "configuration valid"
    );
    println!(
        "ok: {} devices, default {:?}, expand key {:?}",
        catalog.len(),
        catalog.default_device().name,
        cfg.preview.expand_key
    );
    Ok(())
}

fn open_store(cfg: &AppConfig) -> Arc<dyn KeyValueStore> {
    match &cfg.storage.path {
        Some(path) => {
            debug!(path = %path.display(), "using file store");
            Arc::new(JsonFileStore::new(path))
        }
        None => Arc::new(MemoryStore::new()),
    }
}

async fn replay(
    cfg: &AppConfig,
    trace: &Path,
    device: Option<&str>,
    offset: FrameOffset,
) -> anyhow::Result<()> {
    let file = std::fs::File::open(trace)
        .with_context(|| format!("failed to open trace {}", trace.display()))?;

    let dom = MockDom::new("<html><body></body></html>");
    dom.resizer_view.set_wrapper_offset(offset);
    let ctx = PreviewContext::new(open_store(cfg), cfg.catalog()?)
        .with_timings(cfg.timings())
        .with_settings(cfg.settings());
    let mut preview = ResponsivePreview::new(ctx, dom.ports());

    preview.open().await?;
    if let Some(name) = device {
        preview.click_device(name)?;
    }
    preview.settle_frame().await;

    let mut out = std::io::stdout().lock();
    let mut relayed = 0;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: FrameEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid frame event on line {}", line_no + 1))?;
        let outcome = preview.handle_frame_event(&event);
        debug!(line = line_no + 1, ?outcome, "frame event handled");

        for host_event in dom.host.dispatched().iter().skip(relayed) {
            writeln!(out, "{}", serde_json::to_string(host_event)?)?;
        }
        relayed = dom.host.dispatched().len();
    }

    preview.close();
    info!(relayed, "replay finished");
    Ok(())
}
