mod actions;
mod app;
mod client;
mod config;
mod display;
mod gamepad;
mod motors;
mod surface;
mod telemetry;
mod ui;

use anyhow::Context;
use app::{App, AppEvent};
use clap::Parser;
use client::DeviceClient;
use config::{Config, DebugConfig};
use crossterm::{
    event::{Event as CrosstermEvent, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use gamepad::Gamepad;
use gilrs::Gilrs;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    fs::OpenOptions,
    io::{Stdout, stdout},
    path::PathBuf,
    sync::Mutex,
};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "quad_dashboard",
    version,
    about = "Attitude monitor and motor control console for a quadcopter rig"
)]
struct Cli {
    /// Path to the TOML config, created with defaults if missing
    #[arg(long, default_value = "dashboard.toml", value_name = "PATH")]
    config: PathBuf,

    /// Device base URL, overrides device.base_url
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Telemetry poll interval in milliseconds, overrides device.poll_interval_ms
    #[arg(long = "poll-ms", value_name = "MS")]
    poll_ms: Option<u64>,

    /// Run without gamepad support
    #[arg(long = "no-gamepad")]
    no_gamepad: bool,
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn init_logging(debug: &DebugConfig) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&debug.log_file)
        .with_context(|| format!("opening log file {}", debug.log_file))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&debug.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    mut gamepad: Option<Gamepad>,
    client: &DeviceClient,
    tx: &mpsc::UnboundedSender<AppEvent>,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    frame_rate: u64,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut frame_tick = tokio::time::interval(Duration::from_secs_f64(1.0 / frame_rate as f64));

    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            Some(event) = rx.recv() => {
                app.handle_event(event);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(request) = app.handle_key(key) {
                            app.dispatch(request, client, tx);
                        }
                    }
                    Some(Err(e)) => return Err(e).context("reading terminal events"),
                    None => app.running = false,
                    _ => {}
                }
            }
            _ = frame_tick.tick() => {
                if let Some(pad) = gamepad.as_mut() {
                    for action in pad.poll() {
                        if let Some(request) = app.apply_gamepad(action) {
                            app.dispatch(request, client, tx);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(url) = cli.url {
        config.device.base_url = url;
    }
    if let Some(poll_ms) = cli.poll_ms {
        config.device.poll_interval_ms = poll_ms;
    }
    if cli.no_gamepad {
        config.controls.joystick.enabled = false;
    }
    config.validate()?;

    init_logging(&config.debug)?;
    info!(url = %config.device.base_url, poll_ms = config.device.poll_interval_ms, "starting dashboard");

    let client = DeviceClient::new(&config.device.base_url)?;
    info!(endpoint = %client.data_url(), "polling telemetry");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let poller = {
        let client = client.clone();
        telemetry::spawn_poller(
            Duration::from_millis(config.device.poll_interval_ms),
            move || {
                let client = client.clone();
                async move { client.fetch_orientation().await }
            },
            tx.clone(),
        )
    };

    let gamepad = if config.controls.joystick.enabled {
        match Gilrs::new() {
            Ok(gilrs) => Some(Gamepad::new(gilrs, &config)),
            Err(e) => {
                warn!("gamepad support unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config);
    let result = run(
        &mut terminal,
        &mut app,
        gamepad,
        &client,
        &tx,
        &mut rx,
        config.display.frame_rate,
    )
    .await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    poller.abort();
    info!(commands = app.commands_sent, samples = app.samples_received, "dashboard closed");
    result
}
