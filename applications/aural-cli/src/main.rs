/// Aural - terminal media player driving the playback core
use aural_cli::{
    commands::{Command, HELP},
    engine::SimulatedEngine,
    probe::{FileProbe, TrackLoader},
    shell::{Reply, Shell},
    AppConfig,
};
use aural_playback::{
    render_channel, Collaborators, NotificationBus, PlaybackController, PlaybackSequence,
    PlayerNotification, Playlist, RepeatMode, ShuffleMode, TrackCatalog, TrackPrepCache,
};
use clap::{Parser, ValueEnum};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aural")]
#[command(about = "Play a list of audio files from the terminal", long_about = None)]
struct Cli {
    /// Files to load into the playlist
    files: Vec<PathBuf>,

    /// Configuration file path (default: ./aural.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial repeat mode
    #[arg(long, value_enum)]
    repeat: Option<RepeatArg>,

    /// Start with shuffle on
    #[arg(long)]
    shuffle: bool,

    /// Duration to assume for files whose length cannot be read
    #[arg(long, env = "AURAL_TRACK_SECS")]
    track_secs: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    One,
    All,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::One => RepeatMode::One,
            RepeatArg::All => RepeatMode::All,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aural=info,aural_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(repeat) = cli.repeat {
        config.playback.repeat = repeat.into();
    }
    if cli.shuffle {
        config.playback.shuffle = ShuffleMode::Random;
    }
    if let Some(secs) = cli.track_secs {
        config.player.fallback_track_secs = secs;
    }
    config.validate()?;

    run(&cli.files, &config)
}

fn run(files: &[PathBuf], config: &AppConfig) -> anyhow::Result<()> {
    let tick = Duration::from_millis(config.player.tick_millis);
    let loader = TrackLoader::new(Duration::from_secs(config.player.fallback_track_secs));

    let playlist = Arc::new(Playlist::new());
    for path in files {
        playlist.add(loader.load(path));
    }
    tracing::info!(tracks = playlist.size(), "Playlist loaded");

    let (render_tx, render_rx) = render_channel(config.playback.render_event_capacity);
    let bus = NotificationBus::new(config.playback.notification_capacity);
    let printer = spawn_printer(bus.subscribe())?;

    let controller = PlaybackController::new(
        Collaborators {
            sequence: Box::new(PlaybackSequence::new(
                playlist.size(),
                config.playback.sequence_modes(),
            )),
            catalog: playlist.clone(),
            prep_cache: Arc::new(TrackPrepCache::new(FileProbe::new(
                config.player.extensions.clone(),
            ))),
            engine: Box::new(SimulatedEngine::spawn(render_tx, tick)?),
            render_events: render_rx,
        },
        &config.playback,
        bus,
    )?;

    let mut shell = Shell::new(controller, playlist, loader);
    let lines = spawn_stdin_reader()?;

    println!("{HELP}");
    loop {
        match lines.recv_timeout(tick) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => match shell.execute(command) {
                        Ok(Reply::Print(text)) => println!("{text}"),
                        Ok(Reply::Quit) => break,
                        Err(err) => println!("Error: {err}"),
                    },
                    Err(err) => println!("{err}"),
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        shell.tick();
    }

    shell.shutdown();
    if printer.join().is_err() {
        tracing::warn!("Notification printer exited abnormally");
    }

    Ok(())
}

/// Print notifications until the bus closes
fn spawn_printer(notifications: Receiver<PlayerNotification>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("notifications".to_string())
        .spawn(move || {
            for notification in notifications {
                match notification {
                    PlayerNotification::TrackChanged(Some(track)) => {
                        println!("Now playing [{}] {}", track.index, track.track.title);
                    }
                    PlayerNotification::TrackChanged(None) => println!("End of playlist"),
                    PlayerNotification::PlaybackFailed(err) => {
                        println!("Could not play next track: {err}");
                    }
                }
            }
        })
}

/// Forward stdin lines; the channel disconnects at end of input
fn spawn_stdin_reader() -> std::io::Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::bounded(16);
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}
