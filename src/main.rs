mod ui;

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    io::{self, stdin},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;
use vocaclip::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    export::ExportSummary,
    mpv::MpvPlayer,
    player::MediaPlayer,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::{Advance, Session},
    word::load_words,
};

const MIN_POLL_MS: u64 = 10;

/// replay subtitle-aligned video clips and keep the words you still need to learn
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Plays the clip around each word's subtitle cue in mpv, lets you mark whether you already knew the word, and writes every word you did not mark as known to <words>_filtered.json."
)]
pub struct Cli {
    /// video the word timestamps refer to (defaults to the last one used)
    #[clap(short = 'v', long)]
    video: Option<PathBuf>,

    /// JSON word list to go through (defaults to the last one used)
    #[clap(short = 'w', long)]
    words: Option<PathBuf>,

    /// mpv executable to launch
    #[clap(long)]
    mpv: Option<String>,

    /// path of the mpv IPC socket (named pipe on Windows)
    #[clap(long)]
    ipc: Option<String>,

    /// how often to check whether a clip reached its end, in milliseconds
    #[clap(long, value_parser = clap::value_parser!(u64).range(MIN_POLL_MS..=1000))]
    poll_ms: Option<u64>,

    /// read and remember settings in this file instead of the per-user config
    #[clap(long)]
    config: Option<PathBuf>,
}

/// Everything needed to run one session, after merging CLI flags over the config
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub video: PathBuf,
    pub words: PathBuf,
    pub mpv_binary: String,
    pub ipc_endpoint: String,
    pub poll_interval_ms: u64,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Flags win over the config; the input files fall back to the last ones used
    fn to_run_settings(&self, cfg: &Config) -> Result<RunSettings, String> {
        let video = self.video.clone().or_else(|| cfg.last_video.clone());
        let words = self.words.clone().or_else(|| cfg.last_words.clone());
        let (video, words) = match (video, words) {
            (Some(video), Some(words)) => (video, words),
            (None, Some(_)) => return Err("no video given; pass --video <PATH>".to_string()),
            (Some(_), None) => return Err("no word list given; pass --words <PATH>".to_string()),
            (None, None) => {
                return Err("pass --video <PATH> and --words <PATH> to start".to_string())
            }
        };

        Ok(RunSettings {
            video,
            words,
            mpv_binary: self.mpv.clone().unwrap_or_else(|| cfg.mpv_binary.clone()),
            ipc_endpoint: self.ipc.clone().unwrap_or_else(|| cfg.ipc_endpoint.clone()),
            poll_interval_ms: self
                .poll_ms
                .unwrap_or(cfg.poll_interval_ms)
                .max(MIN_POLL_MS),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Reviewing,
    Done(ExportSummary),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<P: MediaPlayer> {
    pub session: Session<P>,
    pub state: AppState,
    pub status: Option<String>,
}

impl<P: MediaPlayer> App<P> {
    pub fn new(session: Session<P>) -> Self {
        Self {
            session,
            state: AppState::Reviewing,
            status: None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.quit();
        }
        if let AppState::Done(_) = self.state {
            return Flow::Quit;
        }

        let outcome = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return self.quit(),
            KeyCode::Char('k') => self.session.mark(true),
            KeyCode::Char('d') => self.session.mark(false),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => {
                self.session.prev().map(|_| ())
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Char(' ') => {
                self.session.next().map(|advance| {
                    if let Advance::Finished(summary) = advance {
                        self.state = AppState::Done(summary);
                    }
                })
            }
            KeyCode::Char('r') => self.session.replay(),
            _ => return Flow::Continue,
        };

        match outcome {
            Ok(()) => self.status = None,
            Err(e) => self.report(e),
        }
        Flow::Continue
    }

    /// Polls the clip watch. Returns true when the screen needs a redraw.
    pub fn on_tick(&mut self) -> bool {
        match self.session.tick() {
            Ok(paused) => paused,
            Err(e) => {
                let message = e.to_string();
                if self.status.as_deref() == Some(message.as_str()) {
                    return false;
                }
                self.report(e);
                true
            }
        }
    }

    fn report(&mut self, e: vocaclip::Error) {
        tracing::warn!(error = %e, "action failed");
        self.status = Some(e.to_string());
    }

    fn quit(&self) -> Flow {
        if self.state == AppState::Reviewing {
            tracing::info!("quit before finishing, nothing saved");
        }
        Flow::Quit
    }
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = AppDirs::log_dir()?;
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "vocaclip.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vocaclip=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;

    tracing::info!("vocaclip v{} starting", env!("CARGO_PKG_VERSION"));
    Some(guard)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    let store = cli.config_store();
    let mut config = store.load();
    let settings = match cli.to_run_settings(&config) {
        Ok(settings) => settings,
        Err(msg) => Cli::command()
            .error(ErrorKind::MissingRequiredArgument, msg)
            .exit(),
    };

    let words = load_words(&settings.words)
        .with_context(|| format!("could not load word list {}", settings.words.display()))?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    config.last_video = Some(settings.video.clone());
    config.last_words = Some(settings.words.clone());
    if let Err(e) = store.save(&config) {
        tracing::warn!(path = %store.path().display(), error = %e, "could not remember inputs");
    }

    let player = MpvPlayer::launch(&settings.mpv_binary, &settings.ipc_endpoint)
        .with_context(|| format!("could not start {}", settings.mpv_binary))?;
    let session = Session::start(
        words,
        settings.words.clone(),
        settings.video.clone(),
        player,
    )
    .with_context(|| format!("could not play {}", settings.video.display()))?;
    let mut app = App::new(session);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_millis(settings.poll_interval_ms),
    );
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    match &app.state {
        AppState::Done(summary) => println!(
            "Saved {} of {} words to {}",
            summary.kept,
            summary.total,
            summary.path.display()
        ),
        AppState::Reviewing => println!("Session closed before the last word; nothing saved."),
    }

    Ok(())
}

fn start_tui<B: Backend, E: EventSource, T: Ticker, P: MediaPlayer>(
    terminal: &mut Terminal<B>,
    app: &mut App<P>,
    runner: &mut Runner<E, T>,
) -> io::Result<()> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui<P: MediaPlayer>(app: &App<P>, f: &mut Frame) {
    f.render_widget(app, f.area());
}
