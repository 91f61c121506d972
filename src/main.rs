use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use qte::{
    config::{ConfigStore, FileConfigStore, Preset, QteConfig},
    controller::{TickInput, WaveController},
    error::QteError,
    input::{is_quit, PressTracker},
    runtime::{CrosstermEventSource, QteEventSource, Runner, Step},
    ui::{GameView, TuiPresentation},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

/// quick-time-event key press minigame
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Clear timed waves of key press challenges before the countdown runs out. Waves cycle forever; press esc to quit."
)]
pub struct Cli {
    /// wave file to load (JSON)
    #[clap(short = 'w', long)]
    waves: Option<PathBuf>,

    /// built-in wave set to play
    #[clap(short = 'p', long, value_enum)]
    preset: Option<Preset>,

    /// only count presses while the mouse is over the key
    #[clap(long)]
    hover: bool,

    /// keys drift around the screen
    #[clap(long)]
    moving: bool,

    /// drift speed for moving keys
    #[clap(long)]
    speed: Option<f32>,

    /// milliseconds between game ticks
    #[clap(short = 't', long, default_value_t = 16)]
    tick_ms: u64,

    /// write logs to this file (RUST_LOG controls the level)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Load the wave set and apply flag overrides
    fn resolve_config(&self) -> Result<QteConfig, QteError> {
        let mut cfg = match (&self.waves, self.preset) {
            (Some(path), _) => FileConfigStore::with_path(path).load()?,
            (None, Some(preset)) => preset.try_load()?,
            (None, None) => FileConfigStore::new().load()?,
        };

        if self.hover {
            cfg.hover_gating = true;
        }
        if self.moving {
            cfg.keys_move_randomly = true;
        }
        if let Some(speed) = self.speed {
            cfg.keys_speed = speed;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(err) if err.is_configuration() => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err).exit();
        }
        Err(err) => return Err(err.into()),
    };
    let presentation = TuiPresentation::new(config.keys_move_randomly, config.keys_speed);
    let mut controller = WaveController::new(&config, presentation)?;
    tracing::info!(waves = config.waves.len(), hover = config.hover_gating, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(cli.tick_ms),
    );
    let result = run_game(&mut terminal, &mut controller, &mut runner);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_game<B: Backend, E: QteEventSource>(
    terminal: &mut Terminal<B>,
    controller: &mut WaveController<TuiPresentation>,
    runner: &mut Runner<E>,
) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    controller
        .presentation_mut()
        .resize(Rect::new(0, 0, size.width, size.height));
    controller.start_wave(0)?;

    let mut tracker = PressTracker::new();

    loop {
        match runner.step() {
            Step::Key(key) => {
                if is_quit(&key) {
                    break;
                }
                tracker.on_key(&key);
            }
            Step::Pointer(mouse) => {
                controller
                    .presentation_mut()
                    .set_pointer(mouse.column, mouse.row);
            }
            Step::Resize => {
                let size = terminal.size()?;
                controller
                    .presentation_mut()
                    .resize(Rect::new(0, 0, size.width, size.height));
            }
            Step::Frame(elapsed) => {
                let now = Instant::now();
                let input = TickInput {
                    pressed: tracker.drain(),
                    hovered: controller.presentation().hovered(),
                };
                let report = controller.tick(elapsed.as_secs_f64(), &input);
                if let Some(outcome) = report.resolved {
                    tracing::debug!(%outcome, next = controller.current_wave_index(), "tick resolved wave");
                }
                controller
                    .presentation_mut()
                    .update(elapsed.as_secs_f32(), now);

                terminal.draw(|f| f.render_widget(&GameView::new(controller, now), f.area()))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["qte"]);

        assert_eq!(cli.waves, None);
        assert_eq!(cli.preset, None);
        assert!(!cli.hover);
        assert!(!cli.moving);
        assert_eq!(cli.speed, None);
        assert_eq!(cli.tick_ms, 16);
        assert_eq!(cli.log_file, None);
    }

    #[test]
    fn test_cli_preset() {
        let cli = Cli::parse_from(["qte", "-p", "gauntlet"]);
        assert_eq!(cli.preset, Some(Preset::Gauntlet));

        let cli = Cli::parse_from(["qte", "--preset", "classic"]);
        assert_eq!(cli.preset, Some(Preset::Classic));
    }

    #[test]
    fn test_cli_rejects_unknown_preset() {
        assert!(Cli::try_parse_from(["qte", "--preset", "nightmare"]).is_err());
    }

    #[test]
    fn test_flags_override_preset() {
        let cli = Cli::parse_from(["qte", "-p", "classic", "--hover", "--moving", "--speed", "2.5"]);
        let cfg = cli.resolve_config().unwrap();
        assert!(cfg.hover_gating);
        assert!(cfg.keys_move_randomly);
        assert_eq!(cfg.keys_speed, 2.5);
    }

    #[test]
    fn test_negative_speed_is_rejected() {
        let cli = Cli::parse_from(["qte", "-p", "classic", "--speed=-1"]);
        assert!(matches!(
            cli.resolve_config(),
            Err(QteError::InvalidKeysSpeed(_))
        ));
    }

    #[test]
    fn test_wave_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waves.json");
        std::fs::write(
            &path,
            r#"{ "waves": [ { "time_limit_secs": 1.5, "keys": [ { "code": "k" } ] } ] }"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "qte".into(),
            "-p".into(),
            "gauntlet".into(),
            "-w".into(),
            path.clone().into_os_string(),
        ]);
        let cfg = cli.resolve_config().unwrap();
        assert_eq!(cfg.waves.len(), 1);
        assert_eq!(cfg.waves[0].time_limit_secs, 1.5);
    }

    #[test]
    fn test_missing_wave_file_is_fatal() {
        let cli = Cli::parse_from(["qte", "-w", "/definitely/not/here.json"]);
        assert!(matches!(cli.resolve_config(), Err(QteError::Io { .. })));
    }
}
