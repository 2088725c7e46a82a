use crossterm::{
    cursor::{Hide, Show as ShowCursor},
    event::{self, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::env;
use std::fs::File;
use std::io::{stdout, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use skyburst::canvas::Canvas;
use skyburst::config::{parse_hex_color, HexColor, ShowConfig};
use skyburst::display::Presenter;
use skyburst::fireworks::Show;
use skyburst::{Error, Result};

const MAX_CATCH_UP_STEPS: f32 = 3.0;

fn print_usage() {
    eprintln!("skyburst - Terminal fireworks with shaped bursts");
    eprintln!();
    eprintln!("Usage: skyburst [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config PATH      Load show settings from a TOML file");
    eprintln!("  --seed N           Seed the random source for a repeatable show");
    eprintln!("  --classic          Only the six original shapes, with their faster fade");
    eprintln!("  --bg-color RRGGBB  Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --log PATH         Write diagnostics to PATH (filter with RUST_LOG)");
    eprintln!();
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

#[derive(Default)]
struct Options {
    config: Option<PathBuf>,
    seed: Option<u64>,
    classic: bool,
    bg_color: Option<(u8, u8, u8)>,
    log: Option<PathBuf>,
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("{flag} requires a value");
            std::process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                options.config = Some(PathBuf::from(value_of(args, i, "--config")));
                i += 2;
            }
            "--seed" => {
                let value = value_of(args, i, "--seed");
                match value.parse::<u64>() {
                    Ok(seed) => options.seed = Some(seed),
                    Err(_) => {
                        eprintln!("Invalid seed: {value}");
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--bg-color" => {
                let value = value_of(args, i, "--bg-color");
                if let Some(color) = parse_hex_color(value) {
                    options.bg_color = Some(color);
                    i += 2;
                } else {
                    eprintln!("Invalid hex color: {value}");
                    eprintln!("Expected format: RRGGBB (e.g., 1a1b26)");
                    std::process::exit(1);
                }
            }
            "--log" => {
                options.log = Some(PathBuf::from(value_of(args, i, "--log")));
                i += 2;
            }
            "--classic" => {
                options.classic = true;
                i += 1;
            }
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => {
                eprintln!("Unknown option: {arg}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    options
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::OpenLog {
        path: path.to_path_buf(),
        source,
    })?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(config: ShowConfig) -> Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    let (cols, rows) = terminal::size()?;
    let (width, height) = (cols as usize, rows as usize * 2);
    let fixed_dt = 1.0 / config.fps as f32;
    let mut canvas = Canvas::new(width, height, config.background.0);
    let mut show = Show::new(config, width, height)?;
    let mut presenter = Presenter::new(&canvas);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let result = (|| -> Result<()> {
        let mut last_frame = Instant::now();
        let mut accumulator = 0.0f32;

        loop {
            if event::poll(Duration::from_millis(1))? {
                match event::read()? {
                    Event::Key(key_event) => {
                        if key_event.code == KeyCode::Char('q')
                            || key_event.code == KeyCode::Esc
                            || (key_event.code == KeyCode::Char('c')
                                && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                        {
                            break;
                        }
                    }
                    Event::Resize(cols, rows) => {
                        let (width, height) = (cols as usize, rows as usize * 2);
                        canvas.resize(width, height);
                        show.resize(width, height);
                        execute!(stdout, Clear(ClearType::All))?;
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            accumulator += now.duration_since(last_frame).as_secs_f32();
            last_frame = now;
            if accumulator > fixed_dt * MAX_CATCH_UP_STEPS {
                accumulator = fixed_dt * MAX_CATCH_UP_STEPS;
            }

            if accumulator < fixed_dt {
                continue;
            }
            while accumulator >= fixed_dt {
                show.frame(&mut canvas);
                accumulator -= fixed_dt;
            }

            presenter.present(&canvas, &mut stdout)?;
        }
        Ok(())
    })();

    execute!(stdout, ShowCursor, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    info!(launched = show.launched(), "show finished");
    result
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    if let Some(path) = &options.log {
        if let Err(e) = init_logging(path) {
            eprintln!("skyburst: {e}");
            std::process::exit(1);
        }
    }

    let config = match &options.config {
        Some(path) => ShowConfig::load_from(path),
        None => Ok(ShowConfig::default()),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("skyburst: {e}");
            std::process::exit(1);
        }
    };

    if options.classic {
        config = config.classic();
    }
    if let Some(seed) = options.seed {
        config.seed = Some(seed);
    }
    if let Some(color) = options.bg_color {
        config.background = HexColor(color);
    }

    info!(seed = ?config.seed, "skyburst starting");
    if let Err(e) = run(config) {
        error!("{e}");
        eprintln!("skyburst: {e}");
        std::process::exit(1);
    }
}
