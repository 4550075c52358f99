use anyhow::{Context, Result};
use autokw_core::{AutomationEngine, Logger, ScreenCapture, SharedBuffer, Value};
use autokw_engines_common::simulated::{SimulatedEngine, SimulatedWindow};
use autokw_library::{KeywordLibrary, LibraryConfig, LIBRARY_NAME};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "autokw")]
#[command(about = "Keyword library over a GUI automation engine: list, run and serve keywords")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit diagnostics as JSON lines
    #[arg(long)]
    log_json: bool,

    /// TOML configuration file
    #[arg(short, long, env = "AUTOKW_CONFIG")]
    config: Option<PathBuf>,

    /// Automation engine to connect to
    #[arg(short, long, value_enum, default_value = "simulated", env = "AUTOKW_ENGINE")]
    engine: EngineKind,

    /// Directory screenshots are written under
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Default wait timeout in seconds
    #[arg(long)]
    timeout: Option<i64>,

    /// Capture the screen when a wait keyword fails
    #[arg(long)]
    capture_screen_on_error: bool,

    /// Open a window on the simulated desktop (repeatable)
    #[arg(long = "sim-window", value_name = "TITLE")]
    sim_windows: Vec<String>,

    /// Make a program launchable on the simulated desktop, optionally
    /// opening a window (repeatable)
    #[arg(long = "sim-program", value_name = "FILE[=TITLE]")]
    sim_programs: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// In-memory desktop, for dry runs
    Simulated,
    /// The local desktop: mouse, keyboard, Run and Sleep only. Window
    /// operations are not available, so the wait keywords and
    /// GetActiveWindowImage fail on this engine.
    Desktop,
}

#[derive(Subcommand)]
enum Commands {
    /// List the keyword catalog
    Keywords,

    /// Run a single keyword
    Run {
        /// Keyword name (e.g. "WinWait", "Run")
        keyword: String,

        /// Positional arguments
        args: Vec<String>,

        /// Keyword argument, as NAME=VALUE (repeatable)
        #[arg(long = "kw", value_name = "NAME=VALUE")]
        kwargs: Vec<String>,
    },

    /// Serve keyword requests as JSON lines on stdin/stdout
    Serve,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries keyword output.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Keywords => {
            let library = KeywordLibrary::builder(config, connect(&cli)?)
                .maybe_capture(screen_capture(cli.engine))
                .build()?;
            for name in library.keyword_names() {
                println!("{}", name);
            }
        }
        Commands::Run {
            keyword,
            args,
            kwargs,
        } => {
            let args: Vec<Value> = args.iter().map(|a| Value::parse_token(a)).collect();
            let kwargs = kwargs
                .iter()
                .map(|kw| parse_kwarg(kw))
                .collect::<Result<Vec<_>>>()?;

            let mut library = KeywordLibrary::builder(config, connect(&cli)?)
                .maybe_capture(screen_capture(cli.engine))
                .build()?;
            ensure_keyword(&library, keyword)?;
            let result = library
                .run_keyword(keyword, &args, &kwargs)
                .with_context(|| format!("Keyword '{}' failed", keyword))?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Commands::Serve => {
            let buffer = SharedBuffer::new();
            let mut library = KeywordLibrary::builder(config, connect(&cli)?)
                .maybe_capture(screen_capture(cli.engine))
                .logger(Logger::with_sink(LIBRARY_NAME, Box::new(buffer.clone())))
                .build()?;
            eprint!("{}", buffer.take());

            tracing::info!(engine = ?cli.engine, "Serving keyword requests");
            let answered =
                autokw_library::serve(&mut library, &buffer, io::stdin().lock(), io::stdout().lock())?;
            tracing::info!(answered, "Request stream closed");
        }
    }

    Ok(())
}

/// File configuration (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<LibraryConfig> {
    let mut config = match &cli.config {
        Some(path) => LibraryConfig::load(path)
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => LibraryConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    if cli.capture_screen_on_error {
        config.capture_screen_on_error = true;
    }
    config.validate()?;
    Ok(config)
}

fn connect(cli: &Cli) -> Result<Box<dyn AutomationEngine>> {
    match cli.engine {
        EngineKind::Simulated => Ok(Box::new(simulated_desktop(
            &cli.sim_windows,
            &cli.sim_programs,
        ))),
        EngineKind::Desktop => {
            let engine = autokw_engines_desktop::connect()
                .context("Connecting to the desktop automation engine")?;
            Ok(engine)
        }
    }
}

fn screen_capture(engine: EngineKind) -> Option<Box<dyn ScreenCapture>> {
    match engine {
        EngineKind::Simulated => None,
        EngineKind::Desktop => autokw_engines_desktop::screen_capture(),
    }
}

/// Build a simulated desktop from `--sim-window` and `--sim-program` values.
fn simulated_desktop(windows: &[String], programs: &[String]) -> SimulatedEngine {
    let mut engine = SimulatedEngine::default();
    for title in windows {
        engine.open_window(SimulatedWindow::new(title, ""));
    }
    for program in programs {
        match program.split_once('=') {
            Some((file, title)) => {
                engine.register_program(file, Some(SimulatedWindow::new(title, "")))
            }
            None => engine.register_program(program, None),
        }
    }
    engine
}

/// Reject a keyword the library can neither run natively nor forward.
fn ensure_keyword<E: AutomationEngine>(library: &KeywordLibrary<E>, keyword: &str) -> Result<()> {
    if !library.has_keyword(keyword) {
        anyhow::bail!(
            "No keyword with name '{}' found; `autokw keywords` lists the catalog",
            keyword
        );
    }
    Ok(())
}

/// Parse a `NAME=VALUE` keyword argument.
fn parse_kwarg(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", raw))?;
    if name.is_empty() {
        anyhow::bail!("Keyword argument name is empty in '{}'", raw);
    }
    Ok((name.to_string(), Value::parse_token(value)))
}
