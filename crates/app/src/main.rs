use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use quest_core::model::GameLayout;
use services::GameConfig;
use storage::{FileStore, InMemoryStore, KeyValueStore};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

const DEFAULT_STATE_DIR: &str = ".lfb-state";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStateDir { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStateDir { raw } => write!(f, "invalid --state-dir value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--state-dir <path>] [--memory] [--reduced-motion] [--no-animation]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --state-dir {DEFAULT_STATE_DIR}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LFB_STATE_DIR, LFB_REDUCED_MOTION=1, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    backend: Backend,
    reduced_motion: bool,
    animation_available: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            backend: Backend::File(PathBuf::from(DEFAULT_STATE_DIR)),
            reduced_motion: false,
            animation_available: true,
        }
    }
}

enum Parsed {
    Run(Args),
    Help,
}

impl Args {
    fn from_env() -> Self {
        let mut args = Self::default();
        if let Some(dir) = std::env::var("LFB_STATE_DIR").ok().filter(|value| !value.trim().is_empty()) {
            args.backend = Backend::File(PathBuf::from(dir));
        }
        args.reduced_motion = std::env::var("LFB_REDUCED_MOTION").is_ok_and(|value| is_truthy(&value));
        args
    }

    fn parse(mut self, args: &mut impl Iterator<Item = String>) -> Result<Parsed, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--state-dir" => {
                    let value = require_value(args, "--state-dir")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidStateDir { raw: value });
                    }
                    self.backend = Backend::File(PathBuf::from(value));
                }
                "--memory" => self.backend = Backend::Memory,
                "--reduced-motion" => self.reduced_motion = true,
                "--no-animation" => self.animation_available = false,
                "--help" | "-h" => return Ok(Parsed::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Parsed::Run(self))
    }

    fn config(&self) -> GameConfig {
        GameConfig::detect(self.animation_available, self.reduced_motion)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

struct DesktopApp {
    layout: GameLayout,
    config: GameConfig,
    store: Arc<dyn KeyValueStore>,
}

impl UiApp for DesktopApp {
    fn layout(&self) -> GameLayout {
        self.layout.clone()
    }

    fn config(&self) -> GameConfig {
        self.config.clone()
    }

    fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = match Args::from_env().parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })? {
        Parsed::Run(args) => args,
        Parsed::Help => {
            print_usage();
            return Ok(());
        }
    };

    init_tracing();

    let store: Arc<dyn KeyValueStore> = match &args.backend {
        Backend::File(dir) => Arc::new(FileStore::open(dir)?),
        Backend::Memory => Arc::new(InMemoryStore::new()),
    };
    let config = args.config();
    info!(backend = ?args.backend, motion = ?config.motion, "starting");

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        layout: GameLayout::standard(),
        config,
        store,
    });
    let context = build_app_context(&app);

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Leadership Quest")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
