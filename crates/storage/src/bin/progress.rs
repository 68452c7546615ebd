use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quest_core::model::{ProgressState, ScreenId, TaskId, format_title};
use storage::{FileStore, KeyValueStore, PROGRESS_KEY, ProgressStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Show,
    Reset,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "show" => Some(Self::Show),
            "reset" => Some(Self::Reset),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    command: Command,
    state_dir: PathBuf,
    screen: Option<ScreenId>,
    task: Option<TaskId>,
    complete: Vec<TaskId>,
}

#[derive(Debug)]
enum ArgsError {
    MissingCommand,
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "expected one of: show, reset, seed"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut args = std::env::args().skip(1);
        let first = args.next().ok_or(ArgsError::MissingCommand)?;
        if first == "--help" || first == "-h" {
            print_usage();
            std::process::exit(0);
        }
        let command = Command::from_arg(&first).ok_or(ArgsError::UnknownArg(first))?;

        let mut state_dir = std::env::var("LFB_STATE_DIR")
            .map_or_else(|_| PathBuf::from(".lfb-state"), PathBuf::from);
        let mut screen = None;
        let mut task = None;
        let mut complete = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--state-dir" => {
                    state_dir = PathBuf::from(require_value(&mut args, "--state-dir")?);
                }
                "--screen" => {
                    let raw = require_value(&mut args, "--screen")?;
                    screen = Some(ScreenId::new(raw.as_str()).map_err(|_| {
                        ArgsError::InvalidId {
                            flag: "--screen",
                            raw,
                        }
                    })?);
                }
                "--task" => {
                    let raw = require_value(&mut args, "--task")?;
                    task = Some(TaskId::new(raw.as_str()).map_err(|_| ArgsError::InvalidId {
                        flag: "--task",
                        raw,
                    })?);
                }
                "--complete" => {
                    let raw = require_value(&mut args, "--complete")?;
                    for part in raw.split(',') {
                        let id = TaskId::new(part).map_err(|_| ArgsError::InvalidId {
                            flag: "--complete",
                            raw: raw.clone(),
                        })?;
                        complete.push(id);
                    }
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            command,
            state_dir,
            screen,
            task,
            complete,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin progress -- <show|reset|seed> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --state-dir <path>        Store directory (default: .lfb-state)");
    eprintln!("  --screen <id>             seed: current screen");
    eprintln!("  --task <id>               seed: current task");
    eprintln!("  --complete <id,id,...>    seed: tasks to mark completed");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LFB_STATE_DIR");
}

fn describe(state: &ProgressState) {
    println!("screen:    {}", state.current_screen());
    match state.current_task_id() {
        Some(task) => println!("task:      {task}"),
        None => println!("task:      -"),
    }
    println!("progress:  {}", format_title(state.completed_count()));
    for (task, done) in state.completed() {
        println!("  {task}: {done}");
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let backend = Arc::new(FileStore::open(&args.state_dir)?);
    let progress = ProgressStore::new(backend.clone(), ScreenId::start());

    match args.command {
        Command::Show => describe(&progress.load()),
        Command::Reset => {
            backend.remove(PROGRESS_KEY)?;
            println!("reset {}", args.state_dir.display());
        }
        Command::Seed => {
            let mut state = progress.load();
            if let Some(screen) = args.screen {
                state.set_current_screen(screen);
            }
            if let Some(task) = args.task {
                state.set_current_task(task);
            }
            for task in &args.complete {
                state.mark_completed(task);
            }
            progress.save(&state);
            describe(&progress.load());
        }
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
