//! termaccess - inspect terminal output the way the screen reader sees it
//!
//! # Usage
//!
//! ```text
//! termaccess strip build.log          # output without escape sequences
//! termaccess describe --spans out.txt # attributes of every styled run
//! termaccess locate --offset 120 log  # screen position of a character offset
//! termaccess profiles                 # list application profiles
//! termaccess profiles --export vim    # print a profile as TOML
//! ```
//!
//! Input is read from stdin when no file is given. Logs go to
//! `~/.termaccess/termaccess.log`; set `RUST_LOG` to change the level.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use termaccess::position::{Bookmark, BoundTerminal, ProbeError};
use termaccess::{AnsiParser, AttributeFormat, Config, PositionCalculator, ProfileManager};

#[derive(Parser, Debug)]
#[command(name = "termaccess", version)]
#[command(about = "Inspect terminal output the way a screen reader sees it")]
struct Cli {
    /// Configuration file (defaults to ~/.termaccess/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the input with escape sequences removed
    Strip { file: Option<PathBuf> },
    /// Describe text attributes
    Describe {
        file: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Describe every styled run instead of only the final state
        #[arg(long)]
        spans: bool,
    },
    /// Screen position of a character offset
    Locate {
        #[arg(long)]
        offset: usize,
        file: Option<PathBuf>,
    },
    /// List or export application profiles
    Profiles {
        #[arg(long, value_name = "APP")]
        export: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Brief,
    Detailed,
}

impl From<FormatArg> for AttributeFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Brief => AttributeFormat::Brief,
            FormatArg::Detailed => AttributeFormat::Detailed,
        }
    }
}

/// A fixed buffer standing in for a live terminal
struct StaticTerminal {
    text: String,
}

impl BoundTerminal for StaticTerminal {
    fn id(&self) -> u64 {
        0
    }

    fn text_before(&self, bookmark: &Bookmark) -> Result<String, ProbeError> {
        Ok(self.text.chars().take(bookmark.offset).collect())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };
    info!(command = ?cli.command, "termaccess starting");

    match cli.command {
        Commands::Strip { file } => {
            print!("{}", AnsiParser::strip_ansi(&read_input(file.as_deref())?));
        }
        Commands::Describe { file, format, spans } => {
            let input = read_input(file.as_deref())?;
            let format = format.map_or(config.attribute_format, AttributeFormat::from);
            let mut parser = AnsiParser::new();
            if spans {
                for span in parser.spans(&input) {
                    let attrs = span.style.describe(format);
                    let attrs = if attrs.is_empty() { "plain".to_string() } else { attrs };
                    println!("{:?}: {}", span.text, attrs);
                }
            } else {
                parser.parse(&input);
                println!("{}", parser.format_attributes(format));
            }
        }
        Commands::Locate { offset, file } => {
            let text = AnsiParser::strip_ansi(&read_input(file.as_deref())?);
            let length = text.chars().count();
            if offset > length {
                bail!("offset {} is past the end of the input ({} characters)", offset, length);
            }
            let terminal: Arc<dyn BoundTerminal> = Arc::new(StaticTerminal { text });
            let calculator = PositionCalculator::default();
            let pos = calculator.calculate(Some(&Bookmark::new(0, offset)), Some(terminal.as_ref()));
            println!("{}", pos);
        }
        Commands::Profiles { export } => {
            let manager = ProfileManager::with_custom(config.profiles.iter().cloned());
            match export {
                Some(name) => print!("{}", manager.export(&name)?),
                None => {
                    for profile in manager.profiles() {
                        let origin = if manager.is_builtin(&profile.app_name) { "built-in" } else { "custom" };
                        println!("{:<12} {:<20} {}", profile.app_name, profile.display_name, origin);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Log to `~/.termaccess/termaccess.log`; skipped if the file cannot be opened
fn init_logging() {
    let log_path = termaccess::config::Config::config_path()
        .and_then(|p| p.parent().map(|dir| dir.join("termaccess.log")))
        .unwrap_or_else(|| PathBuf::from("termaccess.log"));

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input).context("reading stdin")?;
            Ok(input)
        }
    }
}
