//! wtail - Terminal Tail Viewer
//!
//! Follows a growing log file with rotation detection, regex filtering and a scrollable view.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use wtail::render::ui::{ColorTheme, TerminalUI};
use wtail::{Application, ConfigOverrides, OpenMode, TailConfig, ThemeName};

fn cli() -> Command {
    Command::new("wtail")
        .version(wtail::VERSION)
        .about("Follow a growing log file in the terminal")
        .long_about(
            "wtail shows the last lines of a file and keeps appending new ones as the file \
             grows. Truncation and rotation are detected and reading restarts from the \
             beginning. Compressed files (gzip, bzip2, xz, zstd) open as one-time snapshots.",
        )
        .arg(
            Arg::new("file")
                .help("Path to the log file to follow")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("lines")
                .short('n')
                .long("lines")
                .help("Number of lines to load from the end of the file on open")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-lines")
                .long("max-lines")
                .help("Maximum number of lines kept in memory (200..=200000)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .help("Polling period in milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("filter")
                .short('f')
                .long("filter")
                .help("Case-insensitive regex; only matching lines are shown"),
        )
        .arg(
            Arg::new("wrap")
                .short('w')
                .long("wrap")
                .help("Wrap long lines")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-follow")
                .long("no-follow")
                .help("Do not keep the view scrolled to the newest line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Load the file once without polling for growth")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("plain")
                .long("plain")
                .help("Print lines to stdout instead of the interactive view")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("theme")
                .long("theme")
                .help("Color theme: default, monochrome or high-contrast")
                .value_parser(|s: &str| s.parse::<ThemeName>()),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file (defaults to the per-user config.toml)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write diagnostics to this file; RUST_LOG selects the level")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn overrides_from(matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        max_lines: matches.get_one::<usize>("max-lines").copied(),
        initial_lines: matches.get_one::<usize>("lines").copied(),
        poll_interval_ms: matches.get_one::<u64>("interval").copied(),
        filter: matches.get_one::<String>("filter").cloned(),
        wrap: matches.get_flag("wrap").then_some(true),
        follow: matches.get_flag("no-follow").then_some(false),
        theme: matches.get_one::<ThemeName>("theme").copied(),
    }
}

/// Logs go to stderr unless a file is given; the terminal view owns the screen
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        if std::env::var_os("RUST_LOG").is_none() {
            builder.filter_level(log::LevelFilter::Info);
        }
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    init_logging(matches.get_one::<PathBuf>("log-file").map(PathBuf::as_path))?;

    let Some(file_path) = matches.get_one::<PathBuf>("file") else {
        anyhow::bail!("a file path is required");
    };

    let config = TailConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("failed to load configuration")?
        .with_overrides(overrides_from(&matches));
    log::debug!("effective config: {config:?}");

    let once = matches.get_flag("once");
    let mode = if once {
        OpenMode::Snapshot
    } else {
        OpenMode::Live
    };
    let plain = matches.get_flag("plain") || !io::stdout().is_terminal();

    let theme = ColorTheme::from_name(config.theme);
    let mut app = Application::new(config);
    app.open_path(file_path, mode)
        .await
        .with_context(|| format!("cannot open {}", file_path.display()))?;

    if plain {
        app.run_plain(io::stdout(), once).await?;
    } else {
        let ui_renderer = Box::new(TerminalUI::with_theme(theme)?);
        app.run_tui(ui_renderer).await?;
    }

    Ok(())
}
