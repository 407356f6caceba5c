//! pvw: live view of the processes holding network ports.
//!
//! Interactive mode takes over the terminal: `↑`/`k` and `↓`/`j` move the
//! cursor, `t` terminates the selected process, `r` refreshes, `?` toggles
//! help and `q` quits. `--once` prints a single snapshot and exits.

use clap::Parser;
use ftui::ProgramConfig;
use pvw_common::ColumnSchema;
use pvw_core::action::SignalTerminator;
use pvw_core::collect::{LsofSource, ToolConfig, ToolRunner};
use pvw_core::config::{load_config, AppConfig, ConfigError};
use pvw_core::controller::{run_view, Controller, KeyMap, PortView};
use pvw_core::exit_codes::ExitCode;
use pvw_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use pvw_core::present::write_snapshot;
use pvw_core::Pipeline;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Show processes with open network ports and terminate them
#[derive(Parser, Debug)]
#[command(name = "pvw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Only show processes with these names
    #[arg(value_name = "NAME")]
    names: Vec<String>,

    /// Show connection status
    #[arg(short = 's', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_status: Option<bool>,

    /// Show protocol
    #[arg(short = 'P', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_protocol: Option<bool>,

    /// Show the address column
    #[arg(short = 'a', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_addresses: Option<bool>,

    /// Show local and remote address/port separately
    #[arg(short = 'C', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_full_connection: Option<bool>,

    /// Show process owner
    #[arg(short = 'o', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_owner: Option<bool>,

    /// Show process name
    #[arg(short = 'n', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_process_name: Option<bool>,

    /// Show process ID
    #[arg(short = 'i', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_process_id: Option<bool>,

    /// Show each process's working directory
    #[arg(short = 'd', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_cwd: Option<bool>,

    /// Only show listening sockets
    #[arg(short = 'l', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    listen_only: Option<bool>,

    /// Include closed connections
    #[arg(short = 'c', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_closed: Option<bool>,

    /// Disable process termination
    #[arg(short = 'r', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    read_only: Option<bool>,

    /// Only show connections on these ports (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "PORTS")]
    ports: Vec<String>,

    /// Refresh automatically every SECS seconds
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Print one snapshot and exit
    #[arg(long)]
    once: bool,

    /// With --once, print the snapshot as JSON
    #[arg(long, requires = "once")]
    json: bool,

    /// Kill lsof after SECS seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// lsof binary to run
    #[arg(long, value_name = "PATH")]
    lsof: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/pvw/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn log_level(&self) -> Option<LogLevel> {
        if self.log_level.is_some() {
            return self.log_level;
        }
        if self.quiet {
            return Some(LogLevel::Error);
        }
        match self.verbose {
            0 => None,
            n => Some((0..n).fold(LogLevel::default(), |level, _| level.louder())),
        }
    }

    /// Layer command-line values over the loaded file.
    fn apply(&self, mut config: AppConfig) -> Result<AppConfig, ConfigError> {
        let columns = &mut config.view.columns;
        let toggles = [
            (self.show_status, &mut columns.status),
            (self.show_protocol, &mut columns.protocol),
            (self.show_addresses, &mut columns.addresses),
            (self.show_full_connection, &mut columns.full_connection),
            (self.show_owner, &mut columns.owner),
            (self.show_process_name, &mut columns.name),
            (self.show_process_id, &mut columns.pid),
            (self.show_cwd, &mut columns.directory),
        ];
        for (flag, target) in toggles {
            if let Some(value) = flag {
                *target = value;
            }
        }
        // The directory column is empty unless the lookup runs.
        if config.view.columns.directory {
            config.filter.resolve_working_directory = true;
        }

        if !self.names.is_empty() {
            config.filter.names = self.names.clone();
        }
        if !self.ports.is_empty() {
            config.filter.ports = self.ports.iter().map(|p| p.trim().to_string()).collect();
        }
        if let Some(value) = self.listen_only {
            config.filter.listen_only = value;
        }
        if let Some(value) = self.show_closed {
            config.filter.show_closed = value;
        }
        if let Some(value) = self.read_only {
            config.view.read_only = value;
        }
        if self.interval.is_some() {
            config.view.refresh_interval_secs = self.interval;
        }
        if self.timeout.is_some() {
            config.view.tool_timeout_secs = self.timeout;
        }
        if self.lsof.is_some() {
            config.view.lsof_path = self.lsof.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.log_level(), cli.log_format);
    init_logging(&log_config);

    let exit_code = run(&cli);
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> ExitCode {
    let loaded = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("pvw: {err}");
            return ExitCode::ArgsError;
        }
    };
    let config = match cli.apply(loaded.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pvw: {err}");
            return ExitCode::ArgsError;
        }
    };
    info!(
        config_path = ?loaded.path,
        filter = ?config.filter,
        "configuration resolved"
    );

    if !cfg!(unix) {
        eprintln!("pvw: only Unix-like systems are supported");
        return ExitCode::CapabilityError;
    }

    let runner = ToolRunner::new(ToolConfig {
        timeout: config.view.tool_timeout_secs.map(Duration::from_secs),
    });
    let source = match &config.view.lsof_path {
        Some(path) => LsofSource::with_program(runner, path.to_string_lossy()),
        None => LsofSource::new(runner),
    };
    if !source.is_available() {
        eprintln!("pvw: required tool not found: {}", source.program());
        return ExitCode::CapabilityError;
    }

    let schema = ColumnSchema::from_toggles(&config.view.columns);
    let pipeline = Pipeline::new(Arc::new(source), config.filter.clone(), schema);

    if cli.once {
        run_once(&pipeline, cli.json)
    } else {
        run_interactive(pipeline, &config)
    }
}

fn run_once(pipeline: &Pipeline, json: bool) -> ExitCode {
    let written = pipeline.load().and_then(|snapshot| {
        write_snapshot(&mut io::stdout().lock(), &snapshot, pipeline.schema(), json)
    });
    match written {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            error!(category = %err.category(), "snapshot failed: {err}");
            eprintln!("pvw: {err}");
            ExitCode::for_error(&err)
        }
    }
}

fn run_interactive(pipeline: Pipeline, config: &AppConfig) -> ExitCode {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("pvw: interactive mode needs a terminal; use --once for plain output");
        return ExitCode::CapabilityError;
    }

    let controller = Controller::new(KeyMap::default(), config.view.read_only);
    let view = PortView::new(controller, pipeline, Arc::new(SignalTerminator::new()))
        .with_refresh_interval(config.view.refresh_interval_secs.map(Duration::from_secs));

    match run_view(view, ProgramConfig::default()) {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("pvw: terminal error: {err}");
            ExitCode::IoError
        }
    }
}
