//! Command-line surface of the daemon.

use std::fmt;

use clap::{Parser, ValueEnum};

use crate::state::Config;

/// Screen-capture portal backend daemon.
#[derive(Debug, Parser)]
#[command(name = "xdpwd", version, about = "Screen-capture portal backend daemon")]
pub struct Cli {
    /// Select log level.
    #[arg(
        short = 'l',
        long,
        value_enum,
        value_name = "LEVEL",
        ignore_case = true,
        default_value_t = LogLevel::Error
    )]
    pub loglevel: LogLevel,

    /// Select output to capture.
    #[arg(short = 'o', long, value_name = "NAME")]
    pub output: Option<String>,

    /// Replace a running instance.
    #[arg(short = 'r', long)]
    pub replace: bool,
}

impl Cli {
    /// Startup configuration carried into bootstrap.
    pub fn config(&self) -> Config {
        Config {
            output_name: self.output.clone(),
        }
    }
}

/// Log severities, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Quiet,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Fallback directive when `RUST_LOG` is unset.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Quiet => "QUIET",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        };
        f.write_str(name)
    }
}
