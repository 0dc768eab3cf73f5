//! Command-line configuration.
//!
//! Arguments are parsed by hand; the surface is two flags. Log verbosity is not
//! an argument: it comes from `RUST_LOG` (see [`crate::observability`]).

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Output format for log events written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line events.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::UnknownLogFormat {
                value: other.to_string(),
            }),
        }
    }
}

/// Settings for one summary run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// JSON file holding the list of shard records.
    pub input: PathBuf,
    /// Format of log output on stderr.
    pub log_format: LogFormat,
}

/// What the invocation asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Summarise the shards in `CliConfig::input`.
    Run(CliConfig),
    /// Print usage and exit.
    Help,
}

/// Problems with the command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required argument --input <FILE>")]
    MissingInput,

    #[error("{flag} requires a value")]
    MissingValue { flag: String },

    #[error("unknown argument '{arg}'")]
    UnknownArgument { arg: String },

    #[error("unknown log format '{value}' (expected 'text' or 'json')")]
    UnknownLogFormat { value: String },
}

impl CliConfig {
    /// Parses arguments, excluding the program name.
    pub fn from_args(args: &[String]) -> Result<Command, ConfigError> {
        let mut input = None;
        let mut log_format = LogFormat::default();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-i" | "--input" => input = Some(PathBuf::from(value_for(arg, iter.next())?)),
                "--log-format" => log_format = value_for(arg, iter.next())?.parse()?,
                other => {
                    return Err(ConfigError::UnknownArgument {
                        arg: other.to_string(),
                    })
                }
            }
        }

        let input = input.ok_or(ConfigError::MissingInput)?;
        Ok(Command::Run(CliConfig { input, log_format }))
    }
}

fn value_for<'a>(flag: &str, value: Option<&'a String>) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.starts_with("--") => Ok(v.as_str()),
        _ => Err(ConfigError::MissingValue {
            flag: flag.to_string(),
        }),
    }
}
