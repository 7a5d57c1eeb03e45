//! CLI configuration

use thiserror::Error;

/// Apa yang dijalankan oleh binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Print seluruh kind table
    List,
    /// Lookup code atau nama kind
    Lookup(String),
    /// Micro-benchmark lookup dan encode/decode
    Bench,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub command: CliCommand,
    pub iterations: usize,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            command: CliCommand::List,
            iterations: 1_000_000,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("option {0} needs a value")]
    MissingValue(&'static str),

    #[error("invalid iteration count {0:?}")]
    InvalidIterations(String),

    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
}

pub const USAGE: &str = "\
Usage: worker_wire [OPTIONS]

Options:
  -l, --list              Print the message kind table (default)
  -k, --lookup <CODE|NAME> Resolve a wire code or kind name
  -b, --bench             Run lookup and codec micro-benchmarks
  -n, --iterations <N>    Benchmark iterations (default: 1000000)
  -v, --verbose           Debug logging (RUST_LOG overrides)
  -h, --help              Show this help";

/// Parse argumen (tanpa nama program)
pub fn parse_args<I>(args: I) -> Result<CliConfig, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = CliConfig::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--list" | "-l" => config.command = CliCommand::List,
            "--lookup" | "-k" => {
                let value = args.next().ok_or(ConfigError::MissingValue("--lookup"))?;
                config.command = CliCommand::Lookup(value);
            }
            "--bench" | "-b" => config.command = CliCommand::Bench,
            "--iterations" | "-n" => {
                let value = args
                    .next()
                    .ok_or(ConfigError::MissingValue("--iterations"))?;
                config.iterations = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(ConfigError::InvalidIterations(value)),
                };
            }
            "--verbose" | "-v" => config.verbose = true,
            "--help" | "-h" => config.command = CliCommand::Help,
            _ => return Err(ConfigError::UnknownArgument(arg)),
        }
    }

    Ok(config)
}
