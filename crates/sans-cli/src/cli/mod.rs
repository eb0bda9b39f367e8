mod commands;

use clap::Parser;
use sans_core::domain::SansError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let sans_error = error.as_sans_error();
            eprintln!("{}", sans_error.diagnostic_line());
            eprintln!("{}", sans_error.fatal_exit_line());
            sans_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("sans-reduce".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_tracing(&cli.log_level);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// `RUST_LOG` wins over `--log-level`; a second initialisation is ignored.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(name = "sans-reduce", about = "ILL SANS data reduction by process type")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Reduce one measurement from workspace files
    Reduce(commands::ReduceArgs),
    /// Run a reduction plan, feeding outputs to later reductions
    Chain(commands::ChainArgs),
    /// Print the correction steps of a process type
    Plan(commands::PlanArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Reduce(args) => commands::run_reduce_command(args),
        CliCommand::Chain(args) => commands::run_chain_command(args),
        CliCommand::Plan(args) => commands::run_plan_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(SansError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_sans_error(&self) -> SansError {
        match self {
            Self::Usage(message) => SansError::validation("VALIDATION.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => SansError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};

    #[test]
    fn plan_prints_and_succeeds() {
        assert_eq!(run(["plan", "--process", "Water"]).expect("plan"), 0);
    }

    #[test]
    fn unknown_process_type_is_a_usage_error() {
        let error = run(["plan", "--process", "Buffer"]).expect_err("unknown process");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_sans_error().exit_code(), 2);
    }

    #[test]
    fn help_is_not_an_error() {
        assert_eq!(run(["--help"]).expect("help"), 0);
    }

    #[test]
    fn compute_errors_keep_their_category() {
        let error = run([
            "reduce",
            "--process",
            "Sample",
            "--runs",
            "",
            "--output",
            "sample",
        ])
        .expect_err("empty run list");
        assert_eq!(error.as_sans_error().placeholder(), "VALIDATION.NO_RUNS");
    }
}
