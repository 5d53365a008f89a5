mod commands;
mod helpers;

use clap::Parser;
use reflfit_core::domain::IngestError;

const USAGE_EXIT_CODE: i32 = 2;
const INTERNAL_EXIT_CODE: i32 = 5;

pub fn run_from_env() -> i32 {
    helpers::init_tracing();
    let remaining: Vec<String> = std::env::args().skip(1).collect();

    match run(remaining) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("reflfit".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "reflfit", about = "Reflectivity fit log ingestion", version)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Ingest a fit log and print the reconciled model(s)
    Parse(commands::ParseArgs),
    /// List the tagged regions of a fit log
    Blocks(commands::BlocksArgs),
    /// Print the model format a fit log uses
    Detect(commands::DetectArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Parse(args) => commands::run_parse_command(args),
        CliCommand::Blocks(args) => commands::run_blocks_command(args),
        CliCommand::Detect(args) => commands::run_detect_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Ingest(IngestError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn diagnostic_line(&self) -> String {
        match self {
            Self::Usage(message) => format!("ERROR: [INPUT.CLI_USAGE] {}", message.trim_end()),
            Self::Ingest(error) => error.diagnostic_line(),
            Self::Internal(error) => format!("ERROR: [IO.CLI] {error:#}"),
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => USAGE_EXIT_CODE,
            Self::Ingest(error) if error.is_fatal() => error.exit_code(),
            Self::Ingest(_) | Self::Internal(_) => INTERNAL_EXIT_CODE,
        }
    }
}
