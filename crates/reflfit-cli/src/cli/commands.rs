use super::CliError;
use super::helpers::{expected_shape, load_config, read_log, write_output};
use anyhow::Context;
use reflfit_core::domain::{BlockKind, IngestError, IngestRequest};
use reflfit_core::modules::blocks::scan_log;
use reflfit_core::modules::{LogIngestor, detect_format};
use reflfit_core::modules::serialization::{render_human_summary, render_report_json};
use std::path::PathBuf;
use tracing::info;

const INCOMPLETE_FIT_EXIT_CODE: i32 = 1;

#[derive(clap::Args)]
pub(super) struct ParseArgs {
    /// Captured fit log
    #[arg(value_name = "LOG")]
    pub(super) log: PathBuf,

    /// Ingest configuration (JSON)
    #[arg(long)]
    pub(super) config: Option<PathBuf>,

    /// Number of finite layers the model must have
    #[arg(long, value_name = "N")]
    pub(super) expected_layers: Option<usize>,

    /// Expected layer name, front to back; repeat per layer
    #[arg(long = "layer", value_name = "NAME")]
    pub(super) layers: Vec<String>,

    /// Expected front (incident) medium
    #[arg(long, value_name = "NAME")]
    pub(super) front: Option<String>,

    /// Expected back (substrate) medium
    #[arg(long, value_name = "NAME")]
    pub(super) back: Option<String>,

    /// Attach "value ± error" display strings
    #[arg(long)]
    pub(super) pretty: bool,

    /// Print a human-readable summary instead of JSON
    #[arg(long)]
    pub(super) summary: bool,

    /// Write the output to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub(super) output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct BlocksArgs {
    /// Captured fit log
    #[arg(value_name = "LOG")]
    log: PathBuf,

    /// Only list regions of this kind
    #[arg(long, value_enum)]
    kind: Option<BlockKindArg>,
}

#[derive(clap::Args)]
pub(super) struct DetectArgs {
    /// Captured fit log
    #[arg(value_name = "LOG")]
    log: PathBuf,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BlockKindArg {
    Refl,
    Sld,
    ModelParams,
    BestValues,
    ModelJson,
}

impl From<BlockKindArg> for BlockKind {
    fn from(kind: BlockKindArg) -> Self {
        match kind {
            BlockKindArg::Refl => Self::Refl,
            BlockKindArg::Sld => Self::Sld,
            BlockKindArg::ModelParams => Self::LegacyParams,
            BlockKindArg::BestValues => Self::BestValues,
            BlockKindArg::ModelJson => Self::JsonModel,
        }
    }
}

pub(super) fn run_parse_command(args: ParseArgs) -> Result<i32, CliError> {
    let config = load_config(args.config.as_deref())?;
    let log_text = read_log(&args.log)?;

    let mut request = IngestRequest::new(&log_text).pretty(args.pretty);
    if let Some(shape) = expected_shape(&args)? {
        request = request.with_shape(shape);
    }

    let report = LogIngestor::new(config)
        .ingest(&request)
        .map_err(CliError::Ingest)?;
    info!(
        "ingested {} as {} ({} model(s), {} diagnostic(s))",
        args.log.display(),
        report.format,
        report.outcome.models().len(),
        report.diagnostics.len()
    );

    let rendered = if args.summary {
        render_human_summary(&report)
    } else {
        render_report_json(&report).context("failed to serialize ingest report")?
    };
    write_output(args.output.as_deref(), &rendered)?;

    if report.incomplete {
        Ok(INCOMPLETE_FIT_EXIT_CODE)
    } else {
        Ok(0)
    }
}

pub(super) fn run_blocks_command(args: BlocksArgs) -> Result<i32, CliError> {
    let log_text = read_log(&args.log)?;
    let scan = scan_log(&log_text);
    for diagnostic in &scan.diagnostics {
        eprintln!("{}", diagnostic.diagnostic_line());
    }

    let wanted = args.kind.map(BlockKind::from);
    let blocks = scan
        .blocks
        .iter()
        .filter(|block| wanted.is_none_or(|kind| block.kind == kind))
        .collect::<Vec<_>>();
    let rendered =
        serde_json::to_string_pretty(&blocks).context("failed to serialize log blocks")?;
    println!("{rendered}");
    Ok(0)
}

pub(super) fn run_detect_command(args: DetectArgs) -> Result<i32, CliError> {
    let log_text = read_log(&args.log)?;
    match detect_format(&log_text) {
        Some(format) => {
            println!("{format}");
            Ok(0)
        }
        None => Err(CliError::Ingest(IngestError::no_recognized_format(
            "LOG.NO_MODEL",
            format!("'{}' holds no recognizable model output", args.log.display()),
            "",
        ))),
    }
}
