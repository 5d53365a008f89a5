use super::CliError;
use super::commands::ParseArgs;
use anyhow::Context;
use reflfit_core::common::{IngestConfig, load_ingest_config};
use reflfit_core::domain::ExpectedShape;
use reflfit_core::modules::serialization::{normalize_text_artifact, write_text_artifact};
use std::fs;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "reflfit=info,reflfit_core=info";

/// Logs go to stderr so stdout stays machine-readable.
pub(super) fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub(super) fn read_log(path: &Path) -> Result<String, CliError> {
    let log_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read fit log '{}'", path.display()))?;
    Ok(log_text)
}

pub(super) fn load_config(path: Option<&Path>) -> Result<IngestConfig, CliError> {
    match path {
        Some(path) => Ok(load_ingest_config(path).map_err(anyhow::Error::from)?),
        None => Ok(IngestConfig::default()),
    }
}

pub(super) fn expected_shape(args: &ParseArgs) -> Result<Option<ExpectedShape>, CliError> {
    if let Some(count) = args.expected_layers
        && !args.layers.is_empty()
        && count != args.layers.len()
    {
        return Err(CliError::Usage(format!(
            "--expected-layers {} disagrees with the {} --layer name(s) given",
            count,
            args.layers.len()
        )));
    }

    if args.expected_layers.is_none()
        && args.layers.is_empty()
        && args.front.is_none()
        && args.back.is_none()
    {
        return Ok(None);
    }

    Ok(Some(ExpectedShape {
        layer_count: args.expected_layers,
        layer_names: args.layers.clone(),
        front_name: args.front.clone(),
        back_name: args.back.clone(),
    }))
}

pub(super) fn write_output(path: Option<&Path>, content: &str) -> Result<(), CliError> {
    match path {
        Some(path) => write_text_artifact(path, content)
            .with_context(|| format!("failed to write output '{}'", path.display()))?,
        None => print!("{}", normalize_text_artifact(content)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{expected_shape, load_config, write_output};
    use crate::cli::CliError;
    use crate::cli::commands::ParseArgs;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse_args() -> ParseArgs {
        ParseArgs {
            log: PathBuf::from("fit.log"),
            config: None,
            expected_layers: None,
            layers: Vec::new(),
            front: None,
            back: None,
            pretty: false,
            summary: false,
            output: None,
        }
    }

    #[test]
    fn no_shape_flags_leave_the_model_unchecked() {
        let shape = expected_shape(&parse_args()).expect("no flags is valid");
        assert!(shape.is_none());
    }

    #[test]
    fn layer_flags_build_the_expected_shape() {
        let mut args = parse_args();
        args.expected_layers = Some(2);
        args.layers = vec!["PS".to_string(), "SiOx".to_string()];
        args.back = Some("Si".to_string());

        let shape = expected_shape(&args)
            .expect("consistent flags")
            .expect("shape should be built");
        assert_eq!(shape.expected_layer_count(), Some(2));
        assert_eq!(shape.layer_names, ["PS", "SiOx"]);
        assert_eq!(shape.front_name, None);
        assert_eq!(shape.back_name.as_deref(), Some("Si"));
    }

    #[test]
    fn disagreeing_layer_count_is_a_usage_error() {
        let mut args = parse_args();
        args.expected_layers = Some(3);
        args.layers = vec!["PS".to_string()];
        let error = expected_shape(&args).expect_err("3 layers but one name");
        assert!(matches!(error, CliError::Usage(_)));
    }

    #[test]
    fn config_is_optional_and_read_from_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("ingest.json");
        fs::write(&path, r#"{"significantFigures": 4}"#).expect("config should be written");

        assert_eq!(load_config(None).expect("default config").significant_figures, 6);
        let config = load_config(Some(path.as_path())).expect("config should load");
        assert_eq!(config.significant_figures, 4);

        let missing = temp.path().join("absent.json");
        let error = load_config(Some(missing.as_path())).expect_err("missing config");
        assert!(matches!(error, CliError::Internal(_)));
    }

    #[test]
    fn output_file_receives_normalized_text() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("report.json");
        write_output(Some(path.as_path()), "{}").expect("output should be written");
        assert_eq!(fs::read_to_string(&path).expect("output file"), "{}\n");
    }
}
