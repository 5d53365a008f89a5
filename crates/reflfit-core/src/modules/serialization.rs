use crate::domain::{FitOutcome, FitParameter, IngestReport, ReflectivityModel};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// `"<value> ± <error>"`, or the bare value when there is no uncertainty.
pub fn format_display(value: f64, error: f64) -> String {
    if error > 0.0 {
        format!("{value} ± {error}")
    } else {
        format!("{value}")
    }
}

pub fn render_report_json(report: &IngestReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn render_human_summary(report: &IngestReport) -> String {
    let mut summary = String::new();
    let engine = report
        .engine_version
        .as_deref()
        .map(|version| format!(" (engine {version})"))
        .unwrap_or_default();
    let _ = writeln!(summary, "format: {}{}", report.format, engine);
    let _ = writeln!(summary, "chi2: {}", format_chi2(report.chi2));
    if report.incomplete {
        let _ = writeln!(summary, "status: incomplete fit");
    }

    match &report.outcome {
        FitOutcome::Single(model) => write_model(&mut summary, None, model),
        FitOutcome::Simultaneous(run) => {
            for fit in &run.models {
                let label = fit.dataset_label.as_deref().unwrap_or("");
                write_model(&mut summary, Some(label), &fit.model);
            }
        }
    }

    if !report.diagnostics.is_empty() {
        let _ = writeln!(summary, "diagnostics:");
        for diagnostic in &report.diagnostics {
            let _ = writeln!(summary, "  {}", diagnostic.diagnostic_line());
        }
    }
    summary
}

fn write_model(summary: &mut String, dataset_label: Option<&str>, model: &ReflectivityModel) {
    if let Some(label) = dataset_label {
        let _ = writeln!(summary, "dataset '{}' chi2: {}", label, format_chi2(model.chi2));
    }
    let _ = writeln!(
        summary,
        "  {:<8}{:<16}{}",
        "front",
        model.front_name,
        parameter_cell("sld", &model.front_sld),
    );
    for layer in &model.layers {
        let _ = writeln!(
            summary,
            "  {:<8}{:<16}{}  {}  {}  {}",
            layer.layer_number,
            layer.name,
            parameter_cell("thickness", &layer.thickness),
            parameter_cell("sld", &layer.sld),
            parameter_cell("isld", &layer.isld),
            parameter_cell("roughness", &layer.roughness),
        );
    }
    let _ = writeln!(
        summary,
        "  {:<8}{:<16}{}  {}",
        "back",
        model.back_name,
        parameter_cell("sld", &model.back_sld),
        parameter_cell("roughness", &model.back_roughness),
    );
    let _ = writeln!(
        summary,
        "  {}  {}",
        parameter_cell("scale", &model.scale),
        parameter_cell("background", &model.background),
    );
}

fn parameter_cell(name: &str, parameter: &FitParameter) -> String {
    let text = parameter
        .display
        .clone()
        .unwrap_or_else(|| format_display(parameter.value, parameter.error));
    let marker = if parameter.is_free() { "*" } else { "" };
    format!("{name}={text}{marker}")
}

fn format_chi2(chi2: Option<f64>) -> String {
    chi2.map(|value| value.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, normalize_text_artifact(content))
}
