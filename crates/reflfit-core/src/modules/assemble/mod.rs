use crate::domain::{
    DatasetFit, ExpectedShape, FitOutcome, FitRun, IngestError, IngestResult, ReflectivityModel,
    label_suffix,
};
use tracing::debug;

/// Checks a reconciled model against the caller's shape and numbers its layers 1..N, front to back.
///
/// A mismatch fails the model instead of truncating or padding it.
pub fn assemble_model(
    mut model: ReflectivityModel,
    shape: Option<&ExpectedShape>,
    dataset_label: Option<&str>,
    source: &str,
) -> IngestResult<ReflectivityModel> {
    if let Some(shape) = shape {
        validate_shape(&model, shape, dataset_label, source)?;
    }

    for (index, layer) in model.layers.iter_mut().enumerate() {
        layer.layer_number = index + 1;
    }
    debug!(
        "assembled model{} with {} layer(s) between '{}' and '{}'",
        label_suffix(dataset_label),
        model.layers.len(),
        model.front_name,
        model.back_name
    );
    Ok(model)
}

fn validate_shape(
    model: &ReflectivityModel,
    shape: &ExpectedShape,
    dataset_label: Option<&str>,
    source: &str,
) -> IngestResult<()> {
    let suffix = label_suffix(dataset_label);
    let found = model
        .layers
        .iter()
        .map(|layer| layer.name.as_str())
        .collect::<Vec<_>>();

    if let Some(expected) = shape.expected_layer_count()
        && expected != found.len()
    {
        return Err(IngestError::shape_mismatch(
            "MODEL.LAYER_COUNT",
            format!(
                "model{suffix} has {} layer(s) {:?}, expected {expected}",
                found.len(),
                found
            ),
            source,
        ));
    }

    let expected_names = shape.layer_names.iter().map(String::as_str);
    if !shape.layer_names.is_empty() && expected_names.ne(found.iter().copied()) {
        return Err(IngestError::shape_mismatch(
            "MODEL.LAYER_NAMES",
            format!(
                "model{suffix} layers {:?} do not match expected {:?}",
                found, shape.layer_names
            ),
            source,
        ));
    }

    for (side, expected, actual) in [
        ("front", shape.front_name.as_deref(), model.front_name.as_str()),
        ("back", shape.back_name.as_deref(), model.back_name.as_str()),
    ] {
        if let Some(expected) = expected
            && expected != actual
        {
            return Err(IngestError::shape_mismatch(
                "MODEL.MEDIUM_NAME",
                format!("model{suffix} {side} medium is '{actual}', expected '{expected}'"),
                source,
            ));
        }
    }

    Ok(())
}

/// Wraps assembled models: one unlabelled model is a single fit, anything else a [`FitRun`].
pub fn assemble_outcome(
    mut models: Vec<(Option<String>, ReflectivityModel)>,
    simultaneous: bool,
    chi2: Option<f64>,
) -> FitOutcome {
    if !simultaneous
        && models.len() == 1
        && let Some((_, model)) = models.pop()
    {
        return FitOutcome::Single(model);
    }

    FitOutcome::Simultaneous(FitRun {
        models: models
            .into_iter()
            .map(|(dataset_label, model)| DatasetFit {
                dataset_label,
                model,
            })
            .collect(),
        chi2,
    })
}
