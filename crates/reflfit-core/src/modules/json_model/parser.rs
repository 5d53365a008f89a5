use super::model::{JsonFitModel, JsonLayer, JsonParameter};
use crate::domain::{AttributeKey, RawAttribute, RawLayerAttrs, RawProbe};
use crate::modules::helpers::split_parameter_label;

pub fn decode_json_model(text: &str) -> Result<JsonFitModel, serde_json::Error> {
    serde_json::from_str(text.trim())
}

/// Converts the payload into engine-order stack entries and the probe.
pub fn json_stack(model: &JsonFitModel) -> (Vec<RawLayerAttrs>, RawProbe) {
    let stack = model.sample.layers.iter().map(layer_attrs).collect();
    let probe = RawProbe {
        intensity: model.probe.intensity.as_ref().map(raw_attribute),
        background: model.probe.background.as_ref().map(raw_attribute),
    };
    (stack, probe)
}

fn layer_attrs(layer: &JsonLayer) -> RawLayerAttrs {
    let mut attrs = RawLayerAttrs {
        name: layer.resolved_name().map(str::to_string),
        ..RawLayerAttrs::default()
    };

    let parameters = [
        (AttributeKey::Thickness, layer.thickness.as_ref()),
        (AttributeKey::Sld, layer.rho()),
        (AttributeKey::Isld, layer.irho()),
        (AttributeKey::Roughness, layer.interface.as_ref()),
    ];
    for (key, parameter) in parameters
        .into_iter()
        .filter_map(|(key, parameter)| parameter.map(|parameter| (key, parameter)))
    {
        attrs.insert(key, raw_attribute(parameter));
    }

    if attrs.name.is_none() {
        attrs.name = layer
            .thickness
            .as_ref()
            .and_then(JsonParameter::name)
            .map(|label| split_parameter_label(label).0.to_string());
    }
    attrs
}

fn raw_attribute(parameter: &JsonParameter) -> RawAttribute {
    RawAttribute::new(parameter.name().map(str::to_string), parameter.value())
        .with_fixed(parameter.fixed())
        .with_bounds(parameter.bounds())
}

#[cfg(test)]
mod tests {
    use super::{decode_json_model, json_stack};
    use crate::domain::AttributeKey;

    #[test]
    fn layer_parameters_are_read_from_layer_or_material() {
        let payload = r#"{
            "sample": {"layers": [
                {"name": "Si", "material": {"rho": {"name": "Si rho", "value": 2.07, "fixed": true}},
                 "interface": {"name": "Si interface", "value": 3.1, "fixed": false, "bounds": [1, 5]}},
                {"name": "air", "rho": 0.0, "thickness": {"value": 0}}
            ]},
            "probe": {"intensity": {"name": "intensity", "value": 1.02, "fixed": false, "bounds": [0.9, null]}}
        }"#;
        let model = decode_json_model(payload).expect("payload should decode");
        let (stack, probe) = json_stack(&model);

        assert_eq!(stack.len(), 2);
        let si = &stack[0];
        assert_eq!(si.display_name(), "Si");
        assert_eq!(si.get(AttributeKey::Sld).expect("rho").value, 2.07);
        let roughness = si.get(AttributeKey::Roughness).expect("interface");
        assert!(!roughness.fixed);
        assert_eq!(roughness.bounds, Some((1.0, 5.0)));

        let air = &stack[1];
        assert!(air.get(AttributeKey::Sld).expect("constant rho").fixed);
        assert!(air.get(AttributeKey::Thickness).expect("thickness").fixed);
        assert!(air.get(AttributeKey::Isld).is_none());

        let intensity = probe.intensity.expect("intensity");
        assert_eq!(intensity.value, 1.02);
        assert_eq!(intensity.bounds, None);
        assert!(probe.background.is_none());
    }

    #[test]
    fn unnamed_layer_takes_name_from_thickness_label() {
        let payload = r#"{"sample": {"layers": [
            {"thickness": {"name": "SiOx thickness", "value": 12}}
        ]}}"#;
        let model = decode_json_model(payload).expect("payload should decode");
        let (stack, _) = json_stack(&model);
        assert_eq!(stack[0].display_name(), "SiOx");
    }

    #[test]
    fn payload_without_sample_is_rejected() {
        assert!(decode_json_model(r#"{"probe": {}}"#).is_err());
        assert!(decode_json_model("{ truncated").is_err());
    }
}
