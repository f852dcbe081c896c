//! JSON preset documents
//!
//! A preset is a flat map of parameter key to denormalized value, plus the
//! plugin name and version that wrote it:
//!
//! ```json
//! { "pluginName": "FDNR", "pluginVersion": "0.1.0", "parameters": { "MIX": 50.0 } }
//! ```
//!
//! Unknown keys are ignored on load and missing keys keep their current
//! value.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PresetError;
use crate::params::{ParamId, ParameterValues};

pub const PLUGIN_NAME: &str = "FDNR";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDocument {
    #[serde(default)]
    pub plugin_name: String,
    #[serde(default)]
    pub plugin_version: String,
    /// Parameter key to raw JSON value; entries are validated one by one in `apply_to`
    #[serde(default)]
    pub parameters: Option<BTreeMap<String, Value>>,
}

impl PresetDocument {
    pub fn from_values(values: &ParameterValues) -> Self {
        let parameters = ParamId::ALL
            .iter()
            .map(|&id| (id.key().to_string(), Value::from(f64::from(values[id.index()]))))
            .collect();
        Self {
            plugin_name: PLUGIN_NAME.to_string(),
            plugin_version: PLUGIN_VERSION.to_string(),
            parameters: Some(parameters),
        }
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, PresetError> {
        let document: PresetDocument = serde_json::from_str(text)?;
        if document.parameters.is_none() {
            return Err(PresetError::MissingParameters);
        }
        if !document.plugin_name.is_empty() && document.plugin_name != PLUGIN_NAME {
            log::debug!(
                "Preset was written by {:?}, loading anyway",
                document.plugin_name
            );
        }
        Ok(document)
    }

    /// Copy every recognised value into `values`, clamped into range.
    /// Returns how many values were taken.
    pub fn apply_to(&self, values: &mut ParameterValues) -> usize {
        let Some(parameters) = &self.parameters else {
            return 0;
        };

        let mut applied = 0;
        for (key, raw) in parameters {
            let Some(id) = ParamId::from_key(key) else {
                log::debug!("Skipping unknown preset parameter {:?}", key);
                continue;
            };
            let Some(number) = raw.as_f64() else {
                log::warn!("Skipping non-numeric preset value for {}: {}", key, raw);
                continue;
            };
            values[id.index()] = id.spec().sanitize(number as f32);
            applied += 1;
        }
        applied
    }
}

/// Write `values` to `path` as a preset document
pub fn save(path: impl AsRef<Path>, values: &ParameterValues) -> Result<(), PresetError> {
    let path = path.as_ref();
    log::info!("Saving preset to {:?}", path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = PresetDocument::from_values(values).to_json()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read and validate a preset document. Nothing is applied here.
pub fn load(path: impl AsRef<Path>) -> Result<PresetDocument, PresetError> {
    let path = path.as_ref();
    log::info!("Loading preset from {:?}", path);

    let text = std::fs::read_to_string(path)?;
    PresetDocument::from_json(&text).map_err(|e| {
        log::warn!("Rejected preset {:?}: {}", path, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PARAM_SPECS;

    fn defaults() -> ParameterValues {
        std::array::from_fn(|i| PARAM_SPECS[i].default)
    }

    #[test]
    fn test_document_layout() {
        let json = PresetDocument::from_values(&defaults()).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pluginName"], "FDNR");
        assert_eq!(value["pluginVersion"], PLUGIN_VERSION);
        assert_eq!(value["parameters"]["MIX"], 50.0);
        assert_eq!(value["parameters"]["LIMITER"], 1.0);
        assert_eq!(value["parameters"].as_object().unwrap().len(), 24);
    }

    #[test]
    fn test_unknown_and_missing_keys() {
        let doc = PresetDocument::from_json(
            r#"{ "pluginName": "FDNR", "parameters": { "MIX": 75, "BOGUS": 3, "WIDTH": "wide" } }"#,
        )
        .unwrap();

        let mut values = defaults();
        values[ParamId::Feedback.index()] = 90.0;
        assert_eq!(doc.apply_to(&mut values), 1);
        assert_eq!(values[ParamId::Mix.index()], 75.0);
        assert_eq!(values[ParamId::Width.index()], 100.0);
        assert_eq!(values[ParamId::Feedback.index()], 90.0);
    }

    #[test]
    fn test_values_are_clamped() {
        let doc =
            PresetDocument::from_json(r#"{ "parameters": { "DELAY": 5000, "MODE": 40.6 } }"#)
                .unwrap();
        let mut values = defaults();
        doc.apply_to(&mut values);
        assert_eq!(values[ParamId::Delay.index()], 1000.0);
        assert_eq!(values[ParamId::Mode.index()], 20.0);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            PresetDocument::from_json("{ not json"),
            Err(PresetError::Malformed(_))
        ));
        assert!(matches!(
            PresetDocument::from_json(r#"{ "pluginName": "FDNR" }"#),
            Err(PresetError::MissingParameters)
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets").join("wide.json");

        let mut values = defaults();
        values[ParamId::Width.index()] = 12.5;
        save(&path, &values).unwrap();

        let mut loaded = defaults();
        load(&path).unwrap().apply_to(&mut loaded);
        assert_eq!(loaded, values);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("nope.json")),
            Err(PresetError::Io(_))
        ));
    }
}
