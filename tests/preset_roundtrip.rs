// Integration tests for saving and loading preset files

use std::sync::Arc;

use fdnr::control::ReverbControls;
use fdnr::params::{ParamId, ParamKind};
use fdnr::{Mode, PresetError, SharedParameters, PARAM_SPECS};

fn controls() -> ReverbControls {
    ReverbControls::new(Arc::new(SharedParameters::new()))
}

/// Move every parameter somewhere other than where it is now
fn mutate_everything(controls: &ReverbControls) {
    for spec in PARAM_SPECS.iter() {
        let current = controls.get(spec.id);
        let target = match spec.kind {
            ParamKind::Bool => 1.0 - current,
            _ if current == spec.max => spec.min,
            _ => spec.max,
        };
        controls.set(spec.id, target);
    }
}

#[test]
fn test_roundtrip_restores_every_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("galaxy.json");

    let controls = controls();
    controls.apply_mode_character(Mode::GalaxySpiral);
    controls.set(ParamId::DynFreq, 2345.0);
    controls.set(ParamId::MsBalance, 33.3);
    controls.set(ParamId::Limiter, 0.0);
    let saved = controls.shared().values();
    controls.save_preset(&path).unwrap();

    mutate_everything(&controls);
    for id in ParamId::ALL {
        assert_ne!(controls.get(id), saved[id.index()], "{} not mutated", id.key());
    }

    let applied = controls.load_preset(&path).unwrap();
    assert_eq!(applied, PARAM_SPECS.len());
    assert_eq!(controls.shared().values(), saved);
}

#[test]
fn test_malformed_file_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"parameters\": { \"MIX\": 10, ").unwrap();

    let controls = controls();
    controls.set(ParamId::Mix, 42.0);
    let before = controls.shared().values();

    assert!(matches!(
        controls.load_preset(&path),
        Err(PresetError::Malformed(_))
    ));
    assert_eq!(controls.shared().values(), before);
}

#[test]
fn test_partial_preset_keeps_missing_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    std::fs::write(
        &path,
        r#"{ "pluginName": "FDNR", "pluginVersion": "0.0.1",
             "parameters": { "FEEDBACK": 12, "SOMETHING_NEW": 1.0 } }"#,
    )
    .unwrap();

    let controls = controls();
    controls.set(ParamId::Width, 20.0);
    assert_eq!(controls.load_preset(&path).unwrap(), 1);
    assert_eq!(controls.get(ParamId::Feedback), 12.0);
    assert_eq!(controls.get(ParamId::Width), 20.0);
}

#[test]
fn test_preset_json_lists_all_keys() {
    let json = controls().preset_json().unwrap();
    for spec in PARAM_SPECS.iter() {
        assert!(json.contains(&format!("\"{}\"", spec.key)), "{}", spec.key);
    }
}
