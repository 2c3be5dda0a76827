//! Serde support behind the `state-persistence` feature.
//!
//! Run with: `cargo test -p abs-model --features state-persistence`

#![cfg(feature = "state-persistence")]

use std::rc::Rc;

use abs_model::{AbsConfig, RegistrySnapshot, SolutionKind, SolutionRegistry};

#[test]
fn registry_snapshot_survives_json() {
    let mut registry = SolutionRegistry::custom_solution(Rc::new(AbsConfig::default()));
    registry.set_strength(3e-5).unwrap();
    registry.set_concentration(0.2).unwrap();
    registry.set_active(SolutionKind::WeakBase).unwrap();

    let json = serde_json::to_string(&registry.snapshot()).unwrap();
    assert!(json.contains("\"active\":\"weak-base\""));

    let decoded: RegistrySnapshot = serde_json::from_str(&json).unwrap();
    let mut restored = SolutionRegistry::custom_solution(Rc::new(AbsConfig::default()));
    restored.restore(&decoded).unwrap();
    assert_eq!(restored.active_kind().get(), SolutionKind::WeakBase);
    assert_eq!(restored.concentration().get(), 0.2);
    assert_eq!(restored.strength().get(), Some(3e-5));
}

#[test]
fn config_loads_from_json() {
    let mut value = serde_json::to_value(AbsConfig::default()).unwrap();
    value["concentration_step"] = serde_json::json!(0.05);
    let config: AbsConfig = serde_json::from_value(value).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.concentration_step, 0.05);
}
