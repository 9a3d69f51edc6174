//! Configuration loading and fail-fast validation.

use epidemic_core::{
    config::SimConfig,
    engine::SimEngine,
    error::SimError,
    zone::{GeoPoint, ZoneSpec},
};
use std::path::PathBuf;

fn repo_data_dir() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../data")
        .to_string_lossy()
        .into_owned()
}

#[test]
fn shipped_config_loads_and_validates() {
    let config = SimConfig::load(&repo_data_dir()).expect("data/sim_config.json");
    assert_eq!(config.params.beta, 0.3);
    assert_eq!(config.params.gamma, 0.14);
    assert_eq!(config.params.dt, 0.5);
    assert_eq!(config.run.horizon_days, 120.0);
    assert_eq!(config.generator.population_total, 3_122_605);
    assert!(config.zones.is_none());
}

#[test]
fn missing_config_is_an_error() {
    let err = SimConfig::load("/definitely/not/a/data/dir").unwrap_err();
    assert!(err.to_string().contains("sim_config.json"), "{err}");
}

#[test]
fn malformed_config_is_rejected_at_load() {
    let dir = std::env::temp_dir().join(format!("sir-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("sim_config.json"),
        r#"{ "params": { "beta": -1.0, "gamma": 0.14, "dt": 0.5 } }"#,
    )
    .unwrap();

    let result = SimConfig::load(&dir.to_string_lossy());
    std::fs::remove_dir_all(&dir).ok();
    assert!(result.is_err());
}

#[test]
fn engine_refuses_invalid_zones() {
    let zones = vec![ZoneSpec::new("Overfull", GeoPoint { lat: 0.0, lng: 0.0 }, 100, 500, 0.0)];
    let err = SimEngine::build("bad".into(), 1, SimConfig::with_zones(zones)).err().unwrap();
    assert!(matches!(err, SimError::InvalidZone { ref zone, .. } if zone == "Overfull"), "{err}");
}

#[test]
fn engine_refuses_non_positive_dt() {
    let mut config = SimConfig::default_test();
    config.params.dt = 0.0;
    let err = SimEngine::build("bad-dt".into(), 1, config).err().unwrap();
    assert!(matches!(err, SimError::InvalidConfig { ref field, .. } if field == "params.dt"), "{err}");
}

#[test]
fn negative_day_start_is_rejected() {
    let zones = vec![ZoneSpec::new("Past", GeoPoint { lat: 0.0, lng: 0.0 }, 1_000, 10, -1.0)];
    assert!(SimConfig::with_zones(zones).validate().is_err());
}
