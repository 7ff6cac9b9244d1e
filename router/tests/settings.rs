use router::settings::{RouterSettings, SettingsEnum, TraceCostFactor};

#[test]
fn missing_fields_take_defaults() {
    let settings: RouterSettings = serde_json::from_str(r#"{"max_shove_depth": 3}"#).unwrap();
    assert_eq!(settings.max_shove_depth, 3);
    assert_eq!(settings.pull_tight_accuracy, 500);
    assert_eq!(settings.max_via_shove_depth, 8);
    assert_eq!(settings.max_spring_over_depth, 20);
    assert!(settings.pull_tight_after_insert);
}

#[test]
fn layer_costs_survive_json() {
    let mut settings = RouterSettings::default();
    settings.trace_costs = vec![
        TraceCostFactor {
            horizontal: 1.0,
            vertical: 2.5,
        },
        TraceCostFactor {
            horizontal: 2.5,
            vertical: 1.0,
        },
    ];
    settings.set("smoothing_max_cos", SettingsEnum::Float(0.99)).unwrap();
    let json = serde_json::to_string(&settings).unwrap();
    let parsed: RouterSettings = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, settings);
    assert_eq!(parsed.trace_cost(1).horizontal, 2.5);
    assert_eq!(parsed.trace_cost(7), TraceCostFactor::default());
}
