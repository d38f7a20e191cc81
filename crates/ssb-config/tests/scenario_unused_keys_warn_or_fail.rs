use ssb_config::{load_layered_yaml_from_strings, report_unused_keys, Component, UnusedKeyPolicy};

const YAML: &str = r#"
server:
  bind_addr: "0.0.0.0:8899"
store:
  backend: memory
  poll_interval_ms: 1000
legacy:
  theme: sombre
  page_size: 50
"#;

#[test]
fn warn_reports_unused_keys_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(Component::Daemon, &loaded.config_json, UnusedKeyPolicy::Warn)
        .unwrap();

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/legacy/page_size".to_string(), "/legacy/theme".to_string()]
    );
}

#[test]
fn fail_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(Component::Daemon, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err()
        .to_string();
    assert!(err.contains("CONFIG_UNUSED_KEYS"), "got: {err}");
    assert!(err.contains("component=DAEMON"), "got: {err}");
}

#[test]
fn server_keys_are_unused_for_the_cli() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(Component::Cli, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert!(report
        .unused_leaf_pointers
        .contains(&"/server/bind_addr".to_string()));
    assert!(!report
        .unused_leaf_pointers
        .contains(&"/store/backend".to_string()));
}

#[test]
fn clean_config_passes_fail_policy() {
    let yaml = "store:\n  backend: memory\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(Component::Cli, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
