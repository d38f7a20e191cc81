use ssb_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
server:
  bind_addr: "127.0.0.1:8899"
store:
  backend: "rest"
  database_url: "https://depot-stock.example.firebaseio.com"
  auth_token_env: "SSB_STORE_TOKEN"
accounts:
  session_ttl_hours: 8
"#;

const BASE_YAML_REORDERED: &str = r#"
accounts:
  session_ttl_hours: 8
store:
  auth_token_env: "SSB_STORE_TOKEN"
  database_url: "https://depot-stock.example.firebaseio.com"
  backend: "rest"
server:
  bind_addr: "127.0.0.1:8899"
"#;

const OVERLAY_YAML: &str = r#"
store:
  poll_interval_ms: 500
accounts:
  session_ttl_hours: 12
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(original.config_hash, reordered.config_hash);
}

#[test]
fn overlay_changes_hash_and_wins_on_conflicts() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);

    let cfg = merged.dashboard().unwrap();
    assert_eq!(cfg.accounts.session_ttl_hours, 12);
    assert_eq!(cfg.store.poll_interval_ms, 500);
    // Untouched keys from the base layer survive the merge.
    assert_eq!(
        cfg.store.database_url.as_deref(),
        Some("https://depot-stock.example.firebaseio.com")
    );
}

#[test]
fn empty_layers_contribute_nothing() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let with_empty = load_layered_yaml_from_strings(&[BASE_YAML, "~\n"]).unwrap();
    assert_eq!(base.config_hash, with_empty.config_hash);

    let none = load_layered_yaml_from_strings(&[]).unwrap();
    assert_eq!(none.canonical_json, "{}");
}
