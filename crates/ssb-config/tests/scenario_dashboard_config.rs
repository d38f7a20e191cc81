use ssb_config::{load_layered_yaml_from_strings, DashboardConfig, StoreBackend};

#[test]
fn missing_keys_take_defaults() {
    let cfg = load_layered_yaml_from_strings(&[]).unwrap().dashboard().unwrap();
    assert_eq!(cfg, DashboardConfig::default());
    assert_eq!(cfg.server.bind_addr, "127.0.0.1:8899");
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert_eq!(cfg.store.auth_token_env, "SSB_STORE_TOKEN");
    assert_eq!(cfg.store.poll_interval_ms, 2000);
    assert_eq!(cfg.accounts.session_ttl_hours, 8);
    assert_eq!(cfg.accounts.bootstrap_admin_password_env, "SSB_ADMIN_PASSWORD");
    assert_eq!(cfg.accounts.initial_password_env, "SSB_INITIAL_PASSWORD");
    assert!(cfg.accounts.bootstrap_admin_email.is_none());
}

#[test]
fn rest_backend_requires_a_database_url() {
    let loaded = load_layered_yaml_from_strings(&["store:\n  backend: rest\n"]).unwrap();
    let msg = loaded.dashboard().unwrap_err().to_string();
    assert!(msg.contains("/store/database_url"), "got: {msg}");
}

#[test]
fn unknown_backend_is_rejected() {
    let loaded = load_layered_yaml_from_strings(&["store:\n  backend: sqlite\n"]).unwrap();
    assert!(loaded.dashboard().is_err());
}

#[test]
fn non_positive_ttl_is_rejected() {
    let loaded =
        load_layered_yaml_from_strings(&["accounts:\n  session_ttl_hours: 0\n"]).unwrap();
    assert!(loaded.dashboard().is_err());
}
