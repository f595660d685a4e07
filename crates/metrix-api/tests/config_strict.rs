#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use metrix_api::config;
use metrix_core::StoreUrl;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
store:
  url: "memory://"
  uri: "memory://" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
store:
  url: "memory://"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:5000");
    assert_eq!(cfg.auth.token, "CURSORPROTOTYPE");
    assert_eq!(cfg.store_url().unwrap(), StoreUrl::Memory);
}

#[test]
fn missing_store_url_is_fatal() {
    let err = config::load_from_str("version: 1\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIG");
    assert!(err.to_string().contains("store.url"));
}

#[test]
fn unsupported_scheme_and_version_rejected() {
    let bad_scheme = "version: 1\nstore:\n  url: \"mongodb://localhost/metrics\"\n";
    assert!(config::load_from_str(bad_scheme).is_err());

    let bad_version = "version: 2\nstore:\n  url: \"memory://\"\n";
    assert!(config::load_from_str(bad_version).is_err());
}

#[test]
fn empty_token_rejected() {
    let bad = "version: 1\nauth:\n  token: \"\"\nstore:\n  url: \"memory://\"\n";
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrix.yaml");
    std::fs::write(
        &path,
        "version: 1\nserver:\n  listen: \"127.0.0.1:8000\"\nstore:\n  url: \"memory://\"\n",
    )
    .unwrap();

    let cfg = config::load_with_env(
        path.to_str().unwrap(),
        env(&[("PORT", "9100"), ("STORE_URL", "file://m.json"), ("AUTH_TOKEN", "s3cret")]),
    )
    .unwrap();
    assert_eq!(cfg.server.listen, "127.0.0.1:9100");
    assert_eq!(cfg.auth.token, "s3cret");
    assert_eq!(cfg.store_url().unwrap(), StoreUrl::File("m.json".into()));
}

#[test]
fn missing_file_falls_back_to_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = config::load_with_env(path.to_str().unwrap(), env(&[])).expect_err("no store url");
    assert_eq!(err.client_code().as_str(), "CONFIG");

    let cfg = config::load_with_env(path.to_str().unwrap(), env(&[("STORE_URL", "memory://")])).unwrap();
    assert_eq!(cfg.store_url().unwrap(), StoreUrl::Memory);
}

#[test]
fn bad_port_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = config::load_with_env(
        path.to_str().unwrap(),
        env(&[("PORT", "http"), ("STORE_URL", "memory://")]),
    )
    .expect_err("must fail");
    assert!(err.to_string().contains("PORT"));
}
