// tests/config_env.rs
//
// `ServiceConfig::load` against the real process environment. These mutate
// env vars, so they run serially.

use serial_test::serial;
use std::fs;
use std::path::PathBuf;

use spam_sms_classifier::config::{ServiceConfig, ENV_CONFIG_PATH};

const VARS: [&str; 4] = [ENV_CONFIG_PATH, "SPAM_ARTIFACT_DIR", "SPAM_METRICS", "SPAM_HISTORY_PATH"];

fn clear_env() {
    for v in VARS {
        std::env::remove_var(v);
    }
}

#[test]
#[serial]
fn file_then_env_overrides() {
    clear_env();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("spam_cfg_{nanos}.toml"));
    fs::write(&path, "artifact_dir = \"models\"\nmetrics = false\nauto_train = false\n").unwrap();

    std::env::set_var(ENV_CONFIG_PATH, &path);
    std::env::set_var("SPAM_METRICS", "1");
    std::env::set_var("SPAM_HISTORY_PATH", "  ");

    let cfg = ServiceConfig::load().expect("load");
    assert_eq!(cfg.artifact_dir, PathBuf::from("models"));
    assert!(cfg.metrics, "env beats file");
    assert!(!cfg.auto_train, "file beats default");
    assert_eq!(
        cfg.history_path,
        PathBuf::from("backend/history.json"),
        "blank env value is ignored"
    );
    clear_env();
}

#[test]
#[serial]
fn missing_explicit_config_file_is_an_error() {
    clear_env();
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    assert!(ServiceConfig::load().is_err());
    clear_env();
}
