use std::time::Duration;

use tempfile::TempDir;

use paperbridge::config::{BridgeMode, Config};

fn write_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn file_values_override_defaults() {
    let (_dir, path) = write_config(
        r#"
[upstream]
base_url = "http://localhost:8983/solr/search"

[broker]
mode = "direct"
reply_timeout_ms = 1500
inbox_prefix = "_REPLY"
"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.upstream.base_url, "http://localhost:8983/solr/search");
    assert_eq!(config.broker.mode, BridgeMode::Direct);
    assert_eq!(config.broker.reply_timeout(), Duration::from_millis(1500));
    assert_eq!(config.broker.inbox_prefix, "_REPLY");
    // Untouched keys keep their defaults.
    assert_eq!(config.broker.connect_timeout_secs, 10);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.broker.inbox_prefix, "_INBOX");
}

#[test]
fn short_reply_timeout_clamps_upstream_timeout() {
    let (_dir, path) = write_config(
        r"
[upstream]
timeout_ms = 30000

[broker]
reply_timeout_ms = 750
",
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.upstream.timeout(), Duration::from_millis(750));
    assert!(config.upstream.timeout() <= config.broker.reply_timeout());
}

#[test]
fn invalid_values_are_rejected() {
    let (_dir, path) = write_config("[broker]\nreply_timeout_ms = 0\n");
    assert!(Config::load(Some(&path)).is_err());

    let (_dir, path) = write_config("[broker]\nmode = \"carrier-pigeon\"\n");
    assert!(Config::load(Some(&path)).is_err());
}
