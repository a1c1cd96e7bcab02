use std::collections::HashMap;

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings =
        load_settings_from(&dir.path().join("comments.toml"), env_from(&[])).expect("settings");
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.avatar_placeholder, "/assets/avatar_placeholder.png");
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("comments.toml");
    fs::write(
        &path,
        "base_url = \"https://tower.example/api\"\npreserve_draft_on_failure = true\nrequest_timeout_secs = 5\n",
    )
    .expect("write settings");

    let settings = load_settings_from(&path, env_from(&[])).expect("settings");
    assert_eq!(settings.base_url, "https://tower.example/api");
    assert!(settings.preserve_draft_on_failure);
    assert_eq!(settings.request_timeout(), Duration::from_secs(5));
}

#[test]
fn environment_overrides_file_and_prefers_app_prefix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("comments.toml");
    fs::write(&path, "base_url = \"https://from-file/api\"\n").expect("write settings");

    let settings = load_settings_from(
        &path,
        env_from(&[
            ("COMMENTS_BASE_URL", "https://plain-env/api"),
            ("APP__COMMENTS_BASE_URL", "https://app-env/api"),
            ("COMMENTS_PRESERVE_DRAFT_ON_FAILURE", "yes"),
            ("COMMENTS_EVENT_CAPACITY", "16"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.base_url, "https://app-env/api");
    assert!(settings.preserve_draft_on_failure);
    assert_eq!(settings.event_capacity, 16);
}

#[test]
fn malformed_values_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("comments.toml");
    fs::write(&path, "request_timeout_secs = \"soon\"\n").expect("write settings");
    let err = load_settings_from(&path, env_from(&[])).expect_err("bad file");
    assert!(err.to_string().contains("failed to parse settings file"));

    let missing = dir.path().join("absent.toml");
    let err = load_settings_from(&missing, env_from(&[("COMMENTS_REQUEST_TIMEOUT_SECS", "x")]))
        .expect_err("bad env");
    assert!(err.to_string().contains("invalid request timeout"));
}

#[test]
fn zero_event_capacity_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(
        &dir.path().join("comments.toml"),
        env_from(&[("COMMENTS_EVENT_CAPACITY", "0")]),
    )
    .expect("settings");
    assert_eq!(settings.event_capacity, 256);
}
