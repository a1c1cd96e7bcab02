use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::session::DEFAULT_AVATAR_PLACEHOLDER;

pub const DEFAULT_SETTINGS_FILE: &str = "comments.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub avatar_placeholder: String,
    pub request_timeout_secs: u64,
    /// Keep the draft when the create call fails instead of clearing it as
    /// soon as the call is issued.
    pub preserve_draft_on_failure: bool,
    pub event_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".into(),
            avatar_placeholder: DEFAULT_AVATAR_PLACEHOLDER.into(),
            request_timeout_secs: 30,
            preserve_draft_on_failure: false,
            event_capacity: 256,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    base_url: Option<String>,
    avatar_placeholder: Option<String>,
    request_timeout_secs: Option<u64>,
    preserve_draft_on_failure: Option<bool>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> anyhow::Result<ClientSettings> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `path` if it exists, then environment overrides looked up
/// through `env`.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file_settings(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, env)?;

    if settings.event_capacity == 0 {
        settings.event_capacity = ClientSettings::default().event_capacity;
    }

    Ok(settings)
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.avatar_placeholder {
        settings.avatar_placeholder = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.preserve_draft_on_failure {
        settings.preserve_draft_on_failure = v;
    }
    if let Some(v) = file_cfg.event_capacity {
        settings.event_capacity = v;
    }
}

fn apply_env_overrides(
    settings: &mut ClientSettings,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let lookup = |name: &str| {
        env(&format!("APP__COMMENTS_{name}")).or_else(|| env(&format!("COMMENTS_{name}")))
    };

    if let Some(v) = lookup("BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("AVATAR_PLACEHOLDER") {
        settings.avatar_placeholder = v;
    }
    if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("invalid request timeout '{v}'"))?;
    }
    if let Some(v) = lookup("PRESERVE_DRAFT_ON_FAILURE") {
        settings.preserve_draft_on_failure = parse_flag(&v)
            .with_context(|| format!("invalid draft preservation flag '{v}'"))?;
    }
    if let Some(v) = lookup("EVENT_CAPACITY") {
        settings.event_capacity = v
            .trim()
            .parse()
            .with_context(|| format!("invalid event capacity '{v}'"))?;
    }

    Ok(())
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
