use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "lending.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ledger_url: String,
    pub module_address: String,
    pub module_name: String,
    pub agent_url: Option<String>,
    pub finality_timeout_secs: u64,
    pub finality_poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ledger_url: "https://fullnode.testnet.aptoslabs.com".into(),
            module_address: "0x03f4fe0fa07e8733ca0eb08be6d46e8ae929afdc33222164d79f5cdc89137970"
                .into(),
            module_name: "AutoLending".into(),
            agent_url: None,
            finality_timeout_secs: 20,
            finality_poll_interval_ms: 500,
        }
    }
}

impl Settings {
    pub fn finality_timeout(&self) -> Duration {
        Duration::from_secs(self.finality_timeout_secs)
    }

    pub fn finality_poll_interval(&self) -> Duration {
        Duration::from_millis(self.finality_poll_interval_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    ledger_url: Option<String>,
    module_address: Option<String>,
    module_name: Option<String>,
    agent_url: Option<String>,
    finality_timeout_secs: Option<u64>,
    finality_poll_interval_ms: Option<u64>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file if readable, then environment overrides.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw, path);
    }
    apply_env_overrides(&mut settings, env);

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str, path: &Path) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(path = %path.display(), "ignoring malformed settings file: {err}");
            return;
        }
    };

    if let Some(v) = file_cfg.ledger_url {
        settings.ledger_url = v;
    }
    if let Some(v) = file_cfg.module_address {
        settings.module_address = v;
    }
    if let Some(v) = file_cfg.module_name {
        settings.module_name = v;
    }
    if let Some(v) = file_cfg.agent_url {
        settings.agent_url = Some(v);
    }
    if let Some(v) = file_cfg.finality_timeout_secs {
        settings.finality_timeout_secs = v;
    }
    if let Some(v) = file_cfg.finality_poll_interval_ms {
        settings.finality_poll_interval_ms = v;
    }
}

fn env_value(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    env(&format!("APP__{name}"))
        .or_else(|| env(&format!("LENDING_{name}")))
        .filter(|v| !v.trim().is_empty())
}

fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env_value(&env, "LEDGER_URL") {
        settings.ledger_url = v;
    }
    if let Some(v) = env_value(&env, "MODULE_ADDRESS") {
        settings.module_address = v;
    }
    if let Some(v) = env_value(&env, "MODULE_NAME") {
        settings.module_name = v;
    }
    if let Some(v) = env_value(&env, "AGENT_URL") {
        settings.agent_url = Some(v);
    }
    if let Some(v) = env_value(&env, "FINALITY_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.finality_timeout_secs = parsed,
            Err(err) => warn!("ignoring FINALITY_TIMEOUT_SECS={v}: {err}"),
        }
    }
    if let Some(v) = env_value(&env, "FINALITY_POLL_INTERVAL_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.finality_poll_interval_ms = parsed,
            Err(err) => warn!("ignoring FINALITY_POLL_INTERVAL_MS={v}: {err}"),
        }
    }
}
