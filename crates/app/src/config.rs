use anyhow::{Context, Result};
use shared::settings::AssistantSettings;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `model` from the settings file
pub const MODEL_ENV: &str = "GEMINI_MODEL";

pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Health Assistant", "HealthAssistant")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Settings from `explicit` if given, else the per-user file, else defaults.
///
/// An explicit path must exist; the per-user file is optional.
pub fn load_settings(explicit: Option<&Path>) -> Result<AssistantSettings> {
    let mut settings = match explicit {
        Some(path) => read_settings(path)?,
        None => match config_path() {
            Some(path) if path.exists() => read_settings(&path)?,
            _ => AssistantSettings::default(),
        },
    };
    apply_model_override(&mut settings, std::env::var(MODEL_ENV).ok());
    tracing::debug!(model = %settings.model, base_url = %settings.base_url, "settings loaded");
    Ok(settings)
}

fn read_settings(path: &Path) -> Result<AssistantSettings> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn apply_model_override(settings: &mut AssistantSettings, model: Option<String>) {
    if let Some(model) = model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
        settings.model = model;
    }
}
