use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Root the admin API is mounted under, the `SITE_URL` prefix of the
    /// deployed panel.
    pub base_url: String,
    /// Seed CSRF token for the cookie jar. A token set by the server via
    /// Set-Cookie replaces it.
    pub csrf_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".into(),
            csrf_token: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("panel.toml") {
        apply_file_config(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("SITE_URL") {
        settings.base_url = v;
    }
    if let Ok(v) = std::env::var("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Ok(v) = std::env::var("APP__CSRF_TOKEN") {
        settings.csrf_token = Some(v);
    }

    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("base_url") {
            settings.base_url = v.clone();
        }
        if let Some(v) = file_cfg.get("csrf_token") {
            settings.csrf_token = Some(v.clone());
        }
    }
}

/// Relative action paths are joined under the base URL, so it must end
/// with a slash or its last path segment would be dropped.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();

    if raw.is_empty() {
        return Settings::default().base_url;
    }

    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
