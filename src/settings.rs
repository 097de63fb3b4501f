use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::DetectorBackend;
use crate::resolver::DEFAULT_EXTERNAL_LIMIT;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const ENABLE_EXTERNAL_ENV: &str = "ENABLE_EXTERNAL";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub catalog_path: PathBuf,
    pub external_enabled: bool,
    pub external_base_url: Option<String>,
    pub external_max_results: usize,
    pub detector_backend: DetectorBackend,
    pub local_delay_ms: u64,
    pub detector_seed: Option<u64>,
    pub max_terms: usize,
    pub vision_model: Option<String>,
    pub vision_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:5000".to_string(),
            catalog_path: PathBuf::from("data/recipes.json"),
            external_enabled: false,
            external_base_url: None,
            external_max_results: DEFAULT_EXTERNAL_LIMIT,
            detector_backend: DetectorBackend::Local,
            local_delay_ms: 1500,
            detector_seed: None,
            max_terms: 20,
            vision_model: None,
            vision_key: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    catalog: Option<CatalogSettings>,
    external: Option<ExternalSettings>,
    detector: Option<DetectorSettings>,
    vision: Option<VisionSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogSettings {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalSettings {
    enabled: Option<bool>,
    base_url: Option<String>,
    max_results: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectorSettings {
    backend: Option<DetectorBackend>,
    local_delay_ms: Option<u64>,
    seed: Option<u64>,
    max_terms: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct VisionSettings {
    model: Option<String>,
    key: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let embedded: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(embedded);
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    if let Some(enabled) = env_flag(ENABLE_EXTERNAL_ENV) {
        settings.external_enabled = enabled;
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server
            && let Some(addr) = non_blank(server.addr)
        {
            self.server_addr = addr;
        }
        if let Some(catalog) = incoming.catalog
            && let Some(path) = non_blank(catalog.path)
        {
            self.catalog_path = PathBuf::from(path);
        }
        if let Some(external) = incoming.external {
            if let Some(enabled) = external.enabled {
                self.external_enabled = enabled;
            }
            if let Some(base_url) = non_blank(external.base_url) {
                self.external_base_url = Some(base_url);
            }
            if let Some(limit) = external.max_results
                && limit > 0
            {
                self.external_max_results = limit.min(DEFAULT_EXTERNAL_LIMIT);
            }
        }
        if let Some(detector) = incoming.detector {
            if let Some(backend) = detector.backend {
                self.detector_backend = backend;
            }
            if let Some(delay) = detector.local_delay_ms {
                self.local_delay_ms = delay;
            }
            if detector.seed.is_some() {
                self.detector_seed = detector.seed;
            }
            if let Some(max_terms) = detector.max_terms
                && max_terms > 0
            {
                self.max_terms = max_terms;
            }
        }
        if let Some(vision) = incoming.vision {
            if let Some(model) = non_blank(vision.model) {
                self.vision_model = Some(model);
            }
            if let Some(key) = non_blank(vision.key) {
                self.vision_key = Some(key);
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".recipe-assistant-rust"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn embedded_defaults_apply() {
        with_temp_home(|_| {
            let settings = load_settings(None).expect("settings");
            assert_eq!(settings.server_addr, "0.0.0.0:5000");
            assert_eq!(settings.catalog_path, PathBuf::from("data/recipes.json"));
            assert_eq!(settings.external_max_results, 5);
            assert_eq!(settings.detector_backend, DetectorBackend::Local);
            assert_eq!(settings.max_terms, 20);
            assert_eq!(settings.vision_model, None);
        });
    }

    #[test]
    fn home_settings_file_is_created() {
        with_temp_home(|home| {
            load_settings(None).expect("settings");
            let written = home.join(".recipe-assistant-rust").join("settings.toml");
            let content = fs::read_to_string(written).expect("home settings");
            assert!(content.contains("[detector]"));
        });
    }

    #[test]
    fn extra_file_overrides_earlier_layers() {
        with_temp_home(|home| {
            let local = home.join(".recipe-assistant-rust");
            fs::create_dir_all(&local).expect("dir");
            fs::write(
                local.join("settings.local.toml"),
                "[detector]\nbackend = \"external\"\nseed = 3\n",
            )
            .expect("write");
            let extra = home.join("extra.toml");
            fs::write(
                &extra,
                "[server]\naddr = \"127.0.0.1:8080\"\n[detector]\nmax_terms = 0\n[vision]\nmodel = \"gemini\"\nkey = \"  \"\n",
            )
            .expect("write");

            let settings = load_settings(Some(extra.as_path())).expect("settings");
            assert_eq!(settings.server_addr, "127.0.0.1:8080");
            assert_eq!(settings.detector_backend, DetectorBackend::External);
            assert_eq!(settings.detector_seed, Some(3));
            assert_eq!(settings.max_terms, 20);
            assert_eq!(settings.vision_model.as_deref(), Some("gemini"));
            assert_eq!(settings.vision_key, None);
        });
    }

    #[test]
    fn external_result_limit_is_capped() {
        with_temp_home(|home| {
            let extra = home.join("limits.toml");
            fs::write(&extra, "[external]\nmax_results = 50\n").expect("write");
            let settings = load_settings(Some(extra.as_path())).expect("settings");
            assert_eq!(settings.external_max_results, 5);

            fs::write(&extra, "[external]\nmax_results = 2\n").expect("write");
            let settings = load_settings(Some(extra.as_path())).expect("settings");
            assert_eq!(settings.external_max_results, 2);
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        with_temp_home(|home| {
            let err = load_settings(Some(home.join("nope.toml").as_path())).expect_err("missing");
            assert!(err.to_string().contains("settings file not found"));
        });
    }

    #[test]
    fn env_flag_values() {
        assert_eq!(env_flag("RECIPE_ASSISTANT_UNSET_FLAG_FOR_TEST"), None);
        with_temp_home(|_| {
            crate::test_util::set_env(ENABLE_EXTERNAL_ENV, Some("TRUE"));
            let enabled = load_settings(None).expect("settings").external_enabled;
            crate::test_util::set_env(ENABLE_EXTERNAL_ENV, Some("false"));
            let disabled = load_settings(None).expect("settings").external_enabled;
            crate::test_util::set_env(ENABLE_EXTERNAL_ENV, None);
            assert!(enabled);
            assert!(!disabled);
        });
    }
}
