use crate::settings::{PageMode, Settings};
use eyre::Result;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    filepath: PathBuf,
}

impl Config {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join("configuration.json");

        if filepath.exists() {
            Self::load_from(filepath)
        } else {
            // Save initial config if it doesn't exist
            let settings = Settings::default();
            let initial_config = serde_json::json!({ "Setting": settings });
            fs::create_dir_all(&prefix)?;
            fs::write(&filepath, serde_json::to_string_pretty(&initial_config)?)?;
            Ok(Self { settings, filepath })
        }
    }

    /// Load configuration from a custom path. Missing or unknown fields
    /// keep their defaults; a malformed file falls back to defaults
    /// entirely.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            if let Ok(user_config) = serde_json::from_str::<serde_json::Value>(&config_str)
                && let Some(user_settings_map) =
                    user_config.get("Setting").and_then(|v| v.as_object())
            {
                if let Some(val) = user_settings_map.get("text_size").and_then(|v| v.as_u64()) {
                    settings.text_size = val as u32;
                }
                if let Some(val) = user_settings_map
                    .get("margin_width")
                    .and_then(|v| v.as_u64())
                {
                    settings.margin_width = val as u32;
                }
                if let Some(val) = user_settings_map
                    .get("margin_height")
                    .and_then(|v| v.as_u64())
                {
                    settings.margin_height = val as u32;
                }
                if let Some(val) = user_settings_map.get("page_mode").and_then(|v| v.as_str()) {
                    settings.page_mode = match val {
                        "simulation" => PageMode::Simulation,
                        "cover" => PageMode::Cover,
                        "slide" => PageMode::Slide,
                        "scroll" => PageMode::Scroll,
                        "none" => PageMode::None,
                        _ => settings.page_mode,
                    };
                }
                if let Some(val) = user_settings_map
                    .get("night_mode")
                    .and_then(|v| v.as_bool())
                {
                    settings.night_mode = val;
                }
            }
        }

        Ok(Self { settings, filepath })
    }

    /// Get the configuration file path
    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({ "Setting": self.settings });
        let config_str = serde_json::to_string_pretty(&config_json)?;

        // Ensure directory exists before writing
        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.filepath, config_str)?;
        Ok(())
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(config_home).join("folio");
        return Ok(path);
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join("folio");
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(".folio"));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".folio"));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}
