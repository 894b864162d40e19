use crate::models::{DEFAULT_MARGIN_HEIGHT, DEFAULT_MARGIN_WIDTH};
use serde::{Deserialize, Serialize};

/// Page-turn animation the host renders. The core only stores it; page
/// boundaries do not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    Simulation,
    Cover,
    Slide,
    Scroll,
    None,
}

impl Default for PageMode {
    fn default() -> Self {
        PageMode::Simulation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Body font size in px; the title font derives from it.
    pub text_size: u32,
    pub margin_width: u32,
    pub margin_height: u32,
    pub page_mode: PageMode,
    pub night_mode: bool,
}

impl Settings {
    pub fn merge(&mut self, other: Self) {
        self.text_size = other.text_size;
        self.margin_width = other.margin_width;
        self.margin_height = other.margin_height;
        self.page_mode = other.page_mode;
        self.night_mode = other.night_mode;
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_size: 16,
            margin_width: DEFAULT_MARGIN_WIDTH,
            margin_height: DEFAULT_MARGIN_HEIGHT,
            page_mode: PageMode::default(),
            night_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.text_size, 16);
        assert_eq!(settings.margin_width, DEFAULT_MARGIN_WIDTH);
        assert_eq!(settings.margin_height, DEFAULT_MARGIN_HEIGHT);
        assert_eq!(settings.page_mode, PageMode::Simulation);
        assert!(!settings.night_mode);
    }

    #[test]
    fn test_settings_merge() {
        let mut settings = Settings::default();
        settings.merge(Settings {
            text_size: 22,
            margin_width: 10,
            margin_height: 20,
            page_mode: PageMode::Scroll,
            night_mode: true,
        });
        assert_eq!(settings.text_size, 22);
        assert_eq!(settings.page_mode, PageMode::Scroll);
        assert!(settings.night_mode);
    }

    #[test]
    fn test_settings_serde_round_trip() {
        let settings = Settings {
            text_size: 18,
            margin_width: 12,
            margin_height: 24,
            page_mode: PageMode::Cover,
            night_mode: true,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_settings_partial_json_uses_defaults() {
        let back: Settings = serde_json::from_str(r#"{"text_size": 20}"#).unwrap();
        assert_eq!(back.text_size, 20);
        assert_eq!(back.margin_width, DEFAULT_MARGIN_WIDTH);
        assert_eq!(back.page_mode, PageMode::Simulation);
    }

    #[test]
    fn test_page_mode_snake_case() {
        let json = serde_json::to_string(&PageMode::Cover).unwrap();
        assert_eq!(json, r#""cover""#);
    }
}
