use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("github_dark", include_str!("../themes/github_dark.toml")),
    ("nord", include_str!("../themes/nord.toml")),
    ("solarized_light", include_str!("../themes/solarized_light.toml")),
];

const DEFAULT_BACKGROUND: &str = "#ffffff";
const DEFAULT_TEXT: &str = "#24292f";
const DEFAULT_GROUP_FILL: &str = "#f6f8fa";
const DEFAULT_GROUP_STROKE: &str = "#0969da";
const DEFAULT_HIGHLIGHT: &str = "#bf8700";
const FONT_FAMILY: &str = "sans-serif";
const FONT_SIZE: f32 = 14.0;

/// Canvas colors and typography. Node fills come from the classification
/// table, not from the theme.
///
/// Theme files are either Alacritty color schemes or this struct written out
/// as TOML, where any missing key takes a GitHub-light default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Theme {
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_text")]
    pub text_color: String,
    #[serde(default = "default_text")]
    pub edge_color: String,
    #[serde(default = "default_group_fill")]
    pub group_fill: String,
    #[serde(default = "default_group_stroke")]
    pub group_stroke: String,
    #[serde(default = "default_highlight")]
    pub highlight_color: String,
    #[serde(default = "default_background")]
    pub panel_fill: String,

    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}
fn default_text() -> String {
    DEFAULT_TEXT.to_string()
}
fn default_group_fill() -> String {
    DEFAULT_GROUP_FILL.to_string()
}
fn default_group_stroke() -> String {
    DEFAULT_GROUP_STROKE.to_string()
}
fn default_highlight() -> String {
    DEFAULT_HIGHLIGHT.to_string()
}
fn default_font_family() -> String {
    FONT_FAMILY.to_string()
}
fn default_font_size() -> f32 {
    FONT_SIZE
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_builtin("solarized_light").expect("built-in solarized_light theme must parse")
    }
}

#[derive(Debug, Deserialize)]
struct AlacrittyColors {
    primary: AlacrittyPrimary,
    normal: AlacrittyNormal,
}

#[derive(Debug, Deserialize)]
struct AlacrittyPrimary {
    background: String,
    foreground: String,
}

#[derive(Debug, Deserialize)]
struct AlacrittyNormal {
    blue: String,
    yellow: String,
    white: String,
}

#[derive(Debug, Deserialize)]
struct AlacrittyTheme {
    colors: AlacrittyColors,
}

impl Theme {
    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                Error::Theme(format!(
                    "unknown built-in theme '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                ))
            })?;
        Self::from_alacritty_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_alacritty_yaml(content: &str) -> Result<Self> {
        let alacritty: AlacrittyTheme = serde_yaml::from_str(content)
            .map_err(|e| Error::Theme(format!("failed to parse Alacritty YAML: {}", e)))?;

        Ok(Self::from_alacritty_theme(alacritty))
    }

    pub fn from_alacritty_toml(content: &str) -> Result<Self> {
        let alacritty: AlacrittyTheme = toml::from_str(content)
            .map_err(|e| Error::Theme(format!("failed to parse Alacritty TOML: {}", e)))?;

        Ok(Self::from_alacritty_theme(alacritty))
    }

    /// A theme file path, or the name of a built-in theme.
    pub fn load(theme_arg: &str) -> Result<Self> {
        let path = Path::new(theme_arg);
        if !path.is_file() {
            return Self::from_builtin(theme_arg);
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        // Alacritty moved to TOML; try that first
        if let Ok(theme) = Self::from_alacritty_toml(&content) {
            Ok(theme)
        } else if let Ok(theme) = Self::from_alacritty_yaml(&content) {
            Ok(theme)
        } else if let Ok(theme) = toml::from_str::<Theme>(&content) {
            Ok(theme)
        } else {
            Err(Error::Theme(format!(
                "failed to parse {} as TOML or YAML",
                path.display()
            )))
        }
    }

    fn from_alacritty_theme(alacritty: AlacrittyTheme) -> Self {
        let colors = alacritty.colors;

        Theme {
            background_color: colors.primary.background.clone(),
            text_color: colors.primary.foreground.clone(),
            edge_color: colors.primary.foreground,
            group_fill: colors.normal.white,
            group_stroke: colors.normal.blue,
            highlight_color: colors.normal.yellow,
            panel_fill: colors.primary.background,
            font_family: FONT_FAMILY.to_string(),
            font_size: FONT_SIZE,
        }
    }
}
