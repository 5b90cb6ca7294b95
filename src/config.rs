use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

/// Version string written to and expected in config files
pub const CONFIG_VERSION: &str = "0.1";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,
    pub agent: AgentConfig,
    pub samples: SamplesConfig,
    pub loading: LoadingConfig,
    pub fast_path: FastPathConfig,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

/// Settings for the language-model agent that answers generic questions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    /// Full URL of an OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Maximum number of model calls spent on one question
    pub max_steps: usize,
    /// Rows of a SQL result shown back to the model
    pub result_row_limit: usize,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplesConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub delimiter: u8,
    pub infer_schema_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FastPathConfig {
    pub key_column: String,
    pub quantity_column: String,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub preview_rows: usize,
    pub chart_row_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub chart_series: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            agent: AgentConfig::default(),
            samples: SamplesConfig::default(),
            loading: LoadingConfig::default(),
            fast_path: FastPathConfig::default(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_steps: 5,
            result_row_limit: 20,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("sample_data"),
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: 1000,
        }
    }
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            key_column: "sku_id".to_string(),
            quantity_column: "units_sold".to_string(),
            limit: 5,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            chart_row_limit: 10_000,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            table_header: "white".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
            chart_series: ["cyan", "yellow", "green", "magenta", "blue", "red"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    /// Load configuration from ~/.config/<app_name>/config.toml, falling back to defaults
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::load_from(&config_manager)
    }

    /// Load configuration from the directory managed by `config_manager`
    pub fn load_from(config_manager: &ConfigManager) -> Result<Self> {
        let config_path = config_manager.config_path("config.toml");

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                eyre!(
                    "Failed to read config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?;
            Self::from_toml(&content).map_err(|e| {
                eyre!(
                    "Failed to parse config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?
        } else {
            AppConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) TOML document; absent keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with(CONFIG_VERSION) {
            return Err(eyre!(
                "Unsupported config version: {}. Expected {}.x",
                self.version,
                CONFIG_VERSION
            ));
        }

        if self.agent.api_key_env.trim().is_empty() {
            return Err(eyre!("agent.api_key_env must name an environment variable"));
        }
        if self.agent.max_steps == 0 {
            return Err(eyre!("agent.max_steps must be greater than 0"));
        }
        if self.agent.result_row_limit == 0 {
            return Err(eyre!("agent.result_row_limit must be greater than 0"));
        }
        if self.fast_path.key_column.trim().is_empty()
            || self.fast_path.quantity_column.trim().is_empty()
        {
            return Err(eyre!("fast_path column names must not be empty"));
        }
        if self.fast_path.limit == 0 {
            return Err(eyre!("fast_path.limit must be greater than 0"));
        }
        if self.display.preview_rows == 0 {
            return Err(eyre!("display.preview_rows must be greater than 0"));
        }
        if self.display.chart_row_limit == 0 {
            return Err(eyre!("display.chart_row_limit must be greater than 0"));
        }
        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl ColorConfig {
    fn named(&self) -> [(&'static str, &str); 13] {
        [
            ("primary", self.primary.as_str()),
            ("secondary", self.secondary.as_str()),
            ("success", self.success.as_str()),
            ("error", self.error.as_str()),
            ("warning", self.warning.as_str()),
            ("dimmed", self.dimmed.as_str()),
            ("background", self.background.as_str()),
            ("controls_bg", self.controls_bg.as_str()),
            ("text_primary", self.text_primary.as_str()),
            ("text_secondary", self.text_secondary.as_str()),
            ("table_header", self.table_header.as_str()),
            ("modal_border", self.modal_border.as_str()),
            ("modal_border_active", self.modal_border_active.as_str()),
        ]
    }

    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.named() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color for theme.colors.{}: {}", name, e))?;
        }
        if self.chart_series.is_empty() {
            return Err(eyre!("theme.colors.chart_series must list at least one color"));
        }
        for value in &self.chart_series {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color in theme.colors.chart_series: {}", e))?;
        }
        Ok(())
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    pub fn new() -> Self {
        let support = supports_color::on(Stream::Stdout);
        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color: std::env::var("NO_COLOR").is_ok(),
        }
    }

    /// Parse a color string: a name, `#rrggbb`, or `indexed(n)`
    pub fn parse(&self, s: &str) -> Result<Color> {
        let value = s.trim().to_lowercase();

        if let Some(hex) = value.strip_prefix('#') {
            let (r, g, b) = parse_hex(hex).ok_or_else(|| {
                eyre!("Invalid hex color: '{}'. Expected format: #rrggbb", s.trim())
            })?;
            if self.no_color {
                return Ok(Color::Reset);
            }
            return Ok(if self.supports_true_color {
                Color::Rgb(r, g, b)
            } else if self.supports_256 {
                Color::Indexed(rgb_to_256_color(r, g, b))
            } else {
                rgb_to_basic_ansi(r, g, b)
            });
        }

        if let Some(inner) = value
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let index = inner.trim().parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    s.trim()
                )
            })?;
            return Ok(if self.no_color {
                Color::Reset
            } else {
                Color::Indexed(index)
            });
        }

        let color = match value.replace(' ', "_").as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" | "dark_gray" | "dark_grey" | "bright_black" => Color::Indexed(8),
            "light_gray" | "light_grey" => Color::Indexed(7),
            "bright_red" => Color::Indexed(9),
            "bright_green" => Color::Indexed(10),
            "bright_yellow" => Color::Indexed(11),
            "bright_blue" => Color::Indexed(12),
            "bright_magenta" => Color::Indexed(13),
            "bright_cyan" => Color::Indexed(14),
            "bright_white" => Color::Indexed(15),
            "reset" | "default" => Color::Reset,
            _ => {
                return Err(eyre!(
                    "Unknown color name: '{}'. Use an ANSI name (red, bright_blue, ...), \
                     #rrggbb, or indexed(n)",
                    s.trim()
                ))
            }
        };

        Ok(if self.no_color { Color::Reset } else { color })
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Nearest entry in the xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let spread = r.max(g).max(b) - r.min(g).min(b);
    if spread < 10 {
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        return match gray {
            0..=7 => 16,
            248.. => 231,
            _ => 232 + ((gray - 8) * 24 / 240) as u8,
        };
    }
    let cube = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * cube(r) + 6 * cube(g) + cube(b)
}

/// Nearest of the eight basic ANSI colors
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let spread = r.max(g).max(b) - r.min(g).min(b);
    if spread < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }
    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
    pub chart_series: Vec<Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let mut colors = HashMap::new();
        for (name, value) in config.colors.named() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }
        let chart_series = config
            .colors
            .chart_series
            .iter()
            .map(|value| parser.parse(value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            colors,
            chart_series,
        })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Color for the n-th chart series, cycling through the palette
    pub fn series(&self, index: usize) -> Color {
        if self.chart_series.is_empty() {
            return Color::Reset;
        }
        self.chart_series[index % self.chart_series.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
            chart_series: Vec::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("ff8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex("ff80"), None);
        assert_eq!(parse_hex("gg0000"), None);
    }

    #[test]
    fn test_rgb_to_256_color() {
        assert_eq!(rgb_to_256_color(0, 0, 0), 16);
        assert_eq!(rgb_to_256_color(255, 255, 255), 231);
        assert_eq!(rgb_to_256_color(255, 0, 0), 196);
    }

    #[test]
    fn test_rgb_to_basic_ansi() {
        assert_eq!(rgb_to_basic_ansi(250, 10, 10), Color::Red);
        assert_eq!(rgb_to_basic_ansi(10, 10, 250), Color::Blue);
        assert_eq!(rgb_to_basic_ansi(20, 20, 20), Color::Black);
    }

    #[test]
    fn test_theme_series_cycles() {
        let theme = Theme {
            colors: HashMap::new(),
            chart_series: vec![Color::Red, Color::Blue],
        };
        assert_eq!(theme.series(0), Color::Red);
        assert_eq!(theme.series(3), Color::Blue);
    }
}
