use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub prefix: String,
    pub separator: String,
    pub important: Important,
    pub dark_mode: DarkMode,
    pub theme: Option<toml::Table>,
    pub core_plugins: BTreeMap<String, bool>,
}

/// `important = true` marks every utility declaration `!important`;
/// `important = "#app"` scopes utility selectors under that selector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Important {
    Flag(bool),
    Selector(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DarkModeValue")]
pub enum DarkMode {
    Media,
    Class,
    Off,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DarkModeValue {
    Flag(bool),
    Mode(String),
}

impl TryFrom<DarkModeValue> for DarkMode {
    type Error = String;

    fn try_from(value: DarkModeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            DarkModeValue::Flag(false) => Ok(DarkMode::Off),
            DarkModeValue::Flag(true) => Ok(DarkMode::Media),
            DarkModeValue::Mode(mode) => match mode.as_str() {
                "media" => Ok(DarkMode::Media),
                "class" => Ok(DarkMode::Class),
                other => Err(format!(
                    "unknown dark_mode `{}`, expected \"media\", \"class\" or false",
                    other
                )),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            separator: ":".to_string(),
            important: Important::Flag(false),
            dark_mode: DarkMode::Media,
            theme: None,
            core_plugins: BTreeMap::new(),
        }
    }
}

impl Default for Important {
    fn default() -> Self {
        Important::Flag(false)
    }
}

impl Default for DarkMode {
    fn default() -> Self {
        DarkMode::Media
    }
}

impl Config {
    pub fn plugin_enabled(&self, name: &str) -> bool {
        self.core_plugins.get(name).copied().unwrap_or(true)
    }

    /// Identity of a build configuration: equal hashes share one context.
    /// `layer_source` is the `@layer` content of the stylesheet, which
    /// becomes part of the registries.
    pub fn hash_with(&self, layer_source: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self).hash(&mut hasher);
        layer_source.hash(&mut hasher);
        hasher.finish()
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    parse(&text).map_err(|err| match err {
        Error::Config { message } => Error::Config {
            message: format!("failed to parse config {}: {}", path.display(), message),
        },
        other => other,
    })
}

pub fn parse(text: &str) -> Result<Config> {
    toml::from_str(text).map_err(|err| Error::Config {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{Config, DarkMode, Important, load, parse};
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn loads_toml_config() {
        let path = temp_path("ironwind_config");
        let _ = fs::write(
            &path,
            "prefix = \"tw-\"\nimportant = \"#app\"\ndark_mode = \"class\"\n",
        );
        let config = load(&path).expect("config should parse");
        assert_eq!(config.prefix, "tw-");
        assert_eq!(config.separator, ":");
        assert_eq!(config.important, Important::Selector("#app".to_string()));
        assert_eq!(config.dark_mode, DarkMode::Class);
    }

    #[test]
    fn defaults_when_empty() {
        let path = temp_path("ironwind_config_default");
        let _ = fs::write(&path, "");
        let config = load(&path).expect("config should parse");
        assert_eq!(config, Config::default());
        assert!(config.plugin_enabled("padding"));
    }

    #[test]
    fn reads_theme_and_core_plugins() {
        let config = parse(
            r##"
important = true
dark_mode = false

[core_plugins]
cursor = false

[theme.extend.colors.brand]
500 = "#123456"
"##,
        )
        .expect("config should parse");
        assert_eq!(config.important, Important::Flag(true));
        assert_eq!(config.dark_mode, DarkMode::Off);
        assert!(!config.plugin_enabled("cursor"));
        assert!(config.theme.is_some());
    }

    #[test]
    fn rejects_unknown_dark_mode() {
        assert!(parse("dark_mode = \"sometimes\"").is_err());
    }

    #[test]
    fn hash_tracks_config_and_layers() {
        let config = Config::default();
        let other = Config {
            prefix: "tw-".to_string(),
            ..Config::default()
        };
        assert_eq!(config.hash_with(""), Config::default().hash_with(""));
        assert_ne!(config.hash_with(""), other.hash_with(""));
        assert_ne!(config.hash_with(""), config.hash_with(".btn { color: red }"));
    }

    #[test]
    fn reports_missing_file() {
        let err = load(&temp_path("ironwind_missing")).unwrap_err();
        assert!(err.to_string().contains("failed to access"));
    }

    fn temp_path(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}.toml", prefix, nanos))
    }
}
