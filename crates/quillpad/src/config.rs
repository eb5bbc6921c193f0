use anyhow::Result;
use directories::ProjectDirs;
use std::path::PathBuf;
use tokio::fs::try_exists;

use crate::stamp::DateFormat;

const CONFIG_FILE_NAME: &str = "config.txt";
const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

/// Persisted preferences, stored as flat `key=value` lines. Unknown keys are
/// ignored on read so the file survives version skew in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub default_open_dir: Option<PathBuf>,
    pub default_save_dir: Option<PathBuf>,
    pub recent_files: Vec<PathBuf>,
    pub date_format: DateFormat,
    pub include_date: bool,
    pub date_text: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            default_open_dir: None,
            default_save_dir: None,
            recent_files: Vec::new(),
            date_format: DateFormat::Short,
            include_date: true,
            date_text: String::new(),
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if try_exists(&config_path).await? {
                match tokio::fs::read_to_string(&config_path).await {
                    Ok(content) => {
                        let mut config = Self::parse(&content);
                        config.validate();
                        log::info!("Loaded config from: {}", config_path.display());
                        return Ok(config);
                    }
                    Err(io_err) => {
                        log::error!("Failed to read config file: {}", io_err);
                    }
                }
            } else {
                log::info!("Config file does not exist, creating default");
            }
        }

        let default_config = Self::default();
        let _ = default_config.save().await;
        Ok(default_config)
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_path() {
            if let Some(parent) = config_path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!(
                        "Could not create config directory {}: {}",
                        parent.display(),
                        e
                    )
                })?;
            }

            let mut config_to_save = self.clone();
            config_to_save.validate();

            tokio::fs::write(&config_path, config_to_save.to_file_string())
                .await
                .map_err(|e| {
                    anyhow::anyhow!("Could not write config file {}: {}", config_path.display(), e)
                })?;
            log::info!("Saved config to: {}", config_path.display());
        }
        Ok(())
    }

    /// Parse `key=value` lines onto the defaults. Malformed lines and unknown
    /// keys are skipped.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key {
                "theme" => {
                    if let Some(theme) = Theme::parse(value) {
                        config.theme = theme;
                    }
                }
                "default_open_dir" => {
                    config.default_open_dir =
                        (!value.is_empty()).then(|| PathBuf::from(value));
                }
                "default_save_dir" => {
                    config.default_save_dir =
                        (!value.is_empty()).then(|| PathBuf::from(value));
                }
                "recent_files" => {
                    config.recent_files = value
                        .split('|')
                        .filter(|entry| !entry.is_empty())
                        .map(PathBuf::from)
                        .collect();
                }
                "date_format" => {
                    if let Some(format) = DateFormat::parse(value) {
                        config.date_format = format;
                    }
                }
                "include_date" => {
                    config.include_date = value == "true";
                }
                "date_text" => {
                    config.date_text = value.to_string();
                }
                other => {
                    log::debug!("Ignoring unknown config key: {}", other);
                }
            }
        }
        config
    }

    pub fn to_file_string(&self) -> String {
        let dir_str = |dir: &Option<PathBuf>| {
            dir.as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let recent = self
            .recent_files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("|");

        format!(
            "default_open_dir={}\n\
             default_save_dir={}\n\
             theme={}\n\
             recent_files={}\n\
             date_format={}\n\
             include_date={}\n\
             date_text={}\n",
            dir_str(&self.default_open_dir),
            dir_str(&self.default_save_dir),
            self.theme.as_str(),
            recent,
            self.date_format.as_str(),
            self.include_date,
            self.date_text,
        )
    }

    /// Clamp values that drifted out of range, with a note in the log.
    pub fn validate(&mut self) {
        if self.recent_files.len() > MAX_RECENT_FILES {
            log::warn!(
                "Trimming recent file list from {} entries",
                self.recent_files.len()
            );
            self.recent_files.truncate(MAX_RECENT_FILES);
        }
    }

    /// Record a file as most recently used, deduplicated, capped.
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("QUILLPAD_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("QUILLPAD_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }

        ProjectDirs::from("com", "quillpad", "quillpad")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

/// Serializes tests that redirect the config path through the environment.
#[cfg(test)]
pub(crate) fn test_env_lock() -> &'static std::sync::Mutex<()> {
    static LOCK: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    LOCK.get_or_init(|| std::sync::Mutex::new(()))
}
