//! Configuration management for orcaprep.
//!
//! Settings are read from INI files with the following precedence:
//!
//! 1. Local configuration (`./orcaprep_config.cfg`)
//! 2. User configuration (`~/.config/orcaprep/orcaprep_config.cfg`)
//! 3. System configuration (`/etc/orcaprep/orcaprep_config.cfg`)
//! 4. Built-in defaults
//!
//! Each file only needs the keys it wants to change; everything else falls
//! through to the next layer.
//!
//! # Configuration File Format
//!
//! ```ini
//! [general]
//! maxcore = 3000
//! nprocs = 1
//! output_dir = .
//!
//! [embedding]
//! command = obabel
//! speed = med
//!
//! [menu]
//! methods = B3LYP,PBE0,HF
//! basis_sets = STO-3G,def2-SVP
//!
//! [logging]
//! level = info
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use orcaprep::settings::SettingsManager;
//!
//! let settings = SettingsManager::load()?;
//! println!("obabel command: {}", settings.embedding().command);
//! # Ok::<(), orcaprep::settings::ConfigError>(())
//! ```

use crate::assembler::Resources;
use crate::embedding::EmbedSpeed;
use configparser::ini::Ini;
use env_logger::{Builder, Env, Target};
use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file at every level of the hierarchy.
pub const CONFIG_FILE_NAME: &str = "orcaprep_config.cfg";

type Section = HashMap<String, Option<String>>;

/// Errors that can occur during configuration loading and processing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error when reading or writing configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// All program settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Resources and output location
    pub general: GeneralSettings,
    /// Structure-generation service
    pub embedding: EmbeddingSettings,
    /// Choices offered by the interactive menus
    pub menu: MenuSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Resources and output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// `%maxcore` value in MB (default: 3000)
    pub maxcore: u32,
    /// Parallel processes; `%pal` is written when > 1 (default: 1)
    pub nprocs: u32,
    /// Directory generated files are written to (default: ".")
    pub output_dir: PathBuf,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            maxcore: 3000,
            nprocs: 1,
            output_dir: PathBuf::from("."),
        }
    }
}

impl GeneralSettings {
    /// Resource directives for the assembler.
    pub fn resources(&self) -> Resources {
        Resources {
            maxcore: self.maxcore,
            nprocs: self.nprocs,
        }
    }
}

/// Structure-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Open Babel executable (default: "obabel")
    pub command: String,
    /// 3D generation effort (default: med)
    pub speed: EmbedSpeed,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            command: "obabel".to_string(),
            speed: EmbedSpeed::Medium,
        }
    }
}

/// Menu choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSettings {
    /// Electronic structure methods
    pub methods: Vec<String>,
    /// Basis sets
    pub basis_sets: Vec<String>,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            methods: ["B3LYP", "PBE0", "wB97X-D3", "HF", "MP2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            basis_sets: ["STO-3G", "6-31G*", "def2-SVP", "def2-TZVP", "cc-pVDZ"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: off, error, warn, info, debug, trace (default: "info")
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// The configured level as a filter. Levels are validated on load, so
    /// this only falls back to `Info` for hand-built settings.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Console logger at the configured level. Filters found in `env`
    /// (normally `RUST_LOG`) are applied last and take precedence.
    pub fn logger_builder(&self, env: Env<'_>) -> Builder {
        let mut builder = Builder::new();
        builder
            .filter_level(self.level_filter())
            .parse_env(env)
            .target(Target::Stdout)
            .format_timestamp_millis();
        builder
    }
}

/// Configuration manager that handles loading and accessing program settings.
pub struct SettingsManager {
    settings: Settings,
    config_source: String,
    skipped: Vec<String>,
}

impl SettingsManager {
    /// Loads configuration from the local, user and system files.
    ///
    /// A file that exists but cannot be read or parsed is skipped with a
    /// warning; the remaining layers still apply.
    pub fn load() -> Result<Self, ConfigError> {
        let mut candidates = Vec::new();
        if let Some(system_path) = Self::get_system_config_path() {
            candidates.push(system_path);
        }
        if let Some(user_path) = Self::get_user_config_path() {
            candidates.push(user_path);
        }
        candidates.push(PathBuf::from(CONFIG_FILE_NAME));

        let manager = Self::load_from(&candidates);
        debug!("Configuration loaded from: {}", manager.config_source);
        Ok(manager)
    }

    /// Applies existing files from `paths` in order, later files overriding
    /// earlier ones.
    pub fn load_from(paths: &[PathBuf]) -> Self {
        let mut settings = Settings::default();
        let mut config_source = "built-in defaults".to_string();
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_config(path, &settings) {
                Ok(layered) => {
                    settings = layered;
                    config_source = path.display().to_string();
                    debug!("Loaded configuration from: {}", path.display());
                }
                Err(e) => {
                    let problem = format!("Failed to load config from {}: {}", path.display(), e);
                    warn!("{}", problem);
                    skipped.push(problem);
                }
            }
        }

        Self {
            settings,
            config_source,
            skipped,
        }
    }

    /// Wraps already-built settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            config_source: "in-memory settings".to_string(),
            skipped: Vec::new(),
        }
    }

    /// Why configuration files that exist were skipped, one entry per file.
    pub fn skipped_files(&self) -> &[String] {
        &self.skipped
    }

    /// Returns the source of the loaded configuration.
    pub fn config_source(&self) -> &str {
        &self.config_source
    }

    /// Gets a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gets the general settings.
    pub fn general(&self) -> &GeneralSettings {
        &self.settings.general
    }

    /// Gets the embedding settings.
    pub fn embedding(&self) -> &EmbeddingSettings {
        &self.settings.embedding
    }

    /// Gets the menu settings.
    pub fn menu(&self) -> &MenuSettings {
        &self.settings.menu
    }

    /// Gets the logging settings.
    pub fn logging(&self) -> &LoggingSettings {
        &self.settings.logging
    }

    /// Reads one INI file and layers its values over `base`.
    fn load_config(path: &Path, base: &Settings) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut ini = Ini::new();
        ini.read(content)
            .map_err(|e| ConfigError::IniParse(format!("Failed to parse INI: {}", e)))?;

        let mut settings = base.clone();
        let map = ini.get_map_ref();

        if let Some(section) = map.get("general") {
            Self::parse_general(section, &mut settings.general)?;
        }
        if let Some(section) = map.get("embedding") {
            Self::parse_embedding(section, &mut settings.embedding)?;
        }
        if let Some(section) = map.get("menu") {
            Self::parse_menu(section, &mut settings.menu)?;
        }
        if let Some(section) = map.get("logging") {
            Self::parse_logging(section, &mut settings.logging)?;
        }

        Ok(settings)
    }

    fn parse_general(section: &Section, general: &mut GeneralSettings) -> Result<(), ConfigError> {
        if let Some(Some(maxcore)) = section.get("maxcore") {
            general.maxcore = parse_positive("maxcore", maxcore)?;
        }
        if let Some(Some(nprocs)) = section.get("nprocs") {
            general.nprocs = parse_positive("nprocs", nprocs)?;
        }
        if let Some(Some(output_dir)) = section.get("output_dir") {
            if output_dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "output_dir must not be empty".to_string(),
                ));
            }
            general.output_dir = PathBuf::from(output_dir.trim());
        }
        Ok(())
    }

    fn parse_embedding(
        section: &Section,
        embedding: &mut EmbeddingSettings,
    ) -> Result<(), ConfigError> {
        if let Some(Some(command)) = section.get("command") {
            if command.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "embedding command must not be empty".to_string(),
                ));
            }
            embedding.command = command.trim().to_string();
        }
        if let Some(Some(speed)) = section.get("speed") {
            embedding.speed = speed.parse().map_err(ConfigError::InvalidValue)?;
        }
        Ok(())
    }

    fn parse_menu(section: &Section, menu: &mut MenuSettings) -> Result<(), ConfigError> {
        if let Some(Some(methods)) = section.get("methods") {
            menu.methods = parse_list("methods", methods)?;
        }
        if let Some(Some(basis_sets)) = section.get("basis_sets") {
            menu.basis_sets = parse_list("basis_sets", basis_sets)?;
        }
        Ok(())
    }

    fn parse_logging(section: &Section, logging: &mut LoggingSettings) -> Result<(), ConfigError> {
        if let Some(Some(level)) = section.get("level") {
            level.parse::<LevelFilter>().map_err(|_| {
                ConfigError::InvalidValue(format!("Invalid log level: {}", level))
            })?;
            logging.level = level.trim().to_lowercase();
        }
        Ok(())
    }

    /// Gets the system configuration file path.
    fn get_system_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            Some(PathBuf::from("/etc/orcaprep").join(CONFIG_FILE_NAME))
        }
        #[cfg(windows)]
        {
            std::env::var("PROGRAMDATA")
                .ok()
                .map(|pd| PathBuf::from(pd).join("orcaprep").join(CONFIG_FILE_NAME))
        }
    }

    /// Gets the user configuration file path.
    fn get_user_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("orcaprep")
                    .join(CONFIG_FILE_NAME)
            })
        }
        #[cfg(windows)]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|appdata| PathBuf::from(appdata).join("orcaprep").join(CONFIG_FILE_NAME))
        }
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(format!(
            "Invalid {}: {} (expected a positive integer)",
            key, value
        ))),
    }
}

fn parse_list(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let items: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ConfigError::InvalidValue(format!("{} must list at least one entry", key)));
    }
    Ok(items)
}

impl SettingsManager {
    /// Writes a commented `orcaprep_config.cfg` template holding the
    /// built-in defaults.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use orcaprep::settings::SettingsManager;
    /// use std::path::Path;
    ///
    /// SettingsManager::create_template(Path::new("orcaprep_config.cfg"))?;
    /// # Ok::<(), orcaprep::settings::ConfigError>(())
    /// ```
    pub fn create_template(path: &Path) -> Result<(), ConfigError> {
        fs::write(path, Self::generate_template_content())?;
        info!("Created settings template at: {}", path.display());
        Ok(())
    }

    fn generate_template_content() -> String {
        let general = GeneralSettings::default();
        let embedding = EmbeddingSettings::default();
        let menu = MenuSettings::default();
        let logging = LoggingSettings::default();

        format!(
            r#"# orcaprep Configuration File
#
# Files are loaded in hierarchical order, local settings taking precedence:
#
# 1. Current working directory (./{file})
# 2. User config directory (~/.config/orcaprep/{file})
# 3. System config directory (/etc/orcaprep/{file})
# 4. Built-in defaults
#
# Missing sections or keys keep the value from the next layer down.

[general]
# Memory per core in MB, written as %maxcore
maxcore = {maxcore}

# Parallel processes; a %pal block is written when this is above 1
nprocs = {nprocs}

# Directory generated input files are written to
output_dir = {output_dir}

[embedding]
# Open Babel executable used to build 3D structures
command = {command}

# 3D generation effort: fastest, fast, med, slow, best
speed = {speed}

[menu]
# Comma-separated choices offered by the method and basis set menus
methods = {methods}
basis_sets = {basis_sets}

[logging]
# Log level: off, error, warn, info, debug, trace
level = {level}
"#,
            file = CONFIG_FILE_NAME,
            maxcore = general.maxcore,
            nprocs = general.nprocs,
            output_dir = general.output_dir.display(),
            command = embedding.command,
            speed = embedding.speed,
            methods = menu.methods.join(","),
            basis_sets = menu.basis_sets.join(","),
            level = logging.level,
        )
    }
}
