/// External configuration loader.
///
/// Reads `chainjump.toml` from an explicit path, or else from the first
/// candidate directory that has one (exe dir, CWD, `~/.local/share/chainjump`).
/// Missing files, missing keys and bad values fall back to defaults; what
/// was ignored is returned as warnings so the caller can log it once logging
/// is up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::grid::{Dimensions, LevelProfile, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::domain::reach::ReachConfig;
use crate::domain::symbol::ZeroMeaning;
use crate::generate::GeneratorSettings;

pub const FILE_NAME: &str = "chainjump.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub profile: LevelProfile,
    pub generator: GeneratorSettings,
    pub reach: ReachConfig,
    pub presets_dir: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        resolve(TomlConfig::default(), &[], &mut Vec::new())
    }
}

/// Result of a load: the config plus where it came from and what was ignored.
#[derive(Clone, Debug)]
pub struct Loaded {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    generator: TomlGenerator,
    #[serde(default)]
    reach: TomlReach,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
    #[serde(default = "default_zero")]
    zero: ZeroMeaning,
}

#[derive(Deserialize, Debug)]
struct TomlGenerator {
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_api_version")]
    api_version: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlReach {
    #[serde(default = "default_jump_height")]
    jump_height: usize,
    #[serde(default = "default_jump_reach")]
    jump_reach: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_presets_dir")]
    presets_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_width() -> usize { DEFAULT_WIDTH }
fn default_height() -> usize { DEFAULT_HEIGHT }
fn default_zero() -> ZeroMeaning { ZeroMeaning::Blank }

fn default_endpoint() -> String { GeneratorSettings::default().endpoint }
fn default_model() -> String { GeneratorSettings::default().model }
fn default_api_key_env() -> String { GeneratorSettings::default().api_key_env }
fn default_api_version() -> String { GeneratorSettings::default().api_version }
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f32 { 0.7 }
fn default_timeout_secs() -> u64 { 60 }

fn default_jump_height() -> usize { ReachConfig::default().jump_height }
fn default_jump_reach() -> usize { ReachConfig::default().jump_reach }

fn default_presets_dir() -> String { "data".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { width: default_width(), height: default_height(), zero: default_zero() }
    }
}

impl Default for TomlGenerator {
    fn default() -> Self {
        TomlGenerator {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TomlReach {
    fn default() -> Self {
        TomlReach { jump_height: default_jump_height(), jump_reach: default_jump_reach() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { presets_dir: default_presets_dir(), log_level: default_log_level() }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load from `explicit` if given, otherwise search the candidate dirs.
    pub fn load(explicit: Option<&Path>) -> Loaded {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();

        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => search_dirs.iter().map(|d| d.join(FILE_NAME)).find(|p| p.exists()),
        };

        let toml_cfg = match &path {
            Some(p) => read_toml(p, &mut warnings),
            None => TomlConfig::default(),
        };

        Loaded { config: resolve(toml_cfg, &search_dirs, &mut warnings), path, warnings }
    }

    /// Parse config text directly. Bad values fall back per key.
    pub fn from_toml_str(text: &str) -> Result<(AppConfig, Vec<String>), toml::de::Error> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let mut warnings = Vec::new();
        let config = resolve(toml_cfg, &[], &mut warnings);
        Ok((config, warnings))
    }
}

fn read_toml(path: &Path, warnings: &mut Vec<String>) -> TomlConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                warnings.push(format!("{} parse error, using default settings: {e}", path.display()));
                TomlConfig::default()
            }
        },
        Err(e) => {
            warnings.push(format!("could not read {}: {e}", path.display()));
            TomlConfig::default()
        }
    }
}

fn resolve(cfg: TomlConfig, search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> AppConfig {
    let dims = match Dimensions::new(cfg.grid.width, cfg.grid.height) {
        Ok(d) => d,
        Err(e) => {
            warnings.push(format!("[grid] {e}, using {DEFAULT_WIDTH}x{DEFAULT_HEIGHT}"));
            Dimensions::default()
        }
    };

    let mut temperature = cfg.generator.temperature;
    if !(0.0..=1.0).contains(&temperature) {
        warnings.push(format!("[generator] temperature {temperature} is outside 0..=1, using 0.7"));
        temperature = default_temperature();
    }
    let mut timeout_secs = cfg.generator.timeout_secs;
    if timeout_secs == 0 {
        warnings.push("[generator] timeout_secs must be positive, using 60".to_string());
        timeout_secs = default_timeout_secs();
    }

    // Resolve presets directory
    let presets_dir = if Path::new(&cfg.general.presets_dir).is_absolute() {
        PathBuf::from(&cfg.general.presets_dir)
    } else {
        search_dirs
            .iter()
            .map(|d| d.join(&cfg.general.presets_dir))
            .find(|p| p.is_dir())
            .unwrap_or_else(|| PathBuf::from(&cfg.general.presets_dir))
    };

    AppConfig {
        profile: LevelProfile::new(dims, cfg.grid.zero),
        generator: GeneratorSettings {
            endpoint: cfg.generator.endpoint,
            model: cfg.generator.model,
            api_key_env: cfg.generator.api_key_env,
            api_version: cfg.generator.api_version,
            max_tokens: cfg.generator.max_tokens,
            temperature,
            timeout: Duration::from_secs(timeout_secs),
        },
        reach: ReachConfig { jump_height: cfg.reach.jump_height, jump_reach: cfg.reach.jump_reach },
        presets_dir,
        log_level: cfg.general.log_level,
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/chainjump");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_ledger_defaults() {
        let (cfg, warnings) = AppConfig::from_toml_str("").unwrap();
        assert!(warnings.is_empty());
        assert_eq!(cfg.profile, LevelProfile::LEDGER);
        assert_eq!(cfg.generator, GeneratorSettings::default());
        assert_eq!(cfg.reach, ReachConfig::default());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn arcade_profile_from_toml() {
        let text = r#"
            [grid]
            width = 12
            height = 7
            zero = "block"

            [generator]
            timeout_secs = 15

            [reach]
            jump_reach = 5
        "#;
        let (cfg, warnings) = AppConfig::from_toml_str(text).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(cfg.profile, LevelProfile::ARCADE);
        assert_eq!(cfg.generator.timeout, Duration::from_secs(15));
        assert_eq!(cfg.generator.max_tokens, 1000);
        assert_eq!(cfg.reach, ReachConfig { jump_height: 3, jump_reach: 5 });
    }

    #[test]
    fn bad_values_fall_back_with_warnings() {
        let text = r#"
            [grid]
            width = 2

            [generator]
            temperature = 3.5
            timeout_secs = 0
        "#;
        let (cfg, warnings) = AppConfig::from_toml_str(text).unwrap();
        assert_eq!(warnings.len(), 3);
        assert_eq!(cfg.profile.dims, Dimensions::LEDGER);
        assert_eq!(cfg.generator.temperature, 0.7);
        assert_eq!(cfg.generator.timeout, Duration::from_secs(60));
    }

    #[test]
    fn unknown_zero_meaning_is_a_parse_error() {
        assert!(AppConfig::from_toml_str("[grid]\nzero = \"solid\"").is_err());
    }

    #[test]
    fn unreadable_explicit_path_falls_back() {
        let loaded = AppConfig::load(Some(Path::new("/nonexistent/chainjump.toml")));
        assert_eq!(loaded.config.profile, LevelProfile::LEDGER);
        assert_eq!(loaded.warnings.len(), 1);
    }
}
