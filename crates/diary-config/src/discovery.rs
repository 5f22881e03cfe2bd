//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `<user config dir>/config.toml` (`DIARY_CONFIG_DIR` or the platform
//!    config dir joined with `diary`)
//! 2. `./diary.toml` (project-local)
//! 3. CLI arguments and environment (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, DiaryConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "diary.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for platform directory resolution.
const APP_NAME: &str = "diary";

/// Environment variable to override the user config directory.
const CONFIG_DIR_ENV: &str = "DIARY_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: DiaryConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., plaintext API keys).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
///
/// `project_dir` defaults to the current directory.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `DIARY_CONFIG_DIR` and the platform default.
/// Fails only if the merged result does not pass
/// [`DiaryConfig::validate`]; unreadable layers become warnings.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let loaded = discover(project_dir, config_dir);
    loaded.config.validate()?;
    Ok(loaded)
}

/// Load configuration without rejecting unusable values.
///
/// A validation failure is reported as a warning instead, so the files can
/// still be located and inspected.
pub fn load_config_lenient(project_dir: Option<&Path>, config_dir: Option<&Path>) -> LoadedConfig {
    let mut loaded = discover(project_dir, config_dir);
    if let Err(e) = loaded.config.validate() {
        loaded.warnings.push(e.to_string());
    }
    loaded
}

fn discover(project_dir: Option<&Path>, config_dir: Option<&Path>) -> LoadedConfig {
    let mut config = DiaryConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_config_path(project_dir);
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    check_plaintext_keys(&config, &mut warnings);

    LoadedConfig {
        config,
        sources,
        warnings,
    }
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DiaryConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DiaryConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &DiaryConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Path of the user-level config file.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory.
///
/// Checks `DIARY_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/diary` on Linux, `~/Library/Application Support/diary` on
/// macOS).
pub fn user_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Path of the project-local config file in `project_dir` (or the current
/// directory).
pub fn project_config_path(project_dir: Option<&Path>) -> PathBuf {
    project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(config: &mut DiaryConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

/// Warn when the API key sits in a config file.
fn check_plaintext_keys(config: &DiaryConfig, warnings: &mut Vec<String>) {
    if let Some(ref backend) = config.backend
        && backend.has_plaintext_api_key()
    {
        warnings.push(
            "[backend] contains a plaintext API key. \
             Consider setting DIARY_API_KEY instead."
                .to_string(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load_isolated(project: &TempDir, user: &TempDir) -> LoadedConfig {
        load_config_with_options(Some(project.path()), Some(user.path())).unwrap()
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[backend]
url = "http://localhost:9000"
timeout_secs = 5
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.backend_url(), Some("http://localhost:9000"));
        assert_eq!(config.timeout().as_secs(), 5);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let loaded = load_isolated(&project, &user);
        assert_eq!(loaded.config, DiaryConfig::new());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_load_config_layered_merge() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[backend]
url = "http://user-level"

[user]
id = "user-1"

[roster]
comment_sample_size = 5
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("diary.toml"),
            r#"
[backend]
url = "http://project-level"
"#,
        )
        .unwrap();

        let loaded = load_isolated(&project, &user);
        let config = &loaded.config;

        // Project-local overrides user-level
        assert_eq!(config.backend_url(), Some("http://project-level"));
        // Sections the project didn't set are preserved
        assert_eq!(config.user_id(), Some("user-1"));
        assert_eq!(config.roster().comment_sample_size, 5);
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_plaintext_key_warning() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join("diary.toml"),
            r#"
[backend]
url = "http://localhost:8080"
api_key = "anon-key"
"#,
        )
        .unwrap();

        let loaded = load_isolated(&project, &user);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("plaintext"));
    }

    #[test]
    fn test_malformed_config_warns_but_continues() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "[user]\nid = \"u1\"\n").unwrap();
        fs::write(project.path().join("diary.toml"), "not valid toml {{{{").unwrap();

        let loaded = load_isolated(&project, &user);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert_eq!(loaded.config.user_id(), Some("u1"));
        assert_eq!(loaded.loaded_from().len(), 1);
    }

    #[test]
    fn test_invalid_values_fail_load() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join("diary.toml"),
            "[roster]\nstale_after_secs = 400\n",
        )
        .unwrap();

        let err = load_config_with_options(Some(project.path()), Some(user.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_lenient_load_reports_invalid_values() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join("diary.toml"),
            "[roster]\nstale_after_secs = 400\n",
        )
        .unwrap();

        let loaded = load_config_lenient(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.loaded_from(), vec![project.path().join("diary.toml").as_path()]);
        assert_eq!(loaded.config.roster().stale_after_secs, 400);
        assert!(
            loaded
                .warnings
                .iter()
                .any(|w| w.contains("roster.stale_after_secs"))
        );
    }

    #[test]
    fn test_save_config_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.toml");

        save_config(&DiaryConfig::template(), &path).unwrap();
        let reloaded = load_config_file(&path).unwrap();
        assert_eq!(reloaded, DiaryConfig::template());
    }

    #[test]
    fn test_project_config_path_default() {
        assert_eq!(project_config_path(None), PathBuf::from("diary.toml"));
    }
}
