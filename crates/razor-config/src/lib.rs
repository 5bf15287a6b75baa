use razor_syntax::ParserOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Used when a config file lists no patterns.
pub const DEFAULT_PATTERN: &str = "**/*.cshtml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Templates directory not found: {0}")]
    TemplatesDirNotFound(PathBuf),

    #[error("Invalid template pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to read {}: {}", .0.path().display(), .0.error())]
    Discovery(#[from] glob::GlobError),
}

/// Parser switches as stored in the `[parser]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub design_time: bool,
    pub max_nesting_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        let options = ParserOptions::default();
        Self {
            design_time: options.design_time,
            max_nesting_depth: options.max_nesting_depth,
        }
    }
}

impl From<&ParserSettings> for ParserOptions {
    fn from(settings: &ParserSettings) -> Self {
        ParserOptions {
            design_time: settings.design_time,
            max_nesting_depth: settings.max_nesting_depth,
        }
    }
}

fn default_patterns() -> Vec<String> {
    vec![DEFAULT_PATTERN.to_string()]
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub templates_path: PathBuf,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub parser: ParserSettings,
}

impl Config {
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
            patterns: default_patterns(),
            parser: ParserSettings::default(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the templates path
        config.templates_path =
            Self::expand_path(&config.templates_path).unwrap_or(config.templates_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/razor-syntax");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions::from(&self.parser)
    }

    /// Templates under `templates_path` matching any configured pattern.
    pub fn discover_templates(&self) -> Result<Vec<PathBuf>, ConfigError> {
        discover_templates(&self.templates_path, &self.patterns)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Sorted, de-duplicated files under `root` matching `patterns`.
///
/// An empty pattern list means [`DEFAULT_PATTERN`].
pub fn discover_templates(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ConfigError> {
    if !root.is_dir() {
        return Err(ConfigError::TemplatesDirNotFound(root.to_path_buf()));
    }

    let defaults = default_patterns();
    let patterns = if patterns.is_empty() { &defaults } else { patterns };

    let mut files = Vec::new();
    for pattern in patterns {
        let full = root.join(pattern);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in entries {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "<p>@Model</p>").unwrap();
    }

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/razor-syntax/config.toml"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(r#"templates_path = "/srv/views""#).unwrap();

        assert_eq!(config.patterns, vec![DEFAULT_PATTERN.to_string()]);
        assert_eq!(config.parser, ParserSettings::default());
        assert_eq!(config.parser_options(), ParserOptions::default());
    }

    #[test]
    fn test_parser_table_overrides_options() {
        let config: Config = toml::from_str(
            r#"
templates_path = "/srv/views"
patterns = ["**/*.cshtml", "**/*.razor"]

[parser]
design_time = true
"#,
        )
        .unwrap();

        let options = config.parser_options();
        assert!(options.design_time);
        assert_eq!(options.max_nesting_depth, 64);
        assert_eq!(config.patterns.len(), 2);
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("RAZOR_TEST_VIEWS", "/test/env/views");
        }

        let path = PathBuf::from("$RAZOR_TEST_VIEWS/shared");
        let expanded = Config::expand_path(&path).unwrap();
        assert_eq!(expanded, PathBuf::from("/test/env/views/shared"));

        unsafe {
            env::remove_var("RAZOR_TEST_VIEWS");
        }
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(Path::new("~/views")).unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().ends_with("views"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_toml_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "templates_path = [").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let mut config = Config::new("/tmp/views");
        config.parser.max_nesting_depth = 16;

        config.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded.templates_path, config.templates_path);
        assert_eq!(loaded.patterns, config.patterns);
        assert_eq!(loaded.parser, config.parser);
    }

    #[test]
    fn test_discover_templates_recursively() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "Index.cshtml");
        touch(temp_dir.path(), "Shared/_Layout.cshtml");
        touch(temp_dir.path(), "Shared/site.css");

        let config = Config::new(temp_dir.path());
        let files = config.discover_templates().unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Index.cshtml"),
                PathBuf::from("Shared/_Layout.cshtml"),
            ]
        );
    }

    #[test]
    fn test_overlapping_patterns_are_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.cshtml");

        let patterns = vec!["*.cshtml".to_string(), "**/*.cshtml".to_string()];
        let files = discover_templates(temp_dir.path(), &patterns).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let patterns = vec!["[".to_string()];

        let err = discover_templates(temp_dir.path(), &patterns).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_missing_templates_dir() {
        let err = discover_templates(Path::new("/this/path/does/not/exist"), &[]).unwrap_err();
        assert!(err.to_string().contains("Templates directory not found"));
    }
}
