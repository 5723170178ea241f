//! Configuration management for dk.
//!
//! Parses `dk.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `index.output`
//! - `tools.pdfinfo`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override warn-only mode for link validation.
    pub warn_only: Option<bool>,
    /// Override whether PDFs are part of the validation scan.
    pub include_pdfs: Option<bool>,
    /// Override whether linked PDFs are inspected with `pdfinfo`.
    pub check_pdfs: Option<bool>,
    /// Override the index output path.
    pub index_output: Option<PathBuf>,
    /// Override whether the index reads PDF metadata.
    pub pdf_metadata: Option<bool>,
    /// Override the `pdfinfo` binary.
    pub pdfinfo: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "dk.toml";

/// Directories skipped by default while walking a documentation tree.
const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".vscode",
    "venv",
    "env",
    "target",
];

/// Application configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Directory walk configuration.
    pub scan: ScanConfig,
    /// Link validation configuration.
    pub validate: ValidateConfig,
    /// Index generation configuration (output path is a raw string from TOML).
    index: IndexConfigRaw,
    /// External tool configuration.
    tools: ToolsConfigRaw,

    /// Resolved index configuration (set after loading).
    #[serde(skip)]
    pub index_resolved: IndexConfig,
    /// Resolved tool configuration (set after loading).
    #[serde(skip)]
    pub tools_resolved: ToolsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Directory walk configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names that are never descended into.
    pub exclude_dirs: Vec<String>,
    /// Glob patterns, relative to the documentation root, for paths to skip.
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDE_DIRS
                .iter()
                .map(|d| (*d).to_owned())
                .collect(),
            exclude: Vec::new(),
        }
    }
}

/// Link validation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Report broken links without failing the run.
    pub warn_only: bool,
    /// Include PDF files in the scan.
    pub include_pdfs: bool,
    /// Inspect linked PDFs with `pdfinfo`.
    pub check_pdfs: bool,
    /// Treat bare `name.md` / `name.pdf` tokens in prose as references.
    pub bare_paths: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            warn_only: false,
            include_pdfs: false,
            check_pdfs: false,
            bare_paths: true,
        }
    }
}

/// Raw index configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct IndexConfigRaw {
    output: Option<String>,
    pdf_metadata: Option<bool>,
}

/// Resolved index configuration.
#[derive(Debug, Default)]
pub struct IndexConfig {
    /// Index destination. `None` means `INDEX.md` under the documentation root.
    pub output: Option<PathBuf>,
    /// Read PDF titles and page counts with `pdfinfo`.
    pub pdf_metadata: bool,
}

/// Raw tool configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ToolsConfigRaw {
    pdfinfo: Option<String>,
}

/// Resolved external tool configuration.
#[derive(Debug)]
pub struct ToolsConfig {
    /// `pdfinfo` binary, either a bare name looked up on `PATH` or a path.
    pub pdfinfo: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdfinfo: PathBuf::from("pdfinfo"),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`tools.pdfinfo`").
        field: String,
        /// Error message (e.g., "${`POPPLER_HOME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `dk.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(warn_only) = settings.warn_only {
            self.validate.warn_only = warn_only;
        }
        if let Some(include_pdfs) = settings.include_pdfs {
            self.validate.include_pdfs = include_pdfs;
        }
        if let Some(check_pdfs) = settings.check_pdfs {
            self.validate.check_pdfs = check_pdfs;
        }
        if let Some(output) = &settings.index_output {
            self.index_resolved.output = Some(output.clone());
        }
        if let Some(pdf_metadata) = settings.pdf_metadata {
            self.index_resolved.pdf_metadata = pdf_metadata;
        }
        if let Some(pdfinfo) = &settings.pdfinfo {
            self.tools_resolved.pdfinfo.clone_from(pdfinfo);
        }
    }

    /// Compile `scan.exclude` into glob patterns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid pattern.
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.scan
            .exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| {
                    ConfigError::Validation(format!("scan.exclude pattern '{p}' is invalid: {e}"))
                })
            })
            .collect()
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI settings
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_scan()?;
        require_non_empty(&self.tools_resolved.pdfinfo.to_string_lossy(), "tools.pdfinfo")?;
        if let Some(output) = &self.index_resolved.output {
            require_non_empty(&output.to_string_lossy(), "index.output")?;
        }
        Ok(())
    }

    /// Validate scan configuration.
    fn validate_scan(&self) -> Result<(), ConfigError> {
        for dir in &self.scan.exclude_dirs {
            require_non_empty(dir, "scan.exclude_dirs")?;
            if dir.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "scan.exclude_dirs entry '{dir}' must be a directory name, not a path"
                )));
            }
        }
        self.exclude_patterns()?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref output) = self.index.output {
            self.index.output = Some(expand::expand_env(output, "index.output")?);
        }
        if let Some(ref pdfinfo) = self.tools.pdfinfo {
            self.tools.pdfinfo = Some(expand::expand_env(pdfinfo, "tools.pdfinfo")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    ///
    /// A bare tool name (no separator) is kept as-is so it is looked up on `PATH`.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.index_resolved = IndexConfig {
            output: self.index.output.as_deref().map(|o| config_dir.join(o)),
            pdf_metadata: self.index.pdf_metadata.unwrap_or(false),
        };

        self.tools_resolved = match self.tools.pdfinfo.as_deref() {
            Some(tool) if tool.contains(['/', '\\']) => ToolsConfig {
                pdfinfo: config_dir.join(tool),
            },
            Some(tool) => ToolsConfig {
                pdfinfo: PathBuf::from(tool),
            },
            None => ToolsConfig::default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.validate.warn_only);
        assert!(!config.validate.include_pdfs);
        assert!(!config.validate.check_pdfs);
        assert!(config.validate.bare_paths);
        assert!(config.index_resolved.output.is_none());
        assert!(!config.index_resolved.pdf_metadata);
        assert_eq!(config.tools_resolved.pdfinfo, PathBuf::from("pdfinfo"));
        assert!(config.scan.exclude_dirs.contains(&"node_modules".to_owned()));
        assert!(config.scan.exclude.is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.validate.bare_paths);
        assert_eq!(config.scan.exclude_dirs.len(), DEFAULT_EXCLUDE_DIRS.len());
    }

    #[test]
    fn test_parse_validate_config() {
        let toml = r"
[validate]
warn_only = true
include_pdfs = true
check_pdfs = true
bare_paths = false
";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate.warn_only);
        assert!(config.validate.include_pdfs);
        assert!(config.validate.check_pdfs);
        assert!(!config.validate.bare_paths);
    }

    #[test]
    fn test_parse_scan_config_replaces_defaults() {
        let toml = r#"
[scan]
exclude_dirs = ["build"]
exclude = ["drafts/**"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scan.exclude_dirs, vec!["build".to_owned()]);
        assert_eq!(config.scan.exclude, vec!["drafts/**".to_owned()]);
        assert_eq!(config.exclude_patterns().unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[index]
output = "site/INDEX.md"
pdf_metadata = true

[tools]
pdfinfo = "bin/pdfinfo"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.index_resolved.output,
            Some(PathBuf::from("/project/site/INDEX.md"))
        );
        assert!(config.index_resolved.pdf_metadata);
        assert_eq!(
            config.tools_resolved.pdfinfo,
            PathBuf::from("/project/bin/pdfinfo")
        );
    }

    #[test]
    fn test_bare_tool_name_stays_on_path() {
        let toml = r#"
[tools]
pdfinfo = "pdfinfo-22"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.tools_resolved.pdfinfo, PathBuf::from("pdfinfo-22"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[validate]\nwarn_only = true\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert!(config.validate.warn_only);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/dk.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[validate\nwarn_only = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_apply_cli_settings_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[validate]\nwarn_only = true\n\n[index]\noutput = \"INDEX.md\"\n",
        )
        .unwrap();

        let settings = CliSettings {
            warn_only: Some(false),
            index_output: Some(PathBuf::from("/elsewhere/INDEX.md")),
            pdfinfo: Some(PathBuf::from("/opt/poppler/pdfinfo")),
            ..Default::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert!(!config.validate.warn_only);
        assert_eq!(
            config.index_resolved.output,
            Some(PathBuf::from("/elsewhere/INDEX.md"))
        );
        assert_eq!(
            config.tools_resolved.pdfinfo,
            PathBuf::from("/opt/poppler/pdfinfo")
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());

        assert!(!config.validate.warn_only);
        assert!(config.index_resolved.output.is_none());
        assert_eq!(config.tools_resolved.pdfinfo, PathBuf::from("pdfinfo"));
    }

    #[test]
    fn test_apply_cli_settings_flags() {
        let mut config = Config::default();
        let settings = CliSettings {
            include_pdfs: Some(true),
            check_pdfs: Some(true),
            pdf_metadata: Some(true),
            ..Default::default()
        };

        config.apply_cli_settings(&settings);

        assert!(config.validate.include_pdfs);
        assert!(config.validate.check_pdfs);
        assert!(config.index_resolved.pdf_metadata);
    }

    #[test]
    fn test_expand_env_vars_tools() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DK_CONFIG_TEST_POPPLER", "/usr/local/poppler");
        }

        let toml = r#"
[tools]
pdfinfo = "${DK_CONFIG_TEST_POPPLER}/bin/pdfinfo"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.tools_resolved.pdfinfo,
            PathBuf::from("/usr/local/poppler/bin/pdfinfo")
        );

        unsafe {
            std::env::remove_var("DK_CONFIG_TEST_POPPLER");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DK_CONFIG_TEST_MISSING");
        }

        let toml = r#"
[index]
output = "${DK_CONFIG_TEST_MISSING}/INDEX.md"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("index.output"));
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_glob() {
        let mut config = Config::default();
        config.scan.exclude = vec!["drafts/[".to_owned()];
        assert_validation_error(&config, &["scan.exclude", "drafts/["]);
    }

    #[test]
    fn test_validate_exclude_dir_with_separator() {
        let mut config = Config::default();
        config.scan.exclude_dirs = vec!["docs/drafts".to_owned()];
        assert_validation_error(&config, &["scan.exclude_dirs", "docs/drafts"]);
    }

    #[test]
    fn test_validate_empty_pdfinfo() {
        let mut config = Config::default();
        config.tools_resolved.pdfinfo = PathBuf::new();
        assert_validation_error(&config, &["tools.pdfinfo", "empty"]);
    }
}
