//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$CALC_CONFIG` environment variable
//! 2. `config.toml` in the platform config dir (e.g. `~/.config/calc/`)
//! 3. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub graph: GraphConfig,
    pub mcp: McpConfig,
}

/// How results are printed.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Digits after the decimal point for probabilities and matrices.
    pub precision: usize,
    /// Print JSON instead of text, as if `--json` were always passed.
    pub json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph file (TOML or JSON) used when `--graph` is not given.
    /// Default: the built-in demo graph.
    pub path: Option<String>,
}

/// MCP server settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Custom system instructions appended to MCP server info.
    pub instructions: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            json: false,
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CALC_CONFIG") {
        return Some(PathBuf::from(p));
    }
    directories::ProjectDirs::from("dev", "calc", "calc")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Show the active config path (for `calc config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.precision, 4);
        assert!(!config.output.json);
        assert!(config.graph.path.is_none());
        assert!(config.mcp.instructions.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[output]
precision = 2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.precision, 2);
        // Other fields should be defaults
        assert!(!config.output.json);
        assert!(config.graph.path.is_none());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[output]
precision = 6
json = true

[graph]
path = "/tmp/roads.toml"

[mcp]
instructions = "Prefer exact answers"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.precision, 6);
        assert!(config.output.json);
        assert_eq!(config.graph.path.as_deref(), Some("/tmp/roads.toml"));
        assert!(config.mcp.instructions.is_some());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\njson = true").unwrap();
        let config = load_config_from(file.path()).unwrap();
        assert!(config.output.json);
        assert_eq!(config.output.precision, 4);
    }

    #[test]
    fn test_load_config_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output\nprecision = ").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("parsing "));
    }
}
