use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "mulenet.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Operational limits for one analysis run.
///
/// The detection thresholds themselves are fixed and deliberately absent here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// DFS expansions allowed for exhaustive cycle enumeration before the
    /// bounded root-closure search takes over.
    #[serde(default = "default_cycle_search_budget")]
    pub cycle_search_budget: usize,
    /// DFS expansions allowed for the shell-chain search.
    #[serde(default = "default_shell_search_budget")]
    pub shell_search_budget: usize,
    /// Largest accepted input file, in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cycle_search_budget: default_cycle_search_budget(),
            shell_search_budget: default_shell_search_budget(),
            max_input_bytes: default_max_input_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `pretty`, `text` or `json`. Unset means "decide from the terminal".
    #[serde(default)]
    pub format: Option<String>,
}

/// Load the project configuration.
///
/// An explicit path must exist. Without one, `mulenet.toml` in
/// `project_root` is used when present and defaults otherwise.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`ProjectConfig`].
pub fn load_project_config(project_root: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = project_root.join(CONFIG_FILE_NAME);
            if !path.exists() {
                return Ok(ProjectConfig::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_cycle_search_budget() -> usize {
    2_000_000
}

const fn default_shell_search_budget() -> usize {
    5_000_000
}

const fn default_max_input_bytes() -> u64 {
    50 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_project_config(root.path(), None).expect("load should succeed");
        assert_eq!(cfg, ProjectConfig::default());
        assert_eq!(cfg.analysis.cycle_search_budget, 2_000_000);
        assert_eq!(cfg.analysis.shell_search_budget, 5_000_000);
        assert_eq!(cfg.analysis.max_input_bytes, 52_428_800);
        assert!(cfg.output.format.is_none());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "[analysis]\ncycle_search_budget = 10\n\n[output]\nformat = \"json\"\n",
        )
        .expect("write config");

        let cfg = load_project_config(root.path(), None).expect("load should succeed");
        assert_eq!(cfg.analysis.cycle_search_budget, 10);
        assert_eq!(cfg.analysis.shell_search_budget, 5_000_000);
        assert_eq!(cfg.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn explicit_path_wins_over_project_root() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "[analysis]\nshell_search_budget = 1\n",
        )
        .expect("write config");
        let other = root.path().join("other.toml");
        std::fs::write(&other, "[analysis]\nshell_search_budget = 2\n").expect("write other");

        let cfg = load_project_config(root.path(), Some(&other)).expect("load should succeed");
        assert_eq!(cfg.analysis.shell_search_budget, 2);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let missing = root.path().join("nope.toml");
        assert!(load_project_config(root.path(), Some(&missing)).is_err());
    }

    #[test]
    fn invalid_toml_reports_path() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "[analysis\n").expect("write config");

        let err = load_project_config(root.path(), None).expect_err("parse must fail");
        assert!(err.to_string().contains("Failed to parse"));
    }
}
