//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level file names, checked in order
const PROJECT_FILES: &[&str] = &["chatloop.toml", ".chatloop.toml"];

/// Prefix of environment overrides (`CHATLOOP_JAN__URL` sets `jan.url`)
const ENV_PREFIX: &str = "CHATLOOP_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `CHATLOOP_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./chatloop.toml` or `./.chatloop.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/chatloop/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Self::base();

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        Self::with_env(figment).extract().map_err(Box::new)
    }

    /// Load a single file on top of the defaults, ignoring other sources.
    pub fn load_file(path: &Path) -> Result<FileConfig, Box<figment::Error>> {
        Self::base()
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(FileConfig::default()))
    }

    fn with_env(figment: Figment) -> Figment {
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/chatloop/config.toml if set,
    /// otherwise falls back to ~/.config/chatloop/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("chatloop").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config sources in priority order (for --show-config)
    pub fn describe_sources(explicit: Option<&PathBuf>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];
        lines.push(format!("  [ENV  ] {}* variables", ENV_PREFIX));

        if let Some(path) = explicit {
            let marker = if path.exists() { "FOUND" } else { "MISS " };
            lines.push(format!("  [{}] Explicit: {}", marker, path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./chatloop.toml or ./.chatloop.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let marker = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{}] Global:  {}", marker, path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.jan.model, "llama3-8b-instruct");
        assert_eq!(config.agent.max_iterations, 5);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("chatloop"));
    }

    #[test]
    fn test_load_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatloop.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[jan]\nmodel = \"qwen2.5-7b\"\n\n[queue]\ntries = 1").unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(config.jan.model, "qwen2.5-7b");
        assert_eq!(config.jan.timeout_secs, 300);
        assert_eq!(config.queue.tries, 1);
        // Default server survives a file that does not mention servers
        assert!(config.servers.contains_key("compressor_ai"));
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CHATLOOP_JAN__MODEL", "mistral-7b");
            jail.set_env("CHATLOOP_AGENT__MAX_ITERATIONS", "2");

            let config: FileConfig = ConfigLoader::with_env(ConfigLoader::base()).extract()?;
            assert_eq!(config.jan.model, "mistral-7b");
            assert_eq!(config.agent.max_iterations, 2);
            Ok(())
        });
    }

    #[test]
    fn test_describe_sources_lists_env_first() {
        let lines = ConfigLoader::describe_sources(None);
        assert!(lines[1].contains("CHATLOOP_"));
        assert!(lines.last().unwrap().contains("Default"));
    }
}
