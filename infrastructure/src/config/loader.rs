//! Configuration loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mmagent";
const PROJECT_FILES: [&str; 2] = ["mmagent.toml", ".mmagent.toml"];
const ENV_PREFIX: &str = "MMAGENT_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources
    ///
    /// Priority (highest to lowest):
    /// 1. `MMAGENT_*` environment variables
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./mmagent.toml` or `./.mmagent.toml`
    /// 4. Global: `<config dir>/mmagent/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Self::base();

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().map_err(Box::new)
    }

    /// Load one file over the defaults, ignoring global, project and env sources.
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

    /// Global config file path (may not exist)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     {}*", ENV_PREFIX);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./mmagent.toml or ./.mmagent.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmagent_domain::Provider;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.agent.provider, Provider::DashScope);
        assert_eq!(config.poller.max_attempts, 60);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("mmagent"));
    }

    #[test]
    fn test_file_overrides_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[poller]
interval_ms = 250

[providers.zhipu.text_to_speech]
model = "glm-tts"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_file(file.path()).unwrap();
        assert_eq!(config.poller.interval_ms, 250);
        assert_eq!(config.poller.max_attempts, 60);
        assert_eq!(
            config.providers.zhipu.text_to_speech.model.as_deref(),
            Some("glm-tts")
        );
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[poller]\ninterval_ms = \"soon\"").unwrap();
        assert!(ConfigLoader::load_file(file.path()).is_err());
    }
}
