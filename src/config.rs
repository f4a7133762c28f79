use std::fs;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_TOP_N;
use crate::analysis::AnalysisOptions;
use crate::archetype::{ArchetypeTable, ArchetypeTableConfig};
use crate::batch::DEFAULT_MAX_BATCH_SIZE;
use crate::catalog::{DEFAULT_API_BASE_URL, HttpSettings};
use crate::domain::MAX_RANKED;
use crate::error::ProfilerError;

pub const CONFIG_FILE_NAME: &str = "listening-profiler.json";
pub const TOKEN_ENV: &str = "LISTENING_PROFILER_TOKEN";

const MAX_PAGE_SIZE: u32 = 50;
const MAX_BATCH_SIZE: usize = 50;
const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub max_batch_size: Option<usize>,
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub top_tracks_page_size: Option<u32>,
    #[serde(default)]
    pub saved_tracks_page_size: Option<u32>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    #[serde(default)]
    pub archetypes: Option<ArchetypeTableConfig>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub analysis: AnalysisOptions,
    pub http: HttpSettings,
    pub deadline: Option<Duration>,
    pub archetypes: ArchetypeTable,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisOptions::default(),
            http: HttpSettings::default(),
            deadline: None,
            archetypes: ArchetypeTable::builtin(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Without one, the working directory is
    /// checked, then `<user config dir>/listening-profiler/`, then built-in
    /// defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ProfilerError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(ResolvedConfig::default()),
            },
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ProfilerError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ProfilerError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    fn default_path() -> Option<Utf8PathBuf> {
        let local = Utf8PathBuf::from(CONFIG_FILE_NAME);
        if local.as_std_path().exists() {
            return Some(local);
        }
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.config_dir()
                        .join("listening-profiler")
                        .join(CONFIG_FILE_NAME),
                )
                .ok()
            })
            .filter(|path| path.as_std_path().exists())
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ProfilerError> {
        let max_batch_size = bounded(
            "max_batch_size",
            config.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE),
            1,
            MAX_BATCH_SIZE,
        )?;
        let top_n = bounded("top_n", config.top_n.unwrap_or(DEFAULT_TOP_N), 1, MAX_RANKED)?;
        let top_tracks_page_size = bounded(
            "top_tracks_page_size",
            config.top_tracks_page_size.unwrap_or(20),
            1,
            MAX_PAGE_SIZE,
        )?;
        let saved_tracks_page_size = bounded(
            "saved_tracks_page_size",
            config.saved_tracks_page_size.unwrap_or(5),
            1,
            MAX_PAGE_SIZE,
        )?;

        let deadline = config
            .deadline_secs
            .map(|secs| bounded("deadline_secs", secs, 1, MAX_DEADLINE_SECS))
            .transpose()?
            .map(Duration::from_secs);

        let base_url = config
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ProfilerError::InvalidConfig(format!(
                "api_base_url must be an http(s) URL: {base_url}"
            )));
        }

        let archetypes = match config.archetypes {
            Some(table) => ArchetypeTable::from_config(table)?,
            None => ArchetypeTable::builtin(),
        };

        Ok(ResolvedConfig {
            analysis: AnalysisOptions {
                max_batch_size,
                top_n,
                top_tracks_page_size,
                saved_tracks_page_size,
            },
            http: HttpSettings {
                base_url,
                timeout: Duration::from_secs(config.timeout_secs.unwrap_or(30)),
                max_retries: config.max_retries.unwrap_or(3),
            },
            deadline,
            archetypes,
        })
    }
}

fn bounded<T>(name: &str, value: T, min: T, max: T) -> Result<T, ProfilerError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ProfilerError::InvalidConfig(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}

/// Token from the command line, else from the environment.
pub fn resolve_token(flag: Option<String>) -> Result<String, ProfilerError> {
    flag.or_else(|| std::env::var(TOKEN_ENV).ok())
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(ProfilerError::MissingToken)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.analysis.max_batch_size, 20);
        assert_eq!(resolved.analysis.top_n, 5);
        assert_eq!(resolved.analysis.top_tracks_page_size, 20);
        assert_eq!(resolved.analysis.saved_tracks_page_size, 5);
        assert_eq!(resolved.http.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(resolved.archetypes, ArchetypeTable::builtin());
        assert!(resolved.deadline.is_none());
    }

    #[test]
    fn top_n_above_five_rejected() {
        let config = Config {
            top_n: Some(6),
            ..Config::default()
        };
        assert_matches!(
            ConfigLoader::resolve_config(config),
            Err(ProfilerError::InvalidConfig(_))
        );
    }

    #[test]
    fn deadline_out_of_range_rejected() {
        for secs in [0, u64::MAX] {
            let config = Config {
                deadline_secs: Some(secs),
                ..Config::default()
            };
            assert_matches!(
                ConfigLoader::resolve_config(config),
                Err(ProfilerError::InvalidConfig(_))
            );
        }
    }

    #[test]
    fn deadline_in_range_resolves() {
        let config = Config {
            deadline_secs: Some(90),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.deadline, Some(Duration::from_secs(90)));
    }

    #[test]
    fn zero_batch_rejected() {
        let config = Config {
            max_batch_size: Some(0),
            ..Config::default()
        };
        assert_matches!(
            ConfigLoader::resolve_config(config),
            Err(ProfilerError::InvalidConfig(_))
        );
    }
}
