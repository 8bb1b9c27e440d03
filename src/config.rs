use std::{
    env,
    net::SocketAddr,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

use crate::catalog::SqliteCatalogOptions;
use crate::embedding::EmbeddingModel;
use crate::scenario::{
    Activity, ArchetypeKey, Mood, ResolverSettings, SocialContext, TimeOfDay,
    resolver::DEFAULT_TOP_K,
};

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

const DEFAULT_HTTP_BIND: &str = "0.0.0.0:9010";
const DEFAULT_ARCHETYPE: &str = "relaxed,relaxing,evening,alone";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    catalog_db_path: PathBuf,
    catalog_row_limit: Option<u32>,
    catalog_db_max_connections: u32,
    catalog_db_acquire_timeout: Duration,
    catalog_create_indices: bool,
    embedding_model: EmbeddingModel,
    similar_archetype_count: NonZeroUsize,
    default_archetype: ArchetypeKey,
    archetype_silent_social: Option<SocialContext>,
    recommend_default_top_n: usize,
    recommend_max_top_n: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から推薦サービスの設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `CATALOG_DB_PATH` が未設定、もしくは各種値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog_db_path = PathBuf::from(env_var("CATALOG_DB_PATH")?);
        let http_bind = parse_socket_addr("SCENARIO_HTTP_BIND", DEFAULT_HTTP_BIND)?;

        // Catalog database settings
        let catalog_row_limit = parse_optional_non_zero_u32("CATALOG_ROW_LIMIT")?;
        let catalog_db_max_connections = parse_u32("CATALOG_DB_MAX_CONNECTIONS", 4)?;
        let catalog_db_acquire_timeout =
            parse_duration_secs("CATALOG_DB_ACQUIRE_TIMEOUT_SECS", 30)?;
        let catalog_create_indices = parse_bool("CATALOG_CREATE_INDICES", true)?;

        // Scenario resolution settings
        let embedding_model = parse_from_str("EMBEDDING_MODEL", EmbeddingModel::default().as_str())?;
        let similar_archetype_count =
            parse_non_zero_usize("SIMILAR_ARCHETYPE_COUNT", DEFAULT_TOP_K)?;
        let default_archetype = parse_archetype("DEFAULT_ARCHETYPE", DEFAULT_ARCHETYPE)?;
        let archetype_silent_social = match env::var("ARCHETYPE_SILENT_SOCIAL") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.parse::<SocialContext>().map_err(
                |error| ConfigError::Invalid {
                    name: "ARCHETYPE_SILENT_SOCIAL",
                    source: anyhow::Error::new(error),
                },
            )?),
            _ => None,
        };

        // Response sizing
        let recommend_default_top_n = parse_usize("RECOMMEND_DEFAULT_TOP_N", 10)?;
        let recommend_max_top_n = parse_non_zero_usize("RECOMMEND_MAX_TOP_N", 100)?.get();
        if recommend_default_top_n > recommend_max_top_n {
            return Err(ConfigError::Invalid {
                name: "RECOMMEND_DEFAULT_TOP_N",
                source: anyhow::anyhow!(
                    "default {recommend_default_top_n} exceeds RECOMMEND_MAX_TOP_N {recommend_max_top_n}"
                ),
            });
        }

        Ok(Self {
            http_bind,
            catalog_db_path,
            catalog_row_limit,
            catalog_db_max_connections,
            catalog_db_acquire_timeout,
            catalog_create_indices,
            embedding_model,
            similar_archetype_count,
            default_archetype,
            archetype_silent_social,
            recommend_default_top_n,
            recommend_max_top_n,
        })
    }

    /// 既定値のみで構成した設定。テストやスクリプトから使う。
    #[must_use]
    pub fn with_catalog_path(catalog_db_path: impl Into<PathBuf>) -> Self {
        let settings = ResolverSettings::default();
        Self {
            http_bind: SocketAddr::from(([0, 0, 0, 0], 9010)),
            catalog_db_path: catalog_db_path.into(),
            catalog_row_limit: None,
            catalog_db_max_connections: 4,
            catalog_db_acquire_timeout: Duration::from_secs(30),
            catalog_create_indices: true,
            embedding_model: EmbeddingModel::default(),
            similar_archetype_count: NonZeroUsize::new(settings.top_k).unwrap_or(NonZeroUsize::MIN),
            default_archetype: settings.default_archetype,
            archetype_silent_social: None,
            recommend_default_top_n: 10,
            recommend_max_top_n: 100,
        }
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn catalog_db_path(&self) -> &Path {
        &self.catalog_db_path
    }

    #[must_use]
    pub fn catalog_row_limit(&self) -> Option<u32> {
        self.catalog_row_limit
    }

    #[must_use]
    pub fn catalog_db_max_connections(&self) -> u32 {
        self.catalog_db_max_connections
    }

    #[must_use]
    pub fn catalog_db_acquire_timeout(&self) -> Duration {
        self.catalog_db_acquire_timeout
    }

    #[must_use]
    pub fn catalog_create_indices(&self) -> bool {
        self.catalog_create_indices
    }

    #[must_use]
    pub fn embedding_model(&self) -> EmbeddingModel {
        self.embedding_model
    }

    #[must_use]
    pub fn similar_archetype_count(&self) -> NonZeroUsize {
        self.similar_archetype_count
    }

    #[must_use]
    pub fn default_archetype(&self) -> ArchetypeKey {
        self.default_archetype
    }

    #[must_use]
    pub fn archetype_silent_social(&self) -> Option<SocialContext> {
        self.archetype_silent_social
    }

    #[must_use]
    pub fn recommend_default_top_n(&self) -> usize {
        self.recommend_default_top_n
    }

    #[must_use]
    pub fn recommend_max_top_n(&self) -> usize {
        self.recommend_max_top_n
    }

    #[must_use]
    pub fn catalog_options(&self) -> SqliteCatalogOptions {
        SqliteCatalogOptions {
            path: self.catalog_db_path.clone(),
            max_connections: self.catalog_db_max_connections,
            acquire_timeout: self.catalog_db_acquire_timeout,
            create_indices: self.catalog_create_indices,
        }
    }

    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            default_archetype: self.default_archetype,
            top_k: self.similar_archetype_count.get(),
        }
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let parsed = parse_usize(name, default)?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_optional_non_zero_u32(name: &'static str) -> Result<Option<u32>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    let parsed = raw.trim().parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if parsed == 0 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("must be greater than zero"),
        });
    }
    Ok(Some(parsed))
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}

fn parse_from_str<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_csv(name: &'static str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `mood,activity,time,social`
fn parse_archetype(name: &'static str, default: &str) -> Result<ArchetypeKey, ConfigError> {
    let invalid = |source: anyhow::Error| ConfigError::Invalid { name, source };
    let parts = parse_csv(name, default);
    let [mood, activity, time, social] = parts.as_slice() else {
        return Err(invalid(anyhow::anyhow!(
            "expected mood,activity,time,social, got {} labels",
            parts.len()
        )));
    };
    Ok(ArchetypeKey {
        mood: mood.parse::<Mood>().map_err(|e| invalid(e.into()))?,
        activity: activity.parse::<Activity>().map_err(|e| invalid(e.into()))?,
        time: time.parse::<TimeOfDay>().map_err(|e| invalid(e.into()))?,
        social: social.parse::<SocialContext>().map_err(|e| invalid(e.into()))?,
    })
}
