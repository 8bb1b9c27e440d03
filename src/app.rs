use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::{info, warn};

use crate::{
    api,
    catalog::{CatalogCache, CatalogSource, SqliteCatalog},
    config::Config,
    embedding::EmbeddingProvider,
    observability::Telemetry,
    recommend::SongRecommender,
    scenario::{ArchetypeTable, ScenarioResolver, TextCategorizer},
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    recommender: SongRecommender,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn config(&self) -> &Config {
        &self.registry.config
    }

    pub(crate) fn recommender(&self) -> &SongRecommender {
        &self.registry.recommender
    }
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// 埋め込みモデルの読み込みとアーキタイプ表の構築はリクエスト受付前に完了させる。
    /// カタログの初回ロード失敗は警告のみで、最初のリクエストで再試行される。
    ///
    /// # Errors
    /// Telemetry の初期化、カタログDBへの接続、モデル読み込みが失敗した場合はエラーを返す。
    pub async fn build(config: Config) -> Result<Self> {
        let telemetry = Telemetry::new()?;
        let catalog = SqliteCatalog::connect(&config.catalog_options())
            .await
            .with_context(|| {
                format!(
                    "failed to open catalog database {}",
                    config.catalog_db_path().display()
                )
            })?;

        let model = config.embedding_model();
        let silent_social = config.archetype_silent_social();
        let (provider, table) = tokio::task::spawn_blocking(move || -> Result<_> {
            let provider = model
                .load()
                .with_context(|| format!("failed to load embedding model {model}"))?;
            let table = ArchetypeTable::build(provider.as_ref(), silent_social)
                .context("failed to build archetype table")?;
            Ok((provider, table))
        })
        .await
        .context("archetype initialization task panicked")??;

        let registry = Self::from_parts(config, telemetry, provider, table, Arc::new(catalog))?;
        registry.warm_catalog().await;
        Ok(registry)
    }

    /// 既に用意された部品からレジストリを組み立てる。カタログはロードしない。
    ///
    /// # Errors
    /// キーワードオートマトンの構築に失敗した場合はエラーを返す。
    pub fn from_parts(
        config: Config,
        telemetry: Telemetry,
        provider: Arc<dyn EmbeddingProvider>,
        table: ArchetypeTable,
        source: Arc<dyn CatalogSource>,
    ) -> Result<Self> {
        let categorizer = TextCategorizer::new().context("failed to compile keyword tables")?;
        telemetry
            .metrics()
            .archetypes_loaded
            .set(i64::try_from(table.len()).unwrap_or(i64::MAX));

        let resolver = ScenarioResolver::new(
            categorizer,
            provider,
            Arc::new(table),
            config.resolver_settings(),
        );
        let catalog = CatalogCache::new(source, config.catalog_row_limit());
        let recommender = SongRecommender::new(
            Arc::new(resolver),
            Arc::new(catalog),
            telemetry.metrics_arc(),
        );

        Ok(Self {
            config: Arc::new(config),
            telemetry,
            recommender,
        })
    }

    /// 起動時にカタログのスナップショットを読み込む。失敗しても起動は継続する。
    pub async fn warm_catalog(&self) {
        match self.recommender.catalog().load().await {
            Ok(snapshot) => {
                self.telemetry
                    .metrics()
                    .catalog_songs
                    .set(i64::try_from(snapshot.len()).unwrap_or(i64::MAX));
                info!(songs = snapshot.len(), "catalog warmed");
            }
            Err(error) => {
                warn!(error = ?error, "initial catalog load failed; will retry on first request");
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    #[must_use]
    pub fn recommender(&self) -> &SongRecommender {
        &self.recommender
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
