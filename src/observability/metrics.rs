//! Prometheusメトリクス定義。
use prometheus::{
    Histogram, IntCounter, IntCounterVec, IntGauge, Registry, histogram_opts,
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry,
};
use std::sync::Arc;

/// 推薦リクエストの結果ラベル。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    ScenarioFailure,
    CatalogUnavailable,
}

impl RequestOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::ScenarioFailure => "scenario_failure",
            RequestOutcome::CatalogUnavailable => "catalog_unavailable",
        }
    }
}

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub recommendations: IntCounterVec,
    pub archetype_fallbacks: IntCounter,

    // ヒストグラム
    pub resolve_duration: Histogram,
    pub recommend_duration: Histogram,

    // ゲージ
    pub catalog_songs: IntGauge,
    pub archetypes_loaded: IntGauge,
}

impl Metrics {
    /// 指定されたレジストリにメトリクスを登録する。
    ///
    /// # Errors
    /// 同名のメトリクスが既に登録されている場合はエラーを返す。
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            recommendations: register_int_counter_vec_with_registry!(
                "scenario_recommendations_total",
                "Recommendation requests by outcome",
                &["outcome"],
                registry
            )?,
            archetype_fallbacks: register_int_counter_with_registry!(
                "scenario_archetype_fallbacks_total",
                "Resolutions that fell back to the default archetype",
                registry
            )?,
            resolve_duration: register_histogram_with_registry!(
                histogram_opts!(
                    "scenario_resolve_duration_seconds",
                    "Time spent classifying, embedding and blending one scenario",
                    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
                ),
                registry
            )?,
            recommend_duration: register_histogram_with_registry!(
                "scenario_recommend_duration_seconds",
                "End-to-end recommendation latency",
                registry
            )?,
            catalog_songs: register_int_gauge_with_registry!(
                "scenario_catalog_songs",
                "Songs in the current catalog snapshot",
                registry
            )?,
            archetypes_loaded: register_int_gauge_with_registry!(
                "scenario_archetypes_loaded",
                "Archetypes in the resolution table",
                registry
            )?,
        })
    }

    pub fn record_outcome(&self, outcome: RequestOutcome) {
        self.recommendations
            .with_label_values(&[outcome.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once_per_registry() {
        let registry = Arc::new(Registry::new());
        let metrics = Metrics::new(Arc::clone(&registry)).expect("metrics");
        metrics.record_outcome(RequestOutcome::Success);
        metrics.record_outcome(RequestOutcome::Success);
        metrics.record_outcome(RequestOutcome::CatalogUnavailable);

        assert_eq!(
            metrics
                .recommendations
                .with_label_values(&["success"])
                .get(),
            2
        );
        assert!(Metrics::new(registry).is_err());
    }
}
