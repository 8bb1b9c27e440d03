//! Scenario resolution and catalog scoring throughput.
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scenario_recommender::{
    catalog::SongRecord,
    embedding::{EmbeddingProvider, HashingEmbeddingProvider},
    recommend::CatalogScorer,
    scenario::{ArchetypeTable, ResolverSettings, ScenarioResolver, TextCategorizer},
};

const SCENARIOS: &[&str] = &[
    "Morning workout at the gym, feeling energetic",
    "Relaxing evening at home after work",
    "Late night coding session",
    "Feeling sad while commuting in the evening",
    "Party with friends on a sunny afternoon",
];

fn resolver() -> ScenarioResolver {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbeddingProvider::default());
    let table = ArchetypeTable::build(provider.as_ref(), None).expect("archetype table");
    ScenarioResolver::new(
        TextCategorizer::new().expect("keyword tables"),
        provider,
        Arc::new(table),
        ResolverSettings::default(),
    )
}

#[allow(clippy::cast_precision_loss)]
fn synthetic_catalog(size: usize) -> Vec<SongRecord> {
    (0..size)
        .map(|i| {
            let step = |period: usize| (i % period) as f64 / period as f64;
            SongRecord {
                track_name: format!("track {i}"),
                artist_name: format!("artist {}", i % 97),
                danceability: step(11),
                energy: step(13),
                valence: step(17),
                tempo: 60.0 + step(19) * 100.0,
                acousticness: step(23),
                instrumentalness: step(29),
                speechiness: step(31) * 0.5,
                loudness: None,
            }
        })
        .collect()
}

fn bench_archetype_table(c: &mut Criterion) {
    let provider = HashingEmbeddingProvider::default();
    c.bench_function("archetype_table_build_300", |b| {
        b.iter(|| {
            let table = ArchetypeTable::build(&provider, None).expect("archetype table");
            black_box(table.len());
        });
    });
}

fn bench_resolution(c: &mut Criterion) {
    let resolver = resolver();
    c.bench_function("resolve_5_scenarios", |b| {
        b.iter(|| {
            for text in SCENARIOS {
                let trace = resolver.inspect(text).expect("resolve");
                black_box(trace.ranges.len());
            }
        });
    });
}

fn bench_scoring(c: &mut Criterion) {
    let resolver = resolver();
    let ranges = resolver.inspect(SCENARIOS[1]).expect("resolve").ranges;
    let catalog = synthetic_catalog(50_000);

    c.bench_function("rank_50k_songs_top10", |b| {
        b.iter(|| {
            let top = CatalogScorer.rank(&catalog, &ranges, None, 10);
            black_box(top.len());
        });
    });
    c.bench_function("rank_50k_songs_acoustic_top10", |b| {
        b.iter(|| {
            let top = CatalogScorer.rank(&catalog, &ranges, Some("acoustic"), 10);
            black_box(top.len());
        });
    });
}

criterion_group!(benches, bench_archetype_table, bench_resolution, bench_scoring);
criterion_main!(benches);
