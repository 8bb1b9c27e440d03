use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use scenario_recommender::{
    catalog::{CatalogCache, SqliteCatalog, SqliteCatalogOptions},
    embedding::EmbeddingModel,
    recommend::{CatalogScorer, Recommendation},
    scenario::{ArchetypeTable, ResolverSettings, ScenarioResolver, SocialContext, TextCategorizer},
};

struct Args {
    model: EmbeddingModel,
    silent_social: Option<SocialContext>,
    db: Option<PathBuf>,
    genre: Option<String>,
    top_n: usize,
    texts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let model = args.model;
    let silent_social = args.silent_social;
    let (provider, table) = tokio::task::spawn_blocking(move || -> Result<_> {
        let provider = model.load().context("failed to load embedding model")?;
        let table = ArchetypeTable::build(provider.as_ref(), silent_social)
            .context("failed to build archetype table")?;
        Ok((provider, table))
    })
    .await
    .context("initialization task panicked")??;

    let resolver = ScenarioResolver::new(
        TextCategorizer::new().context("failed to compile keyword tables")?,
        provider,
        Arc::new(table),
        ResolverSettings::default(),
    );

    let catalog = match &args.db {
        Some(path) => {
            let source = SqliteCatalog::connect(&SqliteCatalogOptions::new(path))
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Some(CatalogCache::new(Arc::new(source), None))
        }
        None => None,
    };

    for text in &args.texts {
        let trace = resolver.inspect(text).context("failed to resolve scenario")?;
        println!("{}", serde_json::to_string_pretty(&trace)?);

        // Ranked against the trace above, so each text is embedded once.
        if let Some(catalog) = &catalog {
            let snapshot = catalog.snapshot().await.context("failed to load catalog")?;
            let songs: Vec<Recommendation> = CatalogScorer
                .rank(
                    snapshot.songs(),
                    &trace.ranges,
                    args.genre.as_deref(),
                    args.top_n,
                )
                .into_iter()
                .map(|hit| Recommendation::from(hit.song))
                .collect();
            println!("{}", serde_json::to_string_pretty(&songs)?);
        }
    }
    Ok(())
}

fn parse_args() -> Result<Args> {
    let mut model = EmbeddingModel::Hashing;
    let mut silent_social = None;
    let mut db = None;
    let mut genre = None;
    let mut top_n = 10;
    let mut texts = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => {
                let value = args.next().context("--model requires a name")?;
                model = value.parse()?;
            }
            "--silent-social" => {
                let value = args.next().context("--silent-social requires a label")?;
                silent_social = Some(value.parse::<SocialContext>()?);
            }
            "--db" => {
                let value = args.next().context("--db requires a path argument")?;
                db = Some(PathBuf::from(value));
            }
            "--genre" => {
                genre = Some(args.next().context("--genre requires a name")?);
            }
            "--top-n" => {
                let value = args.next().context("--top-n requires a number")?;
                top_n = value.parse::<usize>().context("--top-n must be an integer")?;
            }
            "--help" => {
                print_usage();
                process::exit(0);
            }
            flag if flag.starts_with("--") => {
                bail!("unknown argument: {flag}");
            }
            _ => texts.push(arg.clone()),
        }
    }

    if texts.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("failed to read stdin")?;
            if !line.trim().is_empty() {
                texts.push(line);
            }
        }
    }

    Ok(Args {
        model,
        silent_social,
        db,
        genre,
        top_n,
        texts,
    })
}

fn print_usage() {
    eprintln!(
        "Usage: inspect_scenario [--model hashing|all-distilroberta-v1|all-mini-lm-l12-v2|all-mini-lm-l6-v2] \
         [--silent-social LABEL] [--db PATH [--genre NAME] [--top-n N]] [TEXT ...]\n\
         Prints the resolution trace for each TEXT (or each stdin line)."
    );
}
