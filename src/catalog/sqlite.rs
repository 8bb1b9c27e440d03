//! SQLite-backed catalog over the `extracted` table.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use tracing::{debug, info};

use super::{CatalogError, CatalogSource, SongRecord};

const TABLE: &str = "extracted";

/// Columns that get an index on startup.
const INDEXED_COLUMNS: [&str; 6] = [
    "danceability",
    "energy",
    "valence",
    "acousticness",
    "instrumentalness",
    "speechiness",
];

/// Feature columns are cast to REAL (and names to TEXT) so values stored with
/// another affinity, such as a whole-number tempo, still decode. Rows without a name are skipped like rows with
/// missing features.
const SELECT_SONGS: &str = r"
    SELECT
        CAST(track_name AS TEXT) AS track_name,
        CAST(artist_name AS TEXT) AS artist_name,
        CAST(danceability AS REAL) AS danceability,
        CAST(energy AS REAL) AS energy,
        CAST(valence AS REAL) AS valence,
        CAST(tempo AS REAL) AS tempo,
        CAST(acousticness AS REAL) AS acousticness,
        CAST(instrumentalness AS REAL) AS instrumentalness,
        CAST(speechiness AS REAL) AS speechiness
    FROM extracted
    WHERE
        track_name IS NOT NULL
        AND artist_name IS NOT NULL
        AND danceability IS NOT NULL
        AND energy IS NOT NULL
        AND valence IS NOT NULL
        AND tempo IS NOT NULL
        AND acousticness IS NOT NULL
        AND instrumentalness IS NOT NULL
        AND speechiness IS NOT NULL
";

#[derive(Debug, Clone)]
pub struct SqliteCatalogOptions {
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub create_indices: bool,
}

impl SqliteCatalogOptions {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
            create_indices: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Opens the catalog file and, when asked, creates the feature indices.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or the indices cannot be created.
    pub async fn connect(options: &SqliteCatalogOptions) -> Result<Self, CatalogError> {
        let connect_options = SqliteConnectOptions::new()
            .filename(&options.path)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(CatalogError::Connect)?;

        let catalog = Self::from_pool(pool);
        if options.create_indices {
            catalog.ensure_indices().await?;
        }
        info!(
            path = %options.path.display(),
            create_indices = options.create_indices,
            "catalog database opened"
        );
        Ok(catalog)
    }

    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `CREATE INDEX IF NOT EXISTS` for each filtered feature column.
    ///
    /// # Errors
    /// Returns the first failing statement.
    pub async fn ensure_indices(&self) -> Result<(), CatalogError> {
        for column in INDEXED_COLUMNS {
            let statement =
                format!("CREATE INDEX IF NOT EXISTS idx_{column} ON {TABLE}({column})");
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(CatalogError::Query)?;
        }
        debug!(indices = INDEXED_COLUMNS.len(), "catalog indices ensured");
        Ok(())
    }

    fn row_to_song(row: &SqliteRow) -> Result<SongRecord, CatalogError> {
        Ok(SongRecord {
            track_name: text_column(row, "track_name")?,
            artist_name: text_column(row, "artist_name")?,
            danceability: real_column(row, "danceability")?,
            energy: real_column(row, "energy")?,
            valence: real_column(row, "valence")?,
            tempo: real_column(row, "tempo")?,
            acousticness: real_column(row, "acousticness")?,
            instrumentalness: real_column(row, "instrumentalness")?,
            speechiness: real_column(row, "speechiness")?,
            loudness: None,
        })
    }
}

fn text_column(row: &SqliteRow, column: &'static str) -> Result<String, CatalogError> {
    row.try_get::<String, _>(column)
        .map_err(|source| CatalogError::Decode { column, source })
}

fn real_column(row: &SqliteRow, column: &'static str) -> Result<f64, CatalogError> {
    row.try_get::<f64, _>(column)
        .map_err(|source| CatalogError::Decode { column, source })
}

#[async_trait]
impl CatalogSource for SqliteCatalog {
    async fn fetch_songs(&self, limit: Option<u32>) -> Result<Vec<SongRecord>, CatalogError> {
        let rows = match limit {
            Some(limit) => {
                let statement = format!("{SELECT_SONGS} LIMIT ?");
                sqlx::query::<Sqlite>(&statement)
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await
            }
            None => sqlx::query::<Sqlite>(SELECT_SONGS).fetch_all(&self.pool).await,
        }
        .map_err(CatalogError::Query)?;

        let songs = rows
            .iter()
            .map(Self::row_to_song)
            .collect::<Result<Vec<_>, _>>()?;
        info!(songs = songs.len(), ?limit, "catalog rows fetched");
        Ok(songs)
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(CatalogError::Query)?;
        Ok(())
    }
}
