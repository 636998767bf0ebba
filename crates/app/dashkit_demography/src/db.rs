//! In-memory SQLite store seeded from the JSON dataset.
//!
//! The dataset keeps the column names of the public sources it was exported
//! from (`alpha-3`, `Fertility Rate`, ...); they are renamed to snake_case
//! columns on load.

use std::path::Path;

use serde::Deserialize;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::error::QueryError;

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    #[serde(rename = "alpha-2")]
    pub alpha_2: String,
    #[serde(rename = "alpha-3")]
    pub alpha_3: String,
    #[serde(rename = "country-code")]
    pub code: Option<i64>,
    #[serde(default)]
    pub region: String,
    #[serde(rename = "sub-region", default)]
    pub sub_region: String,
    #[serde(rename = "region-code")]
    pub region_code: Option<i64>,
    #[serde(rename = "sub-region-code")]
    pub sub_region_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FertilityRecord {
    #[serde(rename = "Code", default)]
    pub country: String,
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Fertility Rate")]
    pub fertility: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemographyRecord {
    #[serde(default)]
    pub code: String,
    pub year: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub years_0_4: i64,
    pub years_5_14: i64,
    pub years_15_24: i64,
    pub years_25_64: i64,
    pub years_65_plus: i64,
}

/// Raw dataset file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub countries: Vec<CountryRecord>,
    #[serde(default)]
    pub fertility: Vec<FertilityRecord>,
    #[serde(default)]
    pub demography: Vec<DemographyRecord>,
}

impl Dataset {
    pub async fn from_path(path: &Path) -> Result<Self, QueryError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Rows inserted per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub countries: u64,
    pub fertility: u64,
    pub demography: u64,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE country (
        name TEXT NOT NULL,
        alpha_2 TEXT NOT NULL,
        alpha_3 TEXT NOT NULL,
        code INTEGER,
        region TEXT NOT NULL,
        sub_region TEXT NOT NULL,
        region_code INTEGER,
        sub_region_code INTEGER
    )
    "#,
    r#"
    CREATE TABLE fertility (
        country TEXT NOT NULL,
        year INTEGER NOT NULL,
        fertility REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE demography (
        code TEXT NOT NULL,
        year INTEGER NOT NULL,
        type TEXT NOT NULL,
        years_0_4 INTEGER NOT NULL,
        years_5_14 INTEGER NOT NULL,
        years_15_24 INTEGER NOT NULL,
        years_25_64 INTEGER NOT NULL,
        years_65_plus INTEGER NOT NULL
    )
    "#,
];

/// Open an empty in-memory database with the dataset tables.
///
/// Every in-memory connection is its own database, so the pool holds exactly
/// one connection that never expires.
pub async fn open_memory() -> Result<SqlitePool, QueryError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    for statement in SCHEMA {
        sqlx::query(*statement).execute(&pool).await?;
    }

    Ok(pool)
}

/// Insert `dataset` into the tables created by [`open_memory`].
///
/// Demography rows without a country code and fertility rows without a
/// country are aggregates and are skipped.
pub async fn load(pool: &SqlitePool, dataset: &Dataset) -> Result<LoadStats, QueryError> {
    let mut stats = LoadStats::default();
    let mut tx = pool.begin().await?;

    for c in &dataset.countries {
        sqlx::query(
            r#"
            INSERT INTO country
                (name, alpha_2, alpha_3, code, region, sub_region, region_code, sub_region_code)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&c.name)
        .bind(&c.alpha_2)
        .bind(&c.alpha_3)
        .bind(c.code)
        .bind(&c.region)
        .bind(&c.sub_region)
        .bind(c.region_code)
        .bind(c.sub_region_code)
        .execute(&mut *tx)
        .await?;
        stats.countries += 1;
    }

    for f in dataset.fertility.iter().filter(|f| !f.country.is_empty()) {
        sqlx::query("INSERT INTO fertility (country, year, fertility) VALUES (?1, ?2, ?3)")
            .bind(&f.country)
            .bind(f.year)
            .bind(f.fertility)
            .execute(&mut *tx)
            .await?;
        stats.fertility += 1;
    }

    for d in dataset.demography.iter().filter(|d| !d.code.is_empty()) {
        sqlx::query(
            r#"
            INSERT INTO demography
                (code, year, type, years_0_4, years_5_14, years_15_24, years_25_64, years_65_plus)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&d.code)
        .bind(d.year)
        .bind(&d.kind)
        .bind(d.years_0_4)
        .bind(d.years_5_14)
        .bind(d.years_15_24)
        .bind(d.years_25_64)
        .bind(d.years_65_plus)
        .execute(&mut *tx)
        .await?;
        stats.demography += 1;
    }

    tx.commit().await?;
    Ok(stats)
}

/// Open the in-memory database and seed it from the dataset at `path`.
pub async fn init(path: &Path) -> Result<SqlitePool, QueryError> {
    info!(path = %path.display(), "loading dataset");
    let dataset = Dataset::from_path(path).await?;
    let pool = open_memory().await?;
    let stats = load(&pool, &dataset).await?;
    info!(
        countries = stats.countries,
        fertility = stats.fertility,
        demography = stats.demography,
        "dataset loaded"
    );
    Ok(pool)
}
