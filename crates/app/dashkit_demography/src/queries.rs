//! Queries over the demography tables.

use serde::Serialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::error::QueryError;

pub const DEM_MIN_YEAR: i64 = 1950;
pub const DEM_MAX_YEAR: i64 = 2023;

pub const DEM_TYPE_TOTAL: &str = "t";
pub const DEM_TYPE_MALE: &str = "m";
pub const DEM_TYPE_FEMALE: &str = "f";

/// Age bracket columns and their display labels, youngest first.
pub const DEM_DATA_COLS_AND_LABELS: [(&str, &str); 5] = [
    ("years_0_4", "0-4"),
    ("years_5_14", "5-14"),
    ("years_15_24", "15-24"),
    ("years_25_64", "25-64"),
    ("years_65_plus", "65+"),
];

pub const COUNTRY_COLS: [&str; 8] = [
    "name",
    "alpha_2",
    "alpha_3",
    "code",
    "region",
    "sub_region",
    "region_code",
    "sub_region_code",
];

const COUNTRY_COL_LABELS: [&str; 8] = [
    "Name",
    "ISO Code 2",
    "ISO Code 3",
    "Code",
    "Region",
    "Sub Region",
    "Region Code",
    "Sub Region Code",
];

/// Column description consumed by table and infobox renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColInfo {
    pub id: String,
    pub label: String,
    pub visible: bool,
}

pub fn table_col_info(id: &str, label: &str, visible: bool) -> ColInfo {
    ColInfo {
        id: id.to_string(),
        label: label.to_string(),
        visible,
    }
}

pub fn country_table_cols_info() -> Vec<ColInfo> {
    COUNTRY_COLS
        .iter()
        .zip(COUNTRY_COL_LABELS)
        .map(|(id, label)| table_col_info(id, label, true))
        .collect()
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CountryRow {
    pub name: String,
    pub alpha_2: String,
    pub alpha_3: String,
    pub code: Option<i64>,
    pub region: String,
    pub sub_region: String,
    pub region_code: Option<i64>,
    pub sub_region_code: Option<i64>,
}

impl CountryRow {
    /// Values in [`COUNTRY_COLS`] order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            json!(self.name),
            json!(self.alpha_2),
            json!(self.alpha_3),
            json!(self.code),
            json!(self.region),
            json!(self.sub_region),
            json!(self.region_code),
            json!(self.sub_region_code),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DemographyRow {
    pub code: String,
    pub year: i64,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub years_0_4: i64,
    pub years_5_14: i64,
    pub years_15_24: i64,
    pub years_25_64: i64,
    pub years_65_plus: i64,
}

impl DemographyRow {
    /// Value of an age bracket column by name.
    pub fn get(&self, col: &str) -> Option<i64> {
        match col {
            "years_0_4" => Some(self.years_0_4),
            "years_5_14" => Some(self.years_5_14),
            "years_15_24" => Some(self.years_15_24),
            "years_25_64" => Some(self.years_25_64),
            "years_65_plus" => Some(self.years_65_plus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FertilityRow {
    pub country: String,
    pub year: i64,
    pub fertility: f64,
}

const COUNTRY_SELECT: &str = r#"
    SELECT name, alpha_2, alpha_3, code, region, sub_region, region_code, sub_region_code
    FROM country
"#;

const DEM_SELECT: &str = r#"
    SELECT code, year, type, years_0_4, years_5_14, years_15_24, years_25_64, years_65_plus
    FROM demography
"#;

pub async fn all_countries(pool: &SqlitePool) -> Result<Vec<CountryRow>, QueryError> {
    let sql = format!("{COUNTRY_SELECT} ORDER BY name");
    Ok(sqlx::query_as::<_, CountryRow>(&sql).fetch_all(pool).await?)
}

/// `(alpha_3, name)` pairs ordered by name.
pub async fn country_key_and_label_pairs(
    pool: &SqlitePool,
) -> Result<Vec<(String, String)>, QueryError> {
    Ok(sqlx::query_as::<_, (String, String)>(
        "SELECT alpha_3 AS key, name AS label FROM country ORDER BY label",
    )
    .fetch_all(pool)
    .await?)
}

/// Case-insensitive lookup by name, alpha-3 or alpha-2 code.
pub async fn country_by_fuzzy_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<CountryRow>, QueryError> {
    let sql = format!(
        "{COUNTRY_SELECT} WHERE name LIKE ?1 OR alpha_3 LIKE ?1 OR alpha_2 LIKE ?1 ORDER BY name LIMIT 1"
    );
    Ok(sqlx::query_as::<_, CountryRow>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?)
}

/// Every year of `code`'s demography of the given type, oldest first.
pub async fn dem_by_code(
    pool: &SqlitePool,
    code: &str,
    kind: &str,
) -> Result<Vec<DemographyRow>, QueryError> {
    let sql = format!("{DEM_SELECT} WHERE code = ?1 AND type = ?2 ORDER BY year");
    Ok(sqlx::query_as::<_, DemographyRow>(&sql)
        .bind(code)
        .bind(kind)
        .fetch_all(pool)
        .await?)
}

pub async fn dem_by_code_and_year(
    pool: &SqlitePool,
    code: &str,
    year: i64,
    kind: &str,
) -> Result<Option<DemographyRow>, QueryError> {
    let sql = format!("{DEM_SELECT} WHERE code = ?1 AND year = ?2 AND type = ?3");
    Ok(sqlx::query_as::<_, DemographyRow>(&sql)
        .bind(code)
        .bind(year)
        .bind(kind)
        .fetch_optional(pool)
        .await?)
}

pub async fn fert_by_year(pool: &SqlitePool, year: i64) -> Result<Vec<FertilityRow>, QueryError> {
    Ok(sqlx::query_as::<_, FertilityRow>(
        "SELECT country, year, fertility FROM fertility WHERE year = ?1 ORDER BY country, year",
    )
    .bind(year)
    .fetch_all(pool)
    .await?)
}
