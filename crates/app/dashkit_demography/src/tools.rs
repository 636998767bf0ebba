//! World demography tools and the `Country` tag value type.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use dashkit_core::tag_value::{
    ContextActionRequest, ContextActionResponse, LoadRequest, LoadResponse, MatchRequest,
    MatchResponse, context_action_handler, load_handler, match_handler,
};
use dashkit_core::{AppInfo, Field, HandlerError, TagValueType, Tool};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sqlx::SqlitePool;

use crate::queries::{
    self, COUNTRY_COLS, DEM_DATA_COLS_AND_LABELS, DEM_MAX_YEAR, DEM_MIN_YEAR, DEM_TYPE_FEMALE,
    DEM_TYPE_MALE, DEM_TYPE_TOTAL,
};

pub const NS: &str = "demography";
pub const TITLE: &str = "World Demography";

/// Execution state shared by every handler.
pub struct Demography {
    pub pool: SqlitePool,
}

/// Country selected when a context action fires without a value.
const FALLBACK_COUNTRY: &str = "GER";

// =============================================================================
// Country tag value type
// =============================================================================

async fn load_countries(_: LoadRequest, state: Arc<Demography>) -> Result<LoadResponse, HandlerError> {
    Ok(LoadResponse {
        info: None,
        entries: queries::country_key_and_label_pairs(&state.pool).await?,
    })
}

async fn match_country(req: MatchRequest, state: Arc<Demography>) -> Result<MatchResponse, HandlerError> {
    let entry = queries::country_by_fuzzy_name(&state.pool, &req.value)
        .await?
        .map(|c| (c.alpha_3, c.name));
    Ok(MatchResponse { entry })
}

async fn country_context_action(
    req: ContextActionRequest,
    _: Arc<Demography>,
) -> Result<ContextActionResponse, HandlerError> {
    let country = req
        .value
        .map(|v| v.id)
        .unwrap_or_else(|| FALLBACK_COUNTRY.to_string());
    let mut args = Map::new();
    args.insert("country".into(), json!(country));
    Ok(ContextActionResponse { name: None, args })
}

pub fn country_type() -> TagValueType<Demography> {
    TagValueType::new(NS, "Country")
        .title("Country")
        .description("Country Name")
        .icon("flag")
        .load(load_handler("LoadCountries", load_countries))
        .matcher(match_handler("MatchCountry", match_country))
        .context_action(context_action_handler(
            "CountryContextAction",
            country_context_action,
        ))
}

// =============================================================================
// Tools
// =============================================================================

#[derive(Debug, Deserialize)]
struct CountryArgs {
    country: String,
}

#[derive(Debug, Deserialize)]
struct CountryYearArgs {
    country: String,
    year: i64,
}

#[derive(Debug, Deserialize)]
struct YearArgs {
    year: i64,
}

/// Current calendar year clamped into the dataset's year range.
pub fn default_year() -> i64 {
    clamp_year(i64::from(Utc::now().year()))
}

pub fn clamp_year(year: i64) -> i64 {
    year.clamp(DEM_MIN_YEAR, DEM_MAX_YEAR)
}

fn year_field(subject: &str) -> Field {
    Field::integer("year").title("Year").description(format!(
        "Year of {subject} data, if not provided use the latest year. \
         Latest year is {DEM_MAX_YEAR}, first/earliest is {DEM_MIN_YEAR}"
    ))
}

async fn country_table(_: Map<String, Value>, state: Arc<Demography>) -> Result<Value, HandlerError> {
    let rows: Vec<Vec<Value>> = queries::all_countries(&state.pool)
        .await?
        .iter()
        .map(|c| c.values())
        .collect();

    Ok(json!({
        "info": {"type": "table", "cols": queries::country_table_cols_info()},
        "data": {"cols": COUNTRY_COLS, "rows": rows},
    }))
}

async fn country_info_box(args: CountryArgs, state: Arc<Demography>) -> Result<Value, HandlerError> {
    let (cols, row) = match queries::country_by_fuzzy_name(&state.pool, &args.country).await? {
        Some(country) => (COUNTRY_COLS.to_vec(), country.values()),
        None => (Vec::new(), Vec::new()),
    };

    Ok(json!({
        "info": {"type": "infobox", "cols": queries::country_table_cols_info()},
        "data": {"cols": cols, "row": row},
    }))
}

async fn demography_by_country_and_year(
    args: CountryYearArgs,
    state: Arc<Demography>,
) -> Result<Value, HandlerError> {
    let male =
        queries::dem_by_code_and_year(&state.pool, &args.country, args.year, DEM_TYPE_MALE).await?;
    let female =
        queries::dem_by_code_and_year(&state.pool, &args.country, args.year, DEM_TYPE_FEMALE)
            .await?;

    let bracket = |row: &Option<queries::DemographyRow>, col: &str| {
        row.as_ref().and_then(|r| r.get(col)).unwrap_or(0)
    };

    let items: Vec<Value> = DEM_DATA_COLS_AND_LABELS
        .iter()
        .rev()
        .map(|&(col, label)| {
            json!({"label": label, "start": bracket(&male, col), "end": bracket(&female, col)})
        })
        .collect();

    Ok(json!({
        "info": {"type": "pop-pyramid"},
        "data": {"items": items},
    }))
}

async fn demography_by_country_over_time(
    args: CountryArgs,
    state: Arc<Demography>,
) -> Result<Value, HandlerError> {
    let mut cols = vec![("year", "Year")];
    cols.extend(DEM_DATA_COLS_AND_LABELS);
    let val_cols: Vec<&str> = DEM_DATA_COLS_AND_LABELS.iter().map(|(c, _)| *c).collect();

    let rows: Vec<Vec<i64>> = queries::dem_by_code(&state.pool, &args.country, DEM_TYPE_TOTAL)
        .await?
        .iter()
        .map(|r| {
            std::iter::once(r.year)
                .chain(val_cols.iter().filter_map(|c| r.get(c)))
                .collect()
        })
        .collect();

    Ok(json!({
        "info": {
            "type": "series",
            "title": "Demography by Country and Year",
            "yColTitle": "Inhabitants",
            "xCol": "year",
            "xAxisType": "time",
            "valCols": val_cols,
            "smooth": false,
            "cols": cols,
        },
        "data": {"rows": rows},
    }))
}

async fn world_fertility_by_year(args: YearArgs, state: Arc<Demography>) -> Result<Value, HandlerError> {
    let areas: Vec<Value> = queries::fert_by_year(&state.pool, args.year)
        .await?
        .into_iter()
        .map(|r| json!({"name": r.country, "value": r.fertility}))
        .collect();

    Ok(json!({
        "info": {
            "type": "areamap",
            "mapId": "world",
            "colorMap": "jet",
            "onClick": [{
                "action": "DTypeClick",
                "dtypeNs": NS,
                "dtypeName": "Country",
                "idField": "selected$$area",
                "labelField": "selected$$area$label",
            }],
        },
        "data": {"areas": areas},
    }))
}

/// Every tool published by the app, in manifest order.
pub fn tools(country: &TagValueType<Demography>) -> Vec<Arc<Tool<Demography>>> {
    vec![
        Tool::builder("CountryTable")
            .title("Country Table")
            .handler(country_table),
        Tool::builder("CountryInfoBox")
            .title("Country Information")
            .ui_prefix("Information for")
            .examples(["Information about Spain", "Italy's info"])
            .field(country.to_field("country").default("BRA"))
            .context_action(country.to_context_action(None))
            .handler(country_info_box),
        Tool::builder("DemographyByCountryAndYear")
            .title("Demographic Pyramid by Country and Year")
            .examples([
                "Demography for Spain".to_string(),
                format!("Italy's population pyramid in {DEM_MIN_YEAR}"),
            ])
            .field(country.to_field("country").default("FRA"))
            .field(year_field("demography").default(DEM_MAX_YEAR))
            .context_action(country.to_context_action(None))
            .handler(demography_by_country_and_year),
        Tool::builder("DemographyByCountryOverTime")
            .title("Demography by Country over Time")
            .ui_prefix("Demography over Time for")
            .examples([
                "Demography timeserie for Spain",
                "Italy's demography over the years",
            ])
            .field(country.to_field("country").default("MEX"))
            .context_action(country.to_context_action(None))
            .handler(demography_by_country_over_time),
        Tool::builder("WorldFertilityByYear")
            .title("World Fertility by Year")
            .ui_prefix("World Fertility for")
            .examples(["World Fertility", "World Fertility in 1984"])
            .field(year_field("fertility").computed_default(|| json!(default_year())))
            .handler(world_fertility_by_year),
    ]
}

/// Describe the app over `state`.
pub fn build_app(state: Demography) -> AppInfo<Demography> {
    let country = country_type();
    AppInfo::new(NS, TITLE, state)
        .tools(tools(&country))
        .tag_value(country)
}

#[cfg(test)]
mod tests {
    use dashkit_core::{DispatchReply, Dispatcher};

    use super::*;
    use crate::test_support::seeded_pool;

    async fn dispatcher() -> Dispatcher<Demography> {
        Dispatcher::new(build_app(Demography {
            pool: seeded_pool().await,
        }))
    }

    async fn request(d: &Dispatcher<Demography>, op_name: &str, info: Value) -> Value {
        match d.request(op_name, info).await {
            DispatchReply::Json(v) => v,
            DispatchReply::SerializationFailed => panic!("serialization failed"),
        }
    }

    #[test]
    fn year_is_clamped_into_dataset_range() {
        assert_eq!(clamp_year(1900), DEM_MIN_YEAR);
        assert_eq!(clamp_year(1984), 1984);
        assert_eq!(clamp_year(2100), DEM_MAX_YEAR);
        assert!((DEM_MIN_YEAR..=DEM_MAX_YEAR).contains(&default_year()));
    }

    #[tokio::test]
    async fn manifest_lists_every_handler() {
        let d = dispatcher().await;
        let m = d.manifest();
        assert_eq!(m["ns"], NS);
        assert_eq!(m["title"], TITLE);
        assert_eq!(
            m["handlers"],
            json!([
                "CountryContextAction",
                "CountryInfoBox",
                "CountryTable",
                "DemographyByCountryAndYear",
                "DemographyByCountryOverTime",
                "LoadCountries",
                "MatchCountry",
                "WorldFertilityByYear"
            ])
        );
        assert_eq!(
            m["tagValues"]["Country"],
            json!({"icon": "flag", "loadEntriesHandlerId": "LoadCountries", "matchHandlerId": "MatchCountry"})
        );
    }

    #[tokio::test]
    async fn manifest_binds_country_fields() {
        let d = dispatcher().await;
        let tool = &d.manifest()["tools"]["DemographyByCountryOverTime"];
        assert_eq!(tool["ui"]["prefix"], "Demography over Time for");
        assert_eq!(
            tool["ui"]["args"]["country"],
            json!({"from": "country", "prefix": "Country", "dtypeNs": NS, "dtypeName": "Country"})
        );
        assert_eq!(tool["schema"]["fields"]["country"]["default"], "MEX");
        assert_eq!(
            tool["contextActions"][0]["handler"],
            "CountryContextAction"
        );

        let fertility = &d.manifest()["tools"]["WorldFertilityByYear"];
        assert!(fertility["schema"]["fields"]["year"].get("default").is_none());
    }

    #[tokio::test]
    async fn load_and_match_countries() {
        let d = dispatcher().await;
        let loaded = request(&d, "LoadCountries", json!({})).await;
        assert_eq!(
            loaded["entries"],
            json!([["BRA", "Brazil"], ["FRA", "France"], ["MEX", "Mexico"]])
        );

        let hit = request(&d, "MatchCountry", json!({"value": "mx"})).await;
        assert_eq!(hit, json!({"entry": ["MEX", "Mexico"]}));

        let miss = request(&d, "MatchCountry", json!({"value": "Narnia"})).await;
        assert_eq!(miss, json!({"entry": null}));
    }

    #[tokio::test]
    async fn context_action_defaults_country() {
        let d = dispatcher().await;
        let out = request(&d, "CountryContextAction", json!({"value": {"id": "FRA", "label": "France"}})).await;
        assert_eq!(out["args"], json!({"country": "FRA"}));

        let out = request(&d, "CountryContextAction", json!({})).await;
        assert_eq!(out["args"], json!({"country": "GER"}));
    }

    #[tokio::test]
    async fn country_table_rows_follow_columns() {
        let d = dispatcher().await;
        let out = request(&d, "CountryTable", json!({})).await;
        assert_eq!(out["info"]["type"], "table");
        assert_eq!(out["info"]["cols"][0], json!({"id": "name", "label": "Name", "visible": true}));
        assert_eq!(out["data"]["cols"], json!(COUNTRY_COLS));
        assert_eq!(out["data"]["rows"][0][0], "Brazil");
        assert_eq!(out["data"]["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn info_box_uses_default_and_handles_unknown() {
        let d = dispatcher().await;
        let out = request(&d, "CountryInfoBox", json!({})).await;
        assert_eq!(out["data"]["row"][0], "Brazil");

        let out = request(&d, "CountryInfoBox", json!({"country": "Narnia"})).await;
        assert_eq!(out["data"], json!({"cols": [], "row": []}));
    }

    #[tokio::test]
    async fn pyramid_is_oldest_first_male_to_female() {
        let d = dispatcher().await;
        let out = request(&d, "DemographyByCountryAndYear", json!({})).await;
        assert_eq!(out["info"]["type"], "pop-pyramid");
        let items = out["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], json!({"label": "65+", "start": 250, "end": 300}));
        assert_eq!(items[4], json!({"label": "0-4", "start": 50, "end": 60}));

        let out = request(&d, "DemographyByCountryAndYear", json!({"country": "MEX", "year": "2023"})).await;
        assert_eq!(out["data"]["items"][0], json!({"label": "65+", "start": 0, "end": 0}));
    }

    #[tokio::test]
    async fn series_rows_start_with_year() {
        let d = dispatcher().await;
        let out = request(&d, "DemographyByCountryOverTime", json!({"country": "FRA"})).await;
        assert_eq!(out["info"]["cols"][0], json!(["year", "Year"]));
        assert_eq!(out["info"]["valCols"].as_array().unwrap().len(), 5);
        assert_eq!(
            out["data"]["rows"],
            json!([[2022, 100, 200, 300, 400, 500], [2023, 110, 220, 330, 440, 550]])
        );
    }

    #[tokio::test]
    async fn fertility_map_for_year() {
        let d = dispatcher().await;
        let out = request(&d, "WorldFertilityByYear", json!({"year": 2023})).await;
        assert_eq!(out["info"]["onClick"][0]["dtypeName"], "Country");
        assert_eq!(
            out["data"]["areas"],
            json!([
                {"name": "BRA", "value": 1.62},
                {"name": "FRA", "value": 1.68},
                {"name": "MEX", "value": 1.82}
            ])
        );

        let out = request(&d, "WorldFertilityByYear", json!({"year": 2000})).await;
        assert_eq!(out["data"]["areas"], json!([{"name": "FRA", "value": 1.89}]));
    }
}
