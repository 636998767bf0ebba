use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::db::{self, Dataset};

fn dem(code: &str, year: i64, kind: &str, base: i64) -> Value {
    json!({
        "code": code, "year": year, "type": kind,
        "years_0_4": base, "years_5_14": base * 2, "years_15_24": base * 3,
        "years_25_64": base * 4, "years_65_plus": base * 5
    })
}

pub fn sample_dataset() -> Dataset {
    let countries = json!([
        {"name": "France", "alpha-2": "FR", "alpha-3": "FRA", "country-code": 250,
         "region": "Europe", "sub-region": "Western Europe", "region-code": 150, "sub-region-code": 155},
        {"name": "Mexico", "alpha-2": "MX", "alpha-3": "MEX", "country-code": 484,
         "region": "Americas", "sub-region": "Latin America and the Caribbean",
         "region-code": 19, "sub-region-code": 419},
        {"name": "Brazil", "alpha-2": "BR", "alpha-3": "BRA", "country-code": 76,
         "region": "Americas", "sub-region": "Latin America and the Caribbean",
         "region-code": 19, "sub-region-code": 419}
    ]);
    let fertility = json!([
        {"Code": "FRA", "Year": 2023, "Fertility Rate": 1.68},
        {"Code": "BRA", "Year": 2023, "Fertility Rate": 1.62},
        {"Code": "MEX", "Year": 2023, "Fertility Rate": 1.82},
        {"Code": "FRA", "Year": 2000, "Fertility Rate": 1.89}
    ]);
    let demography = json!([
        dem("FRA", 2022, "t", 100),
        dem("FRA", 2023, "t", 110),
        dem("FRA", 2023, "m", 50),
        dem("FRA", 2023, "f", 60),
        dem("MEX", 2023, "t", 300)
    ]);

    serde_json::from_value(json!({
        "countries": countries,
        "fertility": fertility,
        "demography": demography
    }))
    .unwrap()
}

pub async fn seeded_pool() -> SqlitePool {
    let pool = db::open_memory().await.unwrap();
    db::load(&pool, &sample_dataset()).await.unwrap();
    pool
}
