//! Analysis catalog
//! The fixed sequence of cleaning, group-by counts, and charts run against
//! the loaded registration table. Each step narrows the Washington view and
//! emits one SVG.

use crate::charts::{self, BarSpec, GroupedBarData};
use crate::data::{aggregator, cleaner, schema, GroupCount};
use anyhow::{Context, Result};
use log::{debug, info};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Top 10 makes by WA registration count, compared by vehicle type.
const TOP_MAKES: [&str; 10] = [
    "TESLA",
    "NISSAN",
    "CHEVROLET",
    "FORD",
    "BMW",
    "KIA",
    "TOYOTA",
    "VOLKSWAGEN",
    "VOLVO",
    "JEEP",
];

/// Top 5 counties by registration count.
const TOP_COUNTIES: [&str; 5] = ["King", "Snohomish", "Pierce", "Clark", "Thurston"];

/// Top 5 makes, compared across the top counties.
const TOP_5_MAKES: [&str; 5] = ["TESLA", "NISSAN", "CHEVROLET", "FORD", "BMW"];

/// Makes whose WA fleet is battery-electric only.
const BEV_LEADERS: [&str; 3] = ["TESLA", "NISSAN", "VOLKSWAGEN"];

// The "EV era" window. 2023 is excluded as an incomplete model year.
const ERA_START: i64 = 2012;
const ERA_END: i64 = 2022;

/// Machine-readable record of one analysis run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub source_rows: usize,
    pub wa_rows: usize,
    pub null_counts: Vec<(String, usize)>,
    pub charts: Vec<ChartEntry>,
}

#[derive(Debug, Serialize)]
pub struct ChartEntry {
    pub title: String,
    pub file: PathBuf,
    pub groups: usize,
    pub vehicles: u64,
}

/// Run the whole catalog. The first failing step aborts the run.
pub fn run(raw: &DataFrame, out_dir: &Path) -> Result<RunSummary> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let trimmed = cleaner::drop_columns(raw, &schema::DROP_COLUMNS)?;
    info!(
        "{} rows x {} columns after dropping id columns",
        trimmed.height(),
        trimmed.width()
    );

    let null_counts = cleaner::count_nulls(&trimmed);
    for (column, nulls) in &null_counts {
        if *nulls > 0 {
            info!("column '{column}' has {nulls} null values");
        }
    }

    let wa = cleaner::filter_equals(&trimmed, schema::STATE, "WA")?;
    info!("{} of {} registrations are in WA", wa.height(), trimmed.height());

    let recent = aggregator::filter_range(&wa, schema::MODEL_YEAR, ERA_START, ERA_END)?;
    info!(
        "{} registrations with model years {ERA_START}-{ERA_END}",
        recent.height()
    );

    let charts = vec![
        ev_types(&wa, out_dir)?,
        top_makes(&wa, out_dir)?,
        ev_type_by_make(&wa, out_dir)?,
        top_models(&wa, out_dir)?,
        cafv_eligibility(&wa, out_dir)?,
        top_counties(&wa, out_dir)?,
        county_makes(&wa, out_dir)?,
        year_growth(&recent, out_dir)?,
        ev_type_by_year(&recent, out_dir)?,
        bev_leaders_by_year(&recent, out_dir)?,
        tesla_models_by_year(&recent, out_dir)?,
    ];

    Ok(RunSummary {
        source_rows: raw.height(),
        wa_rows: wa.height(),
        null_counts,
        charts,
    })
}

fn ev_types(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let counts = aggregator::group_count(wa, &[schema::EV_TYPE])?.sorted_desc();
    log_counts(&counts);

    let file = out_dir.join("01_ev_types.svg");
    charts::render_pie(&file, "Electric Vehicle Types", &counts)?;
    Ok(entry("Electric Vehicle Types", &file, &counts))
}

fn top_makes(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let counts = aggregator::group_count(wa, &[schema::MAKE])?.top_n(20);
    log_counts(&counts);

    let file = out_dir.join("02_top_makes.svg");
    let spec = BarSpec::new("Top 20 Makes of Electric Vehicles", "Counts", "Make").horizontal();
    charts::render_bar(&file, &spec, &GroupedBarData::from_single(&counts))?;
    Ok(entry("Top 20 Makes of Electric Vehicles", &file, &counts))
}

fn ev_type_by_make(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let subset = aggregator::filter_in(wa, schema::MAKE, &TOP_MAKES)?;
    let counts = aggregator::group_count(&subset, &[schema::EV_TYPE, schema::MAKE])?;
    log_counts(&counts);

    let file = out_dir.join("03_ev_type_by_make.svg");
    let data = GroupedBarData::from_group_count(&counts, 1)?;
    let spec = BarSpec::new("Counts of Electric Vehicle Types by Make", "Car Make", "Count");
    charts::render_bar(&file, &spec, &data)?;
    Ok(entry("Counts of Electric Vehicle Types by Make", &file, &counts))
}

fn top_models(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    // Derived on the exact view being counted; earlier views never see the
    // composite column.
    let with_combo =
        aggregator::derive_concat(wa, schema::MAKE_AND_MODEL, schema::MAKE, schema::MODEL, " ")?;
    let counts = aggregator::group_count(&with_combo, &[schema::MAKE_AND_MODEL])?.top_n(20);
    log_counts(&counts);

    let file = out_dir.join("04_top_models.svg");
    let spec = BarSpec::new("Top 20 Models of Electric Vehicles", "Counts", "Vehicle Models")
        .horizontal();
    charts::render_bar(&file, &spec, &GroupedBarData::from_single(&counts))?;
    Ok(entry("Top 20 Models of Electric Vehicles", &file, &counts))
}

fn cafv_eligibility(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let counts = aggregator::group_count(wa, &[schema::CAFV])?.sorted_desc();
    log_counts(&counts);

    let file = out_dir.join("05_cafv_eligibility.svg");
    let spec = BarSpec::new("Distribution of CAFV Eligibility", "CAFV Eligibility", "Count")
        .annotated();
    charts::render_bar(&file, &spec, &GroupedBarData::from_single(&counts))?;
    Ok(entry("Distribution of CAFV Eligibility", &file, &counts))
}

fn top_counties(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let counts = aggregator::group_count(wa, &[schema::COUNTY])?.top_n(20);
    log_counts(&counts);

    let file = out_dir.join("06_top_counties.svg");
    let spec = BarSpec::new(
        "Washington's Top 20 Counties With Electric Vehicles",
        "Counts",
        "County",
    )
    .horizontal();
    charts::render_bar(&file, &spec, &GroupedBarData::from_single(&counts))?;
    Ok(entry(
        "Washington's Top 20 Counties With Electric Vehicles",
        &file,
        &counts,
    ))
}

fn county_makes(wa: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let in_counties = aggregator::filter_in(wa, schema::COUNTY, &TOP_COUNTIES)?;
    let subset = aggregator::filter_in(&in_counties, schema::MAKE, &TOP_5_MAKES)?;
    let counts = aggregator::group_count(&subset, &[schema::COUNTY, schema::MAKE])?;
    log_counts(&counts);

    let file = out_dir.join("07_county_makes.svg");
    let data = GroupedBarData::from_group_count(&counts, 1)?;
    let spec = BarSpec::new("Top 5 Car Makes in Each County", "Count", "Car Make").horizontal();
    charts::render_bar(&file, &spec, &data)?;
    Ok(entry("Top 5 Car Makes in Each County", &file, &counts))
}

fn year_growth(recent: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let counts = aggregator::group_count(recent, &[schema::MODEL_YEAR])?.sorted_by_key_numeric();
    log_counts(&counts);

    let file = out_dir.join("08_year_growth.svg");
    let spec = BarSpec::new(
        "Growth Of Electric Vehicles Over The Years: 2012 Till 2022",
        "Year",
        "Counts",
    );
    charts::render_bar(&file, &spec, &GroupedBarData::from_single(&counts))?;
    Ok(entry(
        "Growth Of Electric Vehicles Over The Years: 2012 Till 2022",
        &file,
        &counts,
    ))
}

fn ev_type_by_year(recent: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let counts = aggregator::group_count(recent, &[schema::EV_TYPE, schema::MODEL_YEAR])?;
    log_counts(&counts);

    let file = out_dir.join("09_ev_type_by_year.svg");
    let mut data = GroupedBarData::from_group_count(&counts, 1)?;
    data.sort_categories_numeric();
    let spec = BarSpec::new(
        "Evolution of BEVs and PHEVs Over The Years: 2012 Till 2022",
        "Model Year",
        "Count",
    );
    charts::render_bar(&file, &spec, &data)?;
    Ok(entry(
        "Evolution of BEVs and PHEVs Over The Years: 2012 Till 2022",
        &file,
        &counts,
    ))
}

fn bev_leaders_by_year(recent: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let makes = aggregator::filter_in(recent, schema::MAKE, &BEV_LEADERS)?;
    let bev = aggregator::filter_in(&makes, schema::EV_TYPE, &[schema::BEV])?;
    let counts = aggregator::group_count(&bev, &[schema::MAKE, schema::MODEL_YEAR])?;
    log_counts(&counts);

    let file = out_dir.join("10_bev_leaders_by_year.svg");
    let mut data = GroupedBarData::from_group_count(&counts, 1)?;
    data.sort_categories_numeric();
    let spec = BarSpec::new(
        "Evolution Of Top 3 Battery Electric Vehicles: Nissan, Volkswagen And Tesla",
        "Car Model Year",
        "Counts",
    );
    charts::render_bar(&file, &spec, &data)?;
    Ok(entry(
        "Evolution Of Top 3 Battery Electric Vehicles: Nissan, Volkswagen And Tesla",
        &file,
        &counts,
    ))
}

fn tesla_models_by_year(recent: &DataFrame, out_dir: &Path) -> Result<ChartEntry> {
    let tesla = aggregator::filter_in(recent, schema::MAKE, &["TESLA"])?;
    let counts = aggregator::group_count(&tesla, &[schema::MODEL, schema::MODEL_YEAR])?;
    log_counts(&counts);

    let file = out_dir.join("11_tesla_models_by_year.svg");
    let mut data = GroupedBarData::from_group_count(&counts, 1)?;
    data.sort_categories_numeric();
    let spec = BarSpec::new(
        "Comparison Of Different Tesla Models Against Their Year Of Model",
        "Year Of Model",
        "Counts",
    );
    charts::render_bar(&file, &spec, &data)?;
    Ok(entry(
        "Comparison Of Different Tesla Models Against Their Year Of Model",
        &file,
        &counts,
    ))
}

fn entry(title: &str, file: &Path, counts: &GroupCount) -> ChartEntry {
    ChartEntry {
        title: title.to_string(),
        file: file.to_path_buf(),
        groups: counts.len(),
        vehicles: counts.total(),
    }
}

fn log_counts(counts: &GroupCount) {
    for (tuple, count) in counts.entries() {
        debug!("{} = {}", tuple.join(" / "), count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    // A frame shaped like the real export, small enough to eyeball.
    fn sample() -> DataFrame {
        let n = 6;
        df!(
            schema::VIN => vec!["5YJ3E1EB"; n],
            schema::POSTAL_CODE => vec![98052i64; n],
            schema::BASE_MSRP => vec![0i64; n],
            schema::LEGISLATIVE_DISTRICT => vec![45i64; n],
            schema::DOL_VEHICLE_ID => vec![101i64; n],
            schema::CENSUS_TRACT => vec![53033i64; n],
            schema::STATE => ["WA", "WA", "WA", "WA", "WA", "OR"],
            schema::COUNTY => ["King", "King", "Snohomish", "Pierce", "Clark", "Multnomah"],
            schema::MAKE => ["TESLA", "TESLA", "NISSAN", "FORD", "TESLA", "TESLA"],
            schema::MODEL => ["MODEL 3", "MODEL Y", "LEAF", "MUSTANG MACH-E", "MODEL 3", "MODEL S"],
            schema::EV_TYPE => [schema::BEV, schema::BEV, schema::BEV, schema::PHEV, schema::BEV, schema::BEV],
            schema::CAFV => vec!["Clean Alternative Fuel Vehicle Eligible"; n],
            schema::MODEL_YEAR => [2020i64, 2022, 2018, 2021, 2022, 2022],
        )
        .unwrap()
    }

    #[test]
    fn run_emits_every_chart_in_the_catalog() {
        let out_dir = std::env::temp_dir().join("ev_insights_catalog_test");
        let summary = run(&sample(), &out_dir).unwrap();

        assert_eq!(summary.source_rows, 6);
        assert_eq!(summary.wa_rows, 5);
        assert_eq!(summary.charts.len(), 11);
        for chart in &summary.charts {
            assert!(chart.file.exists(), "missing {}", chart.file.display());
            assert!(chart.vehicles > 0);
        }

        std::fs::remove_dir_all(&out_dir).ok();
    }

    #[test]
    fn dropped_columns_never_reach_the_null_report() {
        let out_dir = std::env::temp_dir().join("ev_insights_nulls_test");
        let summary = run(&sample(), &out_dir).unwrap();

        for dropped in schema::DROP_COLUMNS {
            assert!(summary.null_counts.iter().all(|(name, _)| name != dropped));
        }

        std::fs::remove_dir_all(&out_dir).ok();
    }
}
