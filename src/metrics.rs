use crate::error::{DashboardError, Result};
use crate::types::{CountryRecord, Dataset, SeriesPoint};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn historical_series(dataset: &Dataset, country: &str) -> Result<Vec<SeriesPoint<u64>>> {
    let record = dataset.record(country)?;
    dataset
        .years()
        .iter()
        .map(|year| {
            record
                .population(year)
                .map(|value| SeriesPoint { year, value })
                .ok_or_else(|| DashboardError::year_not_found(year))
        })
        .collect()
}

// Percent change from the previous census; the first year is 0.
pub fn growth_rates(series: &[SeriesPoint<u64>]) -> Result<Vec<SeriesPoint<f64>>> {
    let mut rates = Vec::with_capacity(series.len());
    for (i, point) in series.iter().enumerate() {
        let rate = if i == 0 {
            0.0
        } else {
            let prev = series[i - 1];
            if prev.value == 0 {
                return Err(DashboardError::Arithmetic(format!(
                    "growth rate for {} divides by zero population in {}",
                    point.year, prev.year
                )));
            }
            (point.value as f64 - prev.value as f64) / prev.value as f64 * 100.0
        };
        rates.push(SeriesPoint { year: point.year, value: rate });
    }
    Ok(rates)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityRow {
    pub country: String,
    pub code: String,
    pub by_year: BTreeMap<i32, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityMatrix {
    pub rows: Vec<DensityRow>,
}

impl DensityMatrix {
    pub fn get(&self, country: &str, year: i32) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.country == country)
            .and_then(|r| r.by_year.get(&year).copied())
    }

    pub fn year_column(&self, year: i32) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.by_year.get(&year).copied().unwrap_or(f64::NAN))
            .collect()
    }
}

pub fn density_matrix(dataset: &Dataset) -> Result<DensityMatrix> {
    let years = dataset.years();
    let rows = dataset
        .records()
        .par_iter()
        .map(|record| {
            let by_year = years
                .iter()
                .map(|year| density(record, year).map(|d| (year, d)))
                .collect::<Result<BTreeMap<_, _>>>()?;
            Ok(DensityRow {
                country: record.name.clone(),
                code: record.code.clone(),
                by_year,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(DensityMatrix { rows })
}

pub fn density_series(dataset: &Dataset, country: &str) -> Result<Vec<SeriesPoint<f64>>> {
    let record = dataset.record(country)?;
    dataset
        .years()
        .iter()
        .map(|year| density(record, year).map(|value| SeriesPoint { year, value }))
        .collect()
}

fn density(record: &CountryRecord, year: i32) -> Result<f64> {
    if record.area_km2 <= 0.0 || !record.area_km2.is_finite() {
        return Err(DashboardError::Arithmetic(format!(
            "'{}' has non-positive area {}",
            record.name, record.area_km2
        )));
    }
    let population = record
        .population(year)
        .ok_or_else(|| DashboardError::year_not_found(year))?;
    Ok(population as f64 / record.area_km2)
}
