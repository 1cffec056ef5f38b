use crate::config::{AppConfig, ColumnConfig};
use crate::error::{DashboardError, Result};
use crate::types::{CountryRecord, Dataset, YearSet};
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use tracing::info;

pub fn load_data(config: &AppConfig) -> Result<Dataset> {
    let path = &config.input.data_csv;
    info!("Loading population table from {:?}", path);

    let file = File::open(path)
        .map_err(|e| DashboardError::Load(format!("failed to open CSV file {:?}: {}", path, e)))?;
    let dataset = load_from_reader(file, &config.columns)?;

    info!(
        "Loaded {} countries across {} census years",
        dataset.records().len(),
        dataset.years().len()
    );
    Ok(dataset)
}

pub fn load_from_reader<R: Read>(reader: R, columns: &ColumnConfig) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let year_columns = extract_year_columns(&headers);
    let years = YearSet::new(year_columns.iter().map(|(year, _)| *year).collect())?;

    let country_idx = required_column(&headers, &columns.country)?;
    let code_idx = required_column(&headers, &columns.code)?;
    let area_idx = required_column(&headers, &columns.area)?;
    let capital_idx = optional_column(&headers, columns.capital.as_deref());
    let continent_idx = optional_column(&headers, columns.continent.as_deref());

    let mut records = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let name = field(&record, country_idx, line)?.to_string();
        if name.is_empty() {
            return Err(DashboardError::Load(format!("line {}: empty country name", line)));
        }

        let mut populations = BTreeMap::new();
        for (year, idx) in &year_columns {
            let raw = field(&record, *idx, line)?;
            let value = parse_population(raw).ok_or_else(|| {
                DashboardError::Load(format!(
                    "line {}: invalid {} population '{}' for '{}'",
                    line, year, raw, name
                ))
            })?;
            populations.insert(*year, value);
        }

        let raw_area = field(&record, area_idx, line)?;
        let area_km2: f64 = raw_area.replace(',', "").parse().map_err(|_| {
            DashboardError::Load(format!("line {}: invalid area '{}' for '{}'", line, raw_area, name))
        })?;

        records.push(CountryRecord {
            code: field(&record, code_idx, line)?.to_string(),
            capital: capital_idx.and_then(|i| record.get(i)).map(str::to_string),
            continent: continent_idx.and_then(|i| record.get(i)).map(str::to_string),
            name,
            populations,
            area_km2,
        });
    }

    Dataset::new(records, years)
}

pub fn extract_year_columns(headers: &StringRecord) -> Vec<(i32, usize)> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| parse_year_label(h).map(|year| (year, i)))
        .collect()
}

fn parse_year_label(label: &str) -> Option<i32> {
    let (year, rest) = label.trim().split_once(' ')?;
    if rest != "Population" {
        return None;
    }
    year.parse().ok()
}

fn parse_population(raw: &str) -> Option<u64> {
    let cleaned = raw.replace(',', "");
    if let Ok(v) = cleaned.parse::<u64>() {
        return Some(v);
    }
    // Some exports write integral counts as "1234.0"
    let f: f64 = cleaned.parse().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
}

fn required_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| DashboardError::Load(format!("column '{}' not found in CSV", name)))
}

fn optional_column(headers: &StringRecord, name: Option<&str>) -> Option<usize> {
    let name = name?;
    headers.iter().position(|h| h == name)
}

fn field<'a>(record: &'a StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    record
        .get(idx)
        .ok_or_else(|| DashboardError::Load(format!("line {}: missing field {}", line, idx + 1)))
}
