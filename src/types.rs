use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize)]
pub struct CountryRecord {
    pub name: String,
    pub code: String,
    pub capital: Option<String>,
    pub continent: Option<String>,
    // Census year -> population
    pub populations: BTreeMap<i32, u64>,
    pub area_km2: f64,
}

impl CountryRecord {
    pub fn population(&self, year: i32) -> Option<u64> {
        self.populations.get(&year).copied()
    }
}

/// Census years found in the table headers. Ascending, no duplicates, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct YearSet(Vec<i32>);

impl YearSet {
    pub fn new(mut years: Vec<i32>) -> Result<Self> {
        years.sort_unstable();
        years.dedup();
        if years.is_empty() {
            return Err(DashboardError::Configuration(
                "no '<year> Population' columns found".to_string(),
            ));
        }
        Ok(YearSet(years))
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn contains(&self, year: i32) -> bool {
        self.0.binary_search(&year).is_ok()
    }

    pub fn latest(&self) -> i32 {
        // Non-empty by construction
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<CountryRecord>,
    index: HashMap<String, usize>,
    years: YearSet,
}

impl Dataset {
    pub fn new(records: Vec<CountryRecord>, years: YearSet) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.name.clone(), i).is_some() {
                return Err(DashboardError::Load(format!(
                    "duplicate country name '{}'",
                    record.name
                )));
            }
            if let Some(year) = years.iter().find(|y| !record.populations.contains_key(y)) {
                return Err(DashboardError::Load(format!(
                    "'{}' has no population for {}",
                    record.name, year
                )));
            }
        }
        Ok(Dataset { records, index, years })
    }

    pub fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    pub fn years(&self) -> &YearSet {
        &self.years
    }

    pub fn record(&self, name: &str) -> Result<&CountryRecord> {
        self.index
            .get(name)
            .map(|&i| &self.records[i])
            .ok_or_else(|| DashboardError::country_not_found(name))
    }

    pub fn column(&self, year: i32) -> Result<Vec<(&str, u64)>> {
        if !self.years.contains(year) {
            return Err(DashboardError::year_not_found(year));
        }
        Ok(self
            .records
            .iter()
            .filter_map(|r| r.population(year).map(|p| (r.name.as_str(), p)))
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint<T> {
    pub year: i32,
    pub value: T,
}
