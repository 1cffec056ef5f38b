use crate::error::{DashboardError, Result};
use crate::metrics::{self, DensityMatrix};
use crate::types::{Dataset, SeriesPoint};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

const POPULATION_LINE: &str = "#FFA500";
const GROWTH_BAR: &str = "#00FF00";
const FRAME_DURATION_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub country: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Panel {
    Figure { figure: Value },
    Stats { lines: Vec<String> },
    Error { message: String },
}

impl Panel {
    fn from_result(name: &str, result: Result<Panel>) -> Panel {
        result.unwrap_or_else(|e| {
            warn!("{} panel failed: {}", name, e);
            Panel::Error { message: e.to_string() }
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Panel::Error { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOutputs {
    pub population: Panel,
    pub growth: Panel,
    pub map: Panel,
    pub density: Panel,
    pub stats: Panel,
}

pub fn render(dataset: &Dataset, state: &DashboardState, template: &str) -> DashboardOutputs {
    let year = if dataset.years().contains(state.year) {
        Ok(state.year)
    } else {
        Err(DashboardError::year_not_found(state.year))
    };
    render_selection(dataset, &state.country, year, template)
}

// A failed year (unknown or unparseable) only blanks the panels that need it.
pub fn render_selection(
    dataset: &Dataset,
    country: &str,
    year: Result<i32>,
    template: &str,
) -> DashboardOutputs {
    let series = metrics::historical_series(dataset, country);

    let population = series
        .as_ref()
        .map(|s| population_figure(country, s, template))
        .map_err(DashboardError::clone);

    let growth = series
        .as_ref()
        .map_err(DashboardError::clone)
        .and_then(|s| metrics::growth_rates(s))
        .map(|rates| growth_figure(country, &rates, template));

    let map = year
        .as_ref()
        .map_err(DashboardError::clone)
        .and_then(|&year| world_map_figure(dataset, year, template));

    let density = year
        .as_ref()
        .map_err(DashboardError::clone)
        .and_then(|&year| {
            let matrix = metrics::density_matrix(dataset)?;
            Ok(density_figure(country, year, dataset.years().as_slice(), &matrix, template))
        });

    let stats = year.and_then(|year| {
        stats_lines(
            dataset,
            &DashboardState {
                country: country.to_string(),
                year,
            },
        )
    });

    DashboardOutputs {
        population: Panel::from_result("population", population),
        growth: Panel::from_result("growth", growth),
        map: Panel::from_result("map", map),
        density: Panel::from_result("density", density),
        stats: Panel::from_result("stats", stats.map(|lines| Panel::Stats { lines })),
    }
}

fn years_and_values<T: Copy>(points: &[SeriesPoint<T>]) -> (Vec<i32>, Vec<T>) {
    points.iter().map(|p| (p.year, p.value)).unzip()
}

pub fn population_figure(country: &str, series: &[SeriesPoint<u64>], template: &str) -> Panel {
    let (x, y) = years_and_values(series);
    Panel::Figure {
        figure: json!({
            "data": [{
                "type": "scatter",
                "x": x,
                "y": y,
                "mode": "lines+markers",
                "name": "Population",
                "line": { "color": POPULATION_LINE },
            }],
            "layout": {
                "title": { "text": format!("Population Trend for {}", country) },
                "xaxis": { "title": { "text": "Year" } },
                "yaxis": { "title": { "text": "Population" } },
                "template": template,
            },
        }),
    }
}

pub fn growth_figure(country: &str, rates: &[SeriesPoint<f64>], template: &str) -> Panel {
    let (x, y) = years_and_values(rates);
    Panel::Figure {
        figure: json!({
            "data": [{
                "type": "bar",
                "x": x,
                "y": y,
                "name": "Growth Rate (%)",
                "marker": { "color": GROWTH_BAR },
            }],
            "layout": {
                "title": { "text": format!("Growth Rate Trend for {}", country) },
                "xaxis": { "title": { "text": "Year" } },
                "yaxis": { "title": { "text": "Growth Rate (%)" } },
                "template": template,
            },
        }),
    }
}

pub fn world_map_figure(dataset: &Dataset, year: i32, template: &str) -> Result<Panel> {
    let column = dataset.column(year)?;
    let codes: Vec<&str> = dataset.records().iter().map(|r| r.code.as_str()).collect();
    let (names, populations): (Vec<&str>, Vec<u64>) = column.into_iter().unzip();

    Ok(Panel::Figure {
        figure: json!({
            "data": [{
                "type": "choropleth",
                "locations": codes,
                "locationmode": "ISO-3",
                "z": populations,
                "text": names,
                "hovertemplate": "<b>%{text}</b><br>%{z:,}<extra></extra>",
                "colorscale": "Plasma",
                "colorbar": { "title": { "text": format!("{} Population", year) } },
                "marker": { "line": { "color": "white" } },
            }],
            "layout": {
                "title": { "text": format!("World Population Distribution in {}", year) },
                "margin": { "r": 0, "t": 30, "l": 0, "b": 0 },
                "template": template,
            },
        }),
    })
}

fn density_trace(matrix: &DensityMatrix, year: i32) -> Value {
    let x: Vec<&str> = matrix.rows.iter().map(|r| r.country.as_str()).collect();
    json!({
        "type": "scatter",
        "x": x,
        "y": matrix.year_column(year),
        "mode": "lines+markers",
        "name": year.to_string(),
    })
}

pub fn density_figure(
    country: &str,
    year: i32,
    years: &[i32],
    matrix: &DensityMatrix,
    template: &str,
) -> Panel {
    let data: Vec<Value> = years
        .iter()
        .map(|&y| {
            let mut trace = density_trace(matrix, y);
            trace["visible"] = if y == year { json!(true) } else { json!("legendonly") };
            trace
        })
        .collect();

    let frames: Vec<Value> = years
        .iter()
        .map(|&y| {
            json!({
                "name": y.to_string(),
                "data": [density_trace(matrix, y)],
            })
        })
        .collect();

    Panel::Figure {
        figure: json!({
            "data": data,
            "layout": {
                "title": { "text": format!("Population Density for {}", country) },
                "xaxis": { "title": { "text": "Country/Territory" } },
                "yaxis": { "title": { "text": "Density (per km²)" } },
                "updatemenus": [{
                    "type": "buttons",
                    "showactive": false,
                    "buttons": [{
                        "label": "Play",
                        "method": "animate",
                        "args": [null, {
                            "frame": { "duration": FRAME_DURATION_MS, "redraw": true },
                            "fromcurrent": true,
                            "mode": "immediate",
                        }],
                    }],
                }],
                "template": template,
            },
            "frames": frames,
        }),
    }
}

pub fn stats_lines(dataset: &Dataset, state: &DashboardState) -> Result<Vec<String>> {
    let record = dataset.record(&state.country)?;
    let population = record
        .population(state.year)
        .ok_or_else(|| DashboardError::year_not_found(state.year))?;
    Ok(vec![
        format!("Population in {}: {}", state.year, group_thousands(population)),
        format!("Country: {}", record.name),
    ])
}

// Plain-text table of population, growth and density, followed by the stats lines.
pub fn report_lines(dataset: &Dataset, state: &DashboardState) -> Result<Vec<String>> {
    let series = metrics::historical_series(dataset, &state.country)?;
    let rates = metrics::growth_rates(&series)?;
    let densities = metrics::density_series(dataset, &state.country)?;

    let mut lines = vec![format!(
        "{:>6}  {:>15}  {:>9}  {:>12}",
        "Year", "Population", "Growth %", "Density/km²"
    )];
    for ((point, rate), density) in series.iter().zip(&rates).zip(&densities) {
        lines.push(format!(
            "{:>6}  {:>15}  {:>9.2}  {:>12.2}",
            point.year,
            group_thousands(point.value),
            rate.value,
            density.value
        ));
    }
    lines.extend(stats_lines(dataset, state)?);
    Ok(lines)
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{record, sample};
    use crate::types::YearSet;

    fn state(country: &str, year: i32) -> DashboardState {
        DashboardState { country: country.to_string(), year }
    }

    fn figure(panel: &Panel) -> &Value {
        match panel {
            Panel::Figure { figure } => figure,
            other => panic!("expected figure, got {:?}", other),
        }
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_417_173_173), "1,417,173,173");
    }

    #[test]
    fn full_render_for_known_selection() {
        let ds = sample();
        let out = render(&ds, &state("X", 2010), "plotly_dark");

        let pop = figure(&out.population);
        assert_eq!(pop["data"][0]["y"], json!([100, 150, 300]));
        assert_eq!(pop["layout"]["title"]["text"], "Population Trend for X");

        let growth = figure(&out.growth);
        assert_eq!(growth["data"][0]["y"], json!([0.0, 50.0, 100.0]));

        let map = figure(&out.map);
        assert_eq!(map["data"][0]["locations"], json!(["XXX", "YYY", "ZZZ"]));
        assert_eq!(map["data"][0]["z"], json!([150, 400, 70]));
        assert_eq!(map["layout"]["title"]["text"], "World Population Distribution in 2010");

        assert_eq!(
            out.stats,
            Panel::Stats {
                lines: vec!["Population in 2010: 150".to_string(), "Country: X".to_string()]
            }
        );
    }

    #[test]
    fn density_figure_shows_only_selected_year_and_has_frames() {
        let ds = sample();
        let out = render(&ds, &state("Y", 2020), "plotly_dark");
        let density = figure(&out.density);

        let traces = density["data"].as_array().unwrap();
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[0]["visible"], "legendonly");
        assert_eq!(traces[2]["visible"], true);
        assert_eq!(traces[2]["y"], json!([75.0, 50.0, 28.0]));
        assert_eq!(density["frames"].as_array().unwrap().len(), 3);
        assert_eq!(density["frames"][1]["name"], "2010");
        assert_eq!(density["layout"]["updatemenus"][0]["buttons"][0]["label"], "Play");
    }

    #[test]
    fn unknown_country_only_breaks_country_panels() {
        let out = render(&sample(), &state("Atlantis", 2020), "plotly_dark");
        assert!(out.population.is_error());
        assert!(out.growth.is_error());
        assert!(out.stats.is_error());
        assert!(!out.map.is_error());
        assert!(!out.density.is_error());
    }

    #[test]
    fn unknown_year_only_breaks_year_panels() {
        let out = render(&sample(), &state("X", 1999), "plotly_dark");
        assert!(!out.population.is_error());
        assert!(!out.growth.is_error());
        assert!(out.map.is_error());
        assert!(out.density.is_error());
        assert!(out.stats.is_error());
    }

    #[test]
    fn arithmetic_failures_surface_as_messages() {
        let years = YearSet::new(vec![2000, 2010]).unwrap();
        let ds = Dataset::new(
            vec![
                record("Empty", "EMP", 1.0, &[(2000, 0), (2010, 5)]),
                record("Void", "VOD", 0.0, &[(2000, 1), (2010, 1)]),
            ],
            years,
        )
        .unwrap();

        let out = render(&ds, &state("Empty", 2010), "plotly_dark");
        assert!(!out.population.is_error());
        assert!(matches!(&out.growth, Panel::Error { message } if message.contains("zero")));
        assert!(matches!(&out.density, Panel::Error { message } if message.contains("Void")));
        assert!(!out.map.is_error());
    }

    #[test]
    fn report_has_one_row_per_year_then_stats() {
        let lines = report_lines(&sample(), &state("Y", 2020)).unwrap();
        assert_eq!(lines.len(), 1 + 3 + 2);
        assert!(lines[0].contains("Growth %"));
        assert_eq!(
            lines[2],
            format!("{:>6}  {:>15}  {:>9.2}  {:>12.2}", 2010, "400", 100.0, 40.0)
        );
        assert_eq!(lines[4], "Population in 2020: 500");
        assert_eq!(lines[5], "Country: Y");
    }

    #[test]
    fn report_survives_other_countries_with_bad_area() {
        let years = YearSet::new(vec![2000, 2010]).unwrap();
        let ds = Dataset::new(
            vec![
                record("Land", "LND", 2.0, &[(2000, 1000), (2010, 1500)]),
                record("Void", "VOD", 0.0, &[(2000, 1), (2010, 1)]),
            ],
            years,
        )
        .unwrap();

        let lines = report_lines(&ds, &state("Land", 2010)).unwrap();
        assert!(lines[2].contains("1,500"));
        assert!(lines[2].ends_with("750.00"));
        assert!(report_lines(&ds, &state("Void", 2010)).is_err());
    }

    #[test]
    fn report_for_unknown_country_fails() {
        assert!(matches!(
            report_lines(&sample(), &state("Atlantis", 2020)),
            Err(DashboardError::NotFound { kind: "country", .. })
        ));
    }

    #[test]
    fn malformed_year_blanks_year_panels() {
        let out = render_selection(
            &sample(),
            "X",
            Err(DashboardError::year_not_found("abc")),
            "plotly_dark",
        );
        assert!(!out.population.is_error());
        assert!(!out.growth.is_error());
        assert!(matches!(&out.map, Panel::Error { message } if message == "year not found: abc"));
        assert!(out.density.is_error());
        assert!(out.stats.is_error());
    }

    #[test]
    fn panels_serialize_with_status_tag() {
        let err = Panel::Error { message: "boom".to_string() };
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({"status": "error", "message": "boom"}));
    }
}
