use crate::charts::{self, DashboardOutputs, DashboardState};
use crate::config::AppConfig;
use crate::error::DashboardError;
use crate::types::Dataset;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct AppState {
    pub dataset: Dataset,
    pub config: AppConfig,
}

impl AppState {
    pub fn default_country(&self) -> &str {
        let configured = self
            .config
            .dashboard
            .default_country
            .as_deref()
            .filter(|name| self.dataset.record(name).is_ok());
        match configured {
            Some(name) => name,
            None => self
                .dataset
                .records()
                .first()
                .map(|r| r.name.as_str())
                .unwrap_or_default(),
        }
    }

    pub fn default_year(&self) -> i32 {
        self.dataset.years().latest()
    }
}

#[derive(Serialize)]
pub struct CountryOption {
    name: String,
    code: String,
}

#[derive(Serialize)]
pub struct MetaResponse {
    countries: Vec<CountryOption>,
    years: Vec<i32>,
    default_country: String,
    default_year: i32,
}

#[derive(Deserialize)]
pub struct DashboardParams {
    country: Option<String>,
    // Kept as text so a malformed year becomes a panel error instead of a 400
    year: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/api/meta", get(meta_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .fallback_service(static_service)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(
    config: AppConfig,
    dataset: Dataset,
) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState {
        dataset,
        config,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn meta_handler(State(state): State<Arc<AppState>>) -> Json<MetaResponse> {
    Json(MetaResponse {
        countries: state
            .dataset
            .records()
            .iter()
            .map(|r| CountryOption {
                name: r.name.clone(),
                code: r.code.clone(),
            })
            .collect(),
        years: state.dataset.years().as_slice().to_vec(),
        default_country: state.default_country().to_string(),
        default_year: state.default_year(),
    })
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Json<DashboardOutputs> {
    let country = params
        .country
        .unwrap_or_else(|| state.default_country().to_string());
    let template = &state.config.dashboard.template;

    let year = match params.year {
        None => state.default_year(),
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(year) => year,
            Err(_) => {
                let err = DashboardError::year_not_found(&raw);
                return Json(charts::render_selection(&state.dataset, &country, Err(err), template));
            }
        },
    };

    Json(charts::render(
        &state.dataset,
        &DashboardState { country, year },
        template,
    ))
}
