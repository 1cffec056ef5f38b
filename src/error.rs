use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    #[error("load error: {0}")]
    Load(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

impl DashboardError {
    pub fn country_not_found(name: &str) -> Self {
        DashboardError::NotFound {
            kind: "country",
            key: name.to_string(),
        }
    }

    pub fn year_not_found(year: impl ToString) -> Self {
        DashboardError::NotFound {
            kind: "year",
            key: year.to_string(),
        }
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Load(e.to_string())
    }
}
