use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use persistence::{StoreError, ValidationError};
use std::fmt;
use thiserror::Error;
use types::errors::RowError;
use types::row::Row;

/// Upstream service a lookup went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Catalog,
    Rates,
}

impl Service {
    /// Name used in client-facing messages
    pub fn api_name(&self) -> &'static str {
        match self {
            Service::Catalog => "Apple API",
            Service::Rates => "NBP API",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Catalog => write!(f, "catalog"),
            Service::Rates => write!(f, "rates"),
        }
    }
}

/// Pipeline stage a row failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuildTerm,
    QueryCatalog,
    QueryRate,
    StageRecord,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::BuildTerm => "build_term",
            Stage::QueryCatalog => "query_catalog",
            Stage::QueryRate => "query_rate",
            Stage::StageRecord => "stage_record",
            Stage::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Failure of a single catalog or rate lookup
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    #[error("{service} service returned status {status}")]
    Upstream { service: Service, status: u16 },

    #[error("unexpected catalog response: {0}")]
    CatalogParse(String),

    #[error("unexpected rate response: {0}")]
    RateParse(String),

    #[error("{service} service unreachable: {detail}")]
    Unavailable { service: Service, detail: String },
}

impl LookupError {
    pub fn service(&self) -> Service {
        match self {
            LookupError::Upstream { service, .. } | LookupError::Unavailable { service, .. } => {
                *service
            }
            LookupError::CatalogParse(_) => Service::Catalog,
            LookupError::RateParse(_) => Service::Rates,
        }
    }

    /// Status the whole request answers with when this lookup fails
    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            LookupError::CatalogParse(_) | LookupError::RateParse(_) => StatusCode::NOT_FOUND,
            LookupError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

fn describe_lookup(row: &Row, err: &LookupError) -> String {
    let api = err.service().api_name();
    match err {
        LookupError::Upstream { status, .. } => format!(
            "Error for row: \"{}\" in {}: upstream returned status {}.",
            row, api, status
        ),
        LookupError::Unavailable { .. } => {
            format!("Error for row: \"{}\" in {}: service unavailable.", row, api)
        }
        LookupError::CatalogParse(_) | LookupError::RateParse(_) => {
            format!("Error for row: \"{}\" in {}.", row, api)
        }
    }
}

/// Central error type for the gateway
///
/// Every variant aborts the whole batch and becomes the sole response body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error for row: \"{row}\". Please fill data.")]
    MalformedRow {
        row: Row,
        #[source]
        source: RowError,
    },

    #[error("{}", describe_lookup(.row, .source))]
    Lookup {
        row: Row,
        stage: Stage,
        #[source]
        source: LookupError,
    },

    #[error("Error for row: \"{row}\": {source}.")]
    Validation {
        row: Row,
        #[source]
        source: ValidationError,
    },

    #[error("Error for row: \"{row}\": storage failure.")]
    RowStore {
        row: Row,
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("Storage failure while committing batch: {0}")]
    Commit(#[source] StoreError),

    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedRow { .. } | AppError::Validation { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Lookup { source, .. } => source.status(),
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RowStore { .. }
            | AppError::Commit(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stage the batch stopped at, for row-level failures
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AppError::MalformedRow { .. } => Some(Stage::BuildTerm),
            AppError::Lookup { stage, .. } | AppError::RowStore { stage, .. } => Some(*stage),
            AppError::Commit(_) => Some(Stage::Commit),
            AppError::Validation { .. } => Some(Stage::StageRecord),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), stage = ?self.stage(), error = ?self, "{}", message);
        } else {
            tracing::warn!(status = status.as_u16(), stage = ?self.stage(), "{}", message);
        }

        (status, Json(message)).into_response()
    }
}
