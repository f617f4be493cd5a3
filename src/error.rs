use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{gateway::GatewayError, response::ErrorResponse};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    NotFoundWith(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Montant du paiement incorrect")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("Paiement non réussi ({0})")]
    PaymentNotSuccessful(String),

    #[error("Service de paiement indisponible")]
    UpstreamUnavailable(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::NotFoundWith(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::AmountMismatch { .. }
            | AppError::PaymentNotSuccessful(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for the payment verification failures, which also report `verified: false`.
    fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            AppError::AmountMismatch { .. }
                | AppError::PaymentNotSuccessful(_)
                | AppError::UpstreamUnavailable(_)
                | AppError::NotFoundWith(_)
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(reference) => {
                AppError::NotFoundWith(format!("Transaction introuvable: {reference}"))
            }
            GatewayError::Unavailable(reason) => AppError::UpstreamUnavailable(reason),
            GatewayError::InvalidResponse(reason) => AppError::UpstreamUnavailable(reason),
            GatewayError::Misconfigured(reason) => AppError::Internal(anyhow::anyhow!(reason)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            AppError::UpstreamUnavailable(reason) => {
                tracing::warn!(reason = %reason, "payment gateway unavailable")
            }
            _ => {}
        }

        let body = ErrorResponse {
            success: false,
            verified: self.is_verification_failure().then_some(false),
            error: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
