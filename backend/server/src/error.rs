use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::database::DatabaseError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Item not found")]
    ItemNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Transaction failed")]
    TransactionFailed(#[source] DatabaseError),

    #[error("Update failed")]
    UpdateFailed(#[source] DatabaseError),

    #[error("Database error")]
    Database(#[from] DatabaseError),

    #[error("Live channel is full")]
    ChannelFull,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ItemNotFound | AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::TransactionFailed(_) | AppError::UpdateFailed(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ChannelFull => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::TransactionFailed(source)
        | AppError::UpdateFailed(source)
        | AppError::Database(source) = &self
        {
            error!(error = %source, "{}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
