//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use service_layer::ServiceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Message handling error.
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => service_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    match &err {
        ServiceError::InvalidSku(_)
        | ServiceError::InvalidQuantity(_)
        | ServiceError::Product(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::BatchNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ if err.is_concurrency_conflict() => (StatusCode::CONFLICT, err.to_string()),
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BatchReference, Sku, Version};
    use repository::RepositoryError;

    fn status_of(err: ServiceError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_service_error_statuses() {
        assert_eq!(
            status_of(ServiceError::InvalidSku(Sku::new("X"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::InvalidQuantity(0)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::BatchNotFound(BatchReference::new("b1"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                RepositoryError::ConcurrencyConflict {
                    sku: Sku::new("X"),
                    expected: Version::new(1),
                    actual: Version::new(2),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RepositoryError::ScopeClosed.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_plain_errors() {
        assert_eq!(
            ApiError::NotFound("gone".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("Out of stock".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
