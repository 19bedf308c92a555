use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum ValidationRejection {
    #[error("Validation error: {0}")]
    InvalidInput(String),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let ValidationRejection::InvalidInput(msg) = self;

        let body = serde_json::json!({
            "error": msg,
            "error_code": "VALIDATION_ERROR",
        });

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Deserialize and validate a JSON body before it reaches the handler,
/// then replay the original bytes downstream.
pub async fn validate_json<T: DeserializeOwned + Validate>(
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, ValidationRejection> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| ValidationRejection::InvalidInput("Invalid request body".to_string()))?;

    let value: T = serde_json::from_slice(&bytes)
        .map_err(|e| ValidationRejection::InvalidInput(format!("Invalid JSON: {}", e)))?;

    value.validate().map_err(|e| {
        let errors = e
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| e.message.as_ref().map(|s| s.to_string()).unwrap_or_default())
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<String>>()
            .join("; ");

        ValidationRejection::InvalidInput(format!("Validation failed: {}", errors))
    })?;

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}
