/// JSON request bodies
///
/// [`JsonBody`] wraps `axum::Json` so that a body which fails to parse is
/// answered with the same JSON error shape as every other failure:
///
/// - a field of the wrong type or a missing field: 422 with a `body` detail
/// - malformed JSON or a missing `Content-Type`: 400

use axum::extract::FromRequest;

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::IntoResponse,
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct StatusBody {
        #[allow(dead_code)]
        status: String,
    }

    async fn extract(content_type: Option<&str>, body: &str) -> Result<StatusBody, ApiError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        JsonBody::<StatusBody>::from_request(request, &())
            .await
            .map(|JsonBody(body)| body)
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_validation_error() {
        let err = extract(Some("application/json"), r#"{ "status": 5 }"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = extract(Some("application/json"), "{ not json").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let err = extract(None, r#"{ "status": "pending" }"#).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        assert!(extract(Some("application/json"), r#"{ "status": "pending" }"#)
            .await
            .is_ok());
    }
}
