//! Response envelope, pagination and request extractors shared by every handler.
//!
//! Every body leaving the API is `{success, message?, data?, errors?}`. Errors
//! are shaped by `AppError`; this module covers the success side.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{AppError, FieldErrors};

/// JSON body extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Optional JSON body. An empty or all-whitespace body yields `T::default()`;
/// anything else must parse, or the request is rejected with a 422.
#[derive(Debug)]
pub struct JsonOrDefault<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrDefault<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(FieldErrors::single("body", e.body_text())))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        let Json(value) = Json::<T>::from_bytes(&bytes)?;
        Ok(Self(value))
    }
}

/// Query-string extractor whose rejections use the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    status: StatusCode,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// A success envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Raw `?page=&per_page=` parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn resolve(&self, config: &Config) -> Page {
        Page::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(config.default_page_size),
            config.max_page_size,
        )
    }
}

/// A validated offset page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub fn new(page: i64, per_page: i64, max_per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, max_per_page.max(1)),
        }
    }

    /// Saturates instead of overflowing; a page past the end is just empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, page: Page, total: i64) -> Self {
        Self {
            data,
            current_page: page.page,
            last_page: last_page(total, page.per_page),
            per_page: page.per_page,
            total,
        }
    }
}

/// `max(1, ceil(total / per_page))`
pub fn last_page(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        return 1;
    }
    ((total + per_page - 1) / per_page).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::validation::WindowToggleRequest;

    #[test]
    fn test_last_page_rounds_up() {
        assert_eq!(last_page(31, 15), 3);
        assert_eq!(last_page(30, 15), 2);
        assert_eq!(last_page(1, 15), 1);
    }

    #[test]
    fn test_last_page_is_one_when_empty() {
        assert_eq!(last_page(0, 15), 1);
    }

    #[test]
    fn test_page_clamps_inputs() {
        let page = Page::new(0, 500, 100);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
        assert_eq!(Page::new(3, 0, 100).per_page, 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Page::new(3, 15, 100).offset(), 30);
        assert_eq!(Page::new(1, 15, 100).offset(), 0);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        assert_eq!(Page::new(i64::MAX, 15, 100).offset(), i64::MAX);
        let page = PageParams {
            page: Some(i64::MAX),
            per_page: Some(100),
        }
        .resolve(&Config::default());
        assert!(page.offset() >= 0);
    }

    #[test]
    fn test_page_params_default_to_config() {
        let page = PageParams::default().resolve(&Config::default());
        assert_eq!(page, Page { page: 1, per_page: 15 });
    }

    #[test]
    fn test_paginated_shape() {
        let p = Paginated::new(vec![1, 2], Page::new(2, 2, 100), 5);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["current_page"], 2);
        assert_eq!(v["last_page"], 3);
        assert_eq!(v["per_page"], 2);
        assert_eq!(v["total"], 5);
    }

    async fn toggle_body(body: &'static str) -> Result<WindowToggleRequest, AppError> {
        let req = axum::http::Request::post("/jobs/1/featured")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        JsonOrDefault::<WindowToggleRequest>::from_request(req, &())
            .await
            .map(|JsonOrDefault(r)| r)
    }

    #[tokio::test]
    async fn test_empty_body_uses_default() {
        let req = toggle_body("").await.unwrap();
        assert_eq!(req.value, None);
        assert!(toggle_body("  \n").await.is_ok());
    }

    #[tokio::test]
    async fn test_well_formed_body_is_parsed() {
        let req = toggle_body(r#"{"value":false}"#).await.unwrap();
        assert_eq!(req.value, Some(false));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        for body in [r#"{"value":"yes","until":"not-a-date"}"#, "{not json"] {
            let err = toggle_body(body).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref e) if e.contains("body")), "{body}");
            assert_eq!(
                err.into_response().status(),
                StatusCode::UNPROCESSABLE_ENTITY
            );
        }
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let v = serde_json::to_value(ApiResponse::message("Logged out")).unwrap();
        assert_eq!(v["success"], true);
        assert!(v.get("data").is_none());
        let v = serde_json::to_value(ApiResponse::ok(7).with_message("done")).unwrap();
        assert_eq!(v["data"], 7);
        assert_eq!(v["message"], "done");
    }
}
