use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Uniform `{success, code, message, data}` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            code: 0,
            message: "success".into(),
            data: Some(data),
        }
    }

    pub fn failure(status: StatusCode, message: String) -> Self {
        Self {
            success: false,
            code: status.as_u16(),
            message,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// `Json` whose rejection is rendered in the envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `page`/`size` with the dashboard defaults: page 1, size 20, size capped at 100.
/// `page` is capped so the row offset always fits in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub size: i64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 20;
    pub const MAX_SIZE: i64 = 100;
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_SIZE;

    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1).min(Self::MAX_PAGE);
        let size = match size {
            Some(s) if s >= 1 => s.min(Self::MAX_SIZE),
            _ => Self::DEFAULT_SIZE,
        };
        Self { page, size }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.size - 1) / self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamping() {
        assert_eq!(Page::new(None, None), Page { page: 1, size: 20 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, size: 20 });
        assert_eq!(Page::new(Some(3), Some(500)), Page { page: 3, size: 100 });
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let p = Page::new(Some(i64::MAX), Some(100));
        assert_eq!(p.page, Page::MAX_PAGE);
        assert_eq!(p.offset(), (Page::MAX_PAGE - 1) * 100);
        assert!(Page::new(Some(i64::MAX), Some(i64::MAX)).offset() > 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Page::new(None, Some(20));
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(20), 1);
        assert_eq!(p.total_pages(21), 2);
    }

    #[test]
    fn failure_envelope_omits_data() {
        let body = ApiResponse::<()>::failure(StatusCode::NOT_FOUND, "note not found".into());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 404);
        assert!(json.get("data").is_none());
    }
}
