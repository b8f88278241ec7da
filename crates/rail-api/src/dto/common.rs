//! Envelope and paging shared by every endpoint

use rail_core::traits::Pagination;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Successful response body: `{"data": ..., "message": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// `?page=&per_page=` on list endpoints
///
/// Query strings carry every value as text, so both fields accept `"3"` as
/// well as `3`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[serde(default = "first_page", deserialize_with = "lenient_i64")]
    #[validate(range(min = 1))]
    pub page: i64,

    #[serde(default = "default_per_page", deserialize_with = "lenient_i64")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(i64),
    Text(String),
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Lenient::deserialize(deserializer)? {
        Lenient::Number(n) => Ok(n),
        Lenient::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {:?}", s))),
    }
}

fn first_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl From<&PaginationParams> for Pagination {
    fn from(params: &PaginationParams) -> Self {
        Pagination::new(params.page, params.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_numbers_accept_text() {
        let params: PaginationParams =
            serde_json::from_value(json!({"page": "3", "per_page": 20})).unwrap();
        let pagination = Pagination::from(&params);
        assert_eq!(pagination.offset(), 40);
        assert_eq!(pagination.limit(), 20);

        let defaults: PaginationParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(defaults.page, 1);
        assert_eq!(defaults.per_page, DEFAULT_PER_PAGE);

        assert!(serde_json::from_value::<PaginationParams>(json!({"page": "two"})).is_err());
    }

    #[test]
    fn test_page_bounds_are_validated() {
        let params = PaginationParams {
            page: 0,
            per_page: MAX_PER_PAGE + 1,
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("page"));
        assert!(errors.field_errors().contains_key("per_page"));
    }

    #[test]
    fn test_message_is_omitted_when_absent() {
        let body = serde_json::to_value(ApiResponse::success(7)).unwrap();
        assert_eq!(body, json!({"data": 7}));

        let body = serde_json::to_value(ApiResponse::with_message(7, "done")).unwrap();
        assert_eq!(body["message"], "done");
    }
}
