//! Response envelope: `{ result, paging?, response }`.
//!
//! Both successes and failures use the same envelope shape. The envelope's
//! `response.code` is `"200"` for success and `"500"` for every failure; the
//! transport status is not differentiated by error kind.

use crate::error::ApiError;
use crate::reshape::PagingInfo;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug)]
pub struct ResponseInfo {
    pub method: String,
    pub url: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failing statement text, included for backend errors as a diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct Envelope {
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<PagingInfo>,
    pub response: ResponseInfo,
}

impl Envelope {
    pub fn success(method: &str, url: &str, result: Value, paging: Option<PagingInfo>) -> Self {
        Envelope {
            result,
            paging,
            response: ResponseInfo {
                method: method.to_uppercase(),
                url: url.to_string(),
                code: "200".into(),
                message: None,
                query: None,
            },
        }
    }

    pub fn failure(method: &str, url: &str, error: &ApiError) -> Self {
        Envelope {
            result: Value::Object(serde_json::Map::new()),
            paging: None,
            response: ResponseInfo {
                method: method.to_uppercase(),
                url: url.to_string(),
                code: "500".into(),
                message: Some(error.to_string()),
                query: error.statement().map(str::to_string),
            },
        }
    }
}
