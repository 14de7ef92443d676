//! Response wrappers shared by every endpoint

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Application-level success code
pub const SUCCESS_CODE: i64 = 200;

/// Application-level code that ends the session
pub const UNAUTHORIZED_CODE: i64 = 401;

/// Uniform wrapper around every backend response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Present on some endpoints only (login, admin actions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    pub code: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Whether the application code signals success
    pub fn is_ok(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// `message`, else `msg`
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().or(self.msg.as_deref())
    }

    /// `msg`, else `message`
    pub fn msg_text(&self) -> Option<&str> {
        self.msg.as_deref().or(self.message.as_deref())
    }

    /// Take the payload, failing when the backend sent none
    pub fn into_data(self) -> Result<T> {
        self.data.ok_or(Error::MissingData)
    }
}

/// Pagination wrapper around list payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Page selection sent as query parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl PageParams {
    /// Page selection
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}
