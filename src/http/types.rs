use std::fmt::Display;

use reqwest::header::HeaderMap;
use url::Url;

/// Statuses that count as a successful call. Everything else is an error.
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 202, 204];

/// Media type sent with every attachment, whatever the file really contains.
pub const ATTACHMENT_MIME: &str = "image/jpg";

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl ApiMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            ApiMethod::Get => reqwest::Method::GET,
            ApiMethod::Post => reqwest::Method::POST,
            ApiMethod::Put => reqwest::Method::PUT,
            ApiMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

impl Display for ApiMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMethod::Get => write!(f, "GET"),
            ApiMethod::Post => write!(f, "POST"),
            ApiMethod::Put => write!(f, "PUT"),
            ApiMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// A file loaded into memory, ready to go out as one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireBody {
    Empty,
    /// Form fields, serialized as `application/x-www-form-urlencoded` text.
    Form(Vec<(String, String)>),
    /// Form fields plus files; the transport picks the boundary.
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
    /// Sent byte for byte.
    Raw(String),
}

/// A fully assembled request. Built once per call and re-sent as-is on retry.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: ApiMethod,
    pub url: Url,
    pub headers: HeaderMap,
    /// Basic-auth username. The password is always empty.
    pub basic_auth: Option<String>,
    pub body: WireBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}
