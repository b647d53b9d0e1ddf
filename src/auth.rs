//! Request authorization context
//!
//! Only extracts the caller's credentials; nothing here decides whether a
//! request is allowed.

use axum::http::HeaderMap;

use crate::http::query::QueryParams;

/// Credentials and client details carried by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationInfo {
    pub token: String,
    pub client: Option<String>,
    pub device: Option<String>,
    pub device_id: Option<String>,
    pub version: Option<String>,
}

/// Resolves the authorization info of a request.
pub trait AuthContext: Send + Sync {
    fn get_authorization_info(&self, headers: &HeaderMap, query: &QueryParams) -> AuthorizationInfo;
}

/// Reads tokens from the usual Emby/Jellyfin headers and query parameters.
#[derive(Debug, Clone, Default)]
pub struct HeaderAuthContext;

const TOKEN_HEADERS: &[&str] = &["x-emby-token", "x-mediabrowser-token"];
const AUTHORIZATION_HEADERS: &[&str] = &["authorization", "x-emby-authorization"];
const TOKEN_PARAMS: &[&str] = &["api_key", "ApiKey"];

/// Parse `MediaBrowser Client="x", Token="y", ...`.
pub fn parse_authorization_header(value: &str) -> Option<AuthorizationInfo> {
    let caps = regex!(r"(?i)^\s*(?:MediaBrowser|Emby)\s+(.*)$").captures(value)?;
    let params = caps.get(1)?.as_str();

    let mut info = AuthorizationInfo::default();
    for field in regex!(r#"(\w+)\s*=\s*"([^"]*)""#).captures_iter(params) {
        let value = field[2].to_string();
        match field[1].to_ascii_lowercase().as_str() {
            "token" => info.token = value,
            "client" => info.client = Some(value),
            "device" => info.device = Some(value),
            "deviceid" => info.device_id = Some(value),
            "version" => info.version = Some(value),
            _ => {}
        }
    }
    Some(info)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl AuthContext for HeaderAuthContext {
    fn get_authorization_info(&self, headers: &HeaderMap, query: &QueryParams) -> AuthorizationInfo {
        let mut info = AUTHORIZATION_HEADERS
            .iter()
            .filter_map(|name| header_str(headers, name))
            .find_map(parse_authorization_header)
            .unwrap_or_default();

        if let Some(token) = TOKEN_HEADERS.iter().find_map(|name| header_str(headers, name)) {
            info.token = token.to_string();
        } else if info.token.is_empty() {
            if let Some(token) = TOKEN_PARAMS
                .iter()
                .find_map(|key| query.get(key).filter(|v| !v.is_empty()))
            {
                info.token = token.to_string();
            }
        }

        info
    }
}
